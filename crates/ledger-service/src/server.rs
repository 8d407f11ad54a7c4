//! HTTP server for relayers.
//!
//! Routes live under `/api`:
//! - `POST /api/authorizations`
//! - `GET  /api/authorizations/{nonce}`
//! - `GET  /api/allowances/{owner}/{spender}`
//! - `GET  /api/domain`

use axum::{
	extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
	response::Json,
	routing::{get, post},
	Router,
};
use ledger_config::ApiConfig;
use ledger_core::AuthorizationEngine;
use ledger_types::{
	APIError, AllowanceResponse, AuthorizationStateResponse, DomainResponse,
	SubmitAuthorizationRequest, SubmitAuthorizationResponse,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<AuthorizationEngine>,
}

pub fn router(engine: Arc<AuthorizationEngine>, max_request_size: usize) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/authorizations", post(handle_submit_authorization))
				.route("/authorizations/{nonce}", get(handle_authorization_state))
				.route("/allowances/{owner}/{spender}", get(handle_allowance))
				.route("/domain", get(handle_domain)),
		)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive())
				.layer(DefaultBodyLimit::max(max_request_size)),
		)
		.with_state(AppState { engine })
}

/// Binds and serves until the listener fails.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<AuthorizationEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(engine, api_config.max_request_size);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Ledger API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Handles POST /api/authorizations requests.
///
/// Malformed bodies are reported as 400 rather than axum's default 422, which
/// is reserved for protocol rejections.
async fn handle_submit_authorization(
	State(state): State<AppState>,
	body: Result<Json<SubmitAuthorizationRequest>, JsonRejection>,
) -> Result<Json<SubmitAuthorizationResponse>, APIError> {
	let Json(body) = body.map_err(|e| APIError::BadRequest {
		error_type: "INVALID_REQUEST".to_string(),
		message: e.body_text(),
		details: None,
	})?;

	crate::apis::authorization::submit_authorization(&state.engine, body)
		.await
		.map(Json)
}

async fn handle_authorization_state(
	Path(nonce): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<AuthorizationStateResponse>, APIError> {
	crate::apis::authorization::get_authorization_state(&state.engine, &nonce)
		.await
		.map(Json)
}

async fn handle_allowance(
	Path((owner, spender)): Path<(String, String)>,
	State(state): State<AppState>,
) -> Result<Json<AllowanceResponse>, APIError> {
	crate::apis::allowance::get_allowance(&state.engine, &owner, &spender)
		.await
		.map(Json)
}

async fn handle_domain(State(state): State<AppState>) -> Json<DomainResponse> {
	Json(crate::apis::allowance::get_domain(&state.engine))
}
