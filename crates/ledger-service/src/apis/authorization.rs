//! Relayer endpoints for signed approval requests.

use alloy_primitives::B256;
use ledger_core::{AuthorizationEngine, AuthorizationError};
use ledger_types::{
	APIError, AuthorizationStateResponse, SubmitAuthorizationRequest, SubmitAuthorizationResponse,
};
use std::str::FromStr;

/// Protocol rejections are 422 with the rejection code; backend faults are 500.
fn to_api_error(err: AuthorizationError) -> APIError {
	if err.is_rejection() {
		APIError::UnprocessableEntity {
			error_type: err.code().to_string(),
			message: err.to_string(),
			details: None,
		}
	} else {
		APIError::InternalServerError {
			error_type: err.code().to_string(),
			message: "Storage backend failure; no state was changed".to_string(),
		}
	}
}

/// Applies a relayed authorization.
pub async fn submit_authorization(
	engine: &AuthorizationEngine,
	body: SubmitAuthorizationRequest,
) -> Result<SubmitAuthorizationResponse, APIError> {
	let request = body.request;
	engine
		.approve_with_authorization(&request, &body.signature)
		.await
		.map_err(to_api_error)?;

	Ok(SubmitAuthorizationResponse {
		status: "approved".to_string(),
		allowance: request.value,
	})
}

pub async fn get_authorization_state(
	engine: &AuthorizationEngine,
	nonce: &str,
) -> Result<AuthorizationStateResponse, APIError> {
	let nonce = B256::from_str(nonce).map_err(|e| APIError::BadRequest {
		error_type: "INVALID_NONCE".to_string(),
		message: format!("nonce must be 32 bytes of hex: {}", e),
		details: None,
	})?;

	let used = engine
		.authorization_state(&nonce)
		.await
		.map_err(|e| APIError::InternalServerError {
			error_type: "STORAGE_ERROR".to_string(),
			message: e.to_string(),
		})?;

	Ok(AuthorizationStateResponse { nonce, used })
}
