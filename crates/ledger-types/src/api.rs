//! API types for the ledger HTTP API.
//!
//! Request and response bodies exchanged with relayers submitting signed
//! authorizations, plus the structured error type returned on rejection.

use crate::{ApprovalRequest, DomainDescriptor};
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /api/authorizations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAuthorizationRequest {
	/// The signed approval request.
	pub request: ApprovalRequest,
	/// 65-byte `r || s || v` or 64-byte compact signature, hex encoded.
	pub signature: Bytes,
}

/// Response for an accepted authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAuthorizationResponse {
	/// Always "approved".
	pub status: String,
	/// Allowance now stored for `(owner, spender)`.
	#[serde(with = "u256_serde")]
	pub allowance: U256,
}

/// Response for `GET /api/allowances/{owner}/{spender}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowanceResponse {
	pub owner: Address,
	pub spender: Address,
	#[serde(with = "u256_serde")]
	pub value: U256,
}

/// Response for `GET /api/authorizations/{nonce}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationStateResponse {
	pub nonce: B256,
	/// Whether the nonce has already been consumed.
	pub used: bool,
}

/// Response for `GET /api/domain`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainResponse {
	pub domain: DomainDescriptor,
	#[serde(rename = "domainSeparator")]
	pub domain_separator: B256,
	#[serde(rename = "approveWithAuthorizationTypehash")]
	pub approve_with_authorization_typehash: B256,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	pub details: Option<serde_json::Value>,
	/// Suggested retry delay in seconds
	#[serde(rename = "retryAfter")]
	pub retry_after: Option<u64>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Malformed input (400)
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Well-formed request rejected by the authorization protocol (422)
	UnprocessableEntity {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Internal server error (500)
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::UnprocessableEntity { .. } => 422,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Returns the machine-readable error code.
	pub fn error_type(&self) -> &str {
		match self {
			APIError::BadRequest { error_type, .. }
			| APIError::UnprocessableEntity { error_type, .. }
			| APIError::InternalServerError { error_type, .. } => error_type,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			APIError::BadRequest {
				error_type,
				message,
				details,
			}
			| APIError::UnprocessableEntity {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
				retry_after: None,
			},
			APIError::InternalServerError {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
				retry_after: None,
			},
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::UnprocessableEntity { message, .. } => {
				write!(f, "Unprocessable Entity: {}", message)
			},
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = match self.status_code() {
			400 => StatusCode::BAD_REQUEST,
			422 => StatusCode::UNPROCESSABLE_ENTITY,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		};

		let error_response = self.to_error_response();
		(status, Json(error_response)).into_response()
	}
}

/// Serde module for U256 amounts as decimal strings.
///
/// Deserialization also accepts `0x`-prefixed hex, which some signing tools emit.
pub mod u256_serde {
	use alloy_primitives::U256;
	use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

	pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		value.to_string().serialize(serializer)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
			Some(hex) => (hex, 16),
			None => (s.as_str(), 10),
		};
		if digits.is_empty() {
			return Err(D::Error::custom("empty integer"));
		}
		U256::from_str_radix(digits, radix).map_err(D::Error::custom)
	}
}
