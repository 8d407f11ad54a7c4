//! Read-only allowance and domain queries.

use alloy_primitives::Address;
use ledger_core::AuthorizationEngine;
use ledger_types::{APIError, AllowanceResponse, DomainResponse};
use std::str::FromStr;

fn parse_address(field: &str, value: &str) -> Result<Address, APIError> {
	Address::from_str(value).map_err(|e| APIError::BadRequest {
		error_type: "INVALID_ADDRESS".to_string(),
		message: format!("{} is not a valid address: {}", field, e),
		details: None,
	})
}

pub async fn get_allowance(
	engine: &AuthorizationEngine,
	owner: &str,
	spender: &str,
) -> Result<AllowanceResponse, APIError> {
	let owner = parse_address("owner", owner)?;
	let spender = parse_address("spender", spender)?;

	let value = engine
		.allowance(&owner, &spender)
		.await
		.map_err(|e| APIError::InternalServerError {
			error_type: "STORAGE_ERROR".to_string(),
			message: e.to_string(),
		})?;

	Ok(AllowanceResponse {
		owner,
		spender,
		value,
	})
}

pub fn get_domain(engine: &AuthorizationEngine) -> DomainResponse {
	DomainResponse {
		domain: engine.domain().clone(),
		domain_separator: engine.domain_separator(),
		approve_with_authorization_typehash: engine.approve_with_authorization_typehash(),
	}
}
