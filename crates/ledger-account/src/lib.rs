//! Account management for owners who sign approval requests.
//!
//! The ledger itself never holds owner keys. This crate exists for tooling and
//! tests that need to produce valid `ApproveWithAuthorization` signatures, and
//! follows the same pluggable-implementation layout as storage.

use async_trait::async_trait;
use ledger_types::{
	Address, ApprovalRequest, Bytes, ConfigSchema, DomainDescriptor, ImplementationRegistry, B256,
};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// Error that occurs when interacting with the account implementation.
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Interface for accounts able to sign EIP-712 digests.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Returns the configuration schema for this account implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Retrieves the address associated with this account.
	async fn address(&self) -> Result<Address, AccountError>;

	/// Signs a 32-byte digest as-is, without any message prefix.
	///
	/// Returns the 65-byte `r ‖ s ‖ v` encoding with a low `s` and `v` in {27, 28}.
	async fn sign_digest(&self, digest: &B256) -> Result<Bytes, AccountError>;
}

/// Type alias for account factory functions.
pub type AccountFactory = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Registry trait for account implementations.
pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// Get all registered account implementations.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// Service that signs approval requests on behalf of an owner.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	/// Retrieves the address associated with the managed account.
	pub async fn get_address(&self) -> Result<Address, AccountError> {
		self.implementation.address().await
	}

	/// Signs `request` for `domain`.
	///
	/// Fails if the request's owner is not this account, since such a signature
	/// could never be accepted.
	pub async fn sign_authorization(
		&self,
		domain: &DomainDescriptor,
		request: &ApprovalRequest,
	) -> Result<Bytes, AccountError> {
		let address = self.implementation.address().await?;
		if address != request.owner {
			return Err(AccountError::SigningFailed(format!(
				"request owner {} does not match account {}",
				request.owner, address
			)));
		}
		self.implementation
			.sign_digest(&request.signing_digest(domain))
			.await
	}
}
