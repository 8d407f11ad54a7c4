//! Local account backed by an in-process secp256k1 private key.

use crate::{AccountError, AccountFactory, AccountInterface, AccountRegistry};
use async_trait::async_trait;
use k256::ecdsa::SigningKey;
use ledger_types::{
	public_key_address, Address, Bytes, ConfigSchema, Field, FieldType, ImplementationRegistry,
	Schema, SecretString, ValidationError, B256,
};

/// Account holding its signing key in memory.
pub struct LocalAccount {
	signer: SigningKey,
	address: Address,
}

impl std::fmt::Debug for LocalAccount {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LocalAccount")
			.field("address", &self.address)
			.finish_non_exhaustive()
	}
}

impl LocalAccount {
	/// Creates an account from a hex-encoded private key (with or without `0x`).
	pub fn new(private_key: impl Into<SecretString>) -> Result<Self, AccountError> {
		let secret: SecretString = private_key.into();
		let bytes = secret.decode_hex().map_err(AccountError::InvalidKey)?;
		let signer = SigningKey::from_slice(&bytes)
			.map_err(|e| AccountError::InvalidKey(format!("not a secp256k1 scalar: {}", e)))?;
		let address = public_key_address(signer.verifying_key());
		Ok(Self { signer, address })
	}
}

#[async_trait]
impl AccountInterface for LocalAccount {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalAccountSchema)
	}

	async fn address(&self) -> Result<Address, AccountError> {
		Ok(self.address)
	}

	async fn sign_digest(&self, digest: &B256) -> Result<Bytes, AccountError> {
		let (signature, recovery_id) = self
			.signer
			.sign_prehash_recoverable(digest.as_slice())
			.map_err(|e| AccountError::SigningFailed(e.to_string()))?;

		let mut out = Vec::with_capacity(65);
		out.extend_from_slice(&signature.to_bytes());
		out.push(27 + recovery_id.to_byte());
		Ok(Bytes::from(out))
	}
}

/// Configuration schema for LocalAccount.
pub struct LocalAccountSchema;

impl ConfigSchema for LocalAccountSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("private_key", FieldType::Hex { bytes: Some(32) })],
			vec![],
		);
		schema.validate(config)
	}
}

/// Factory function to create a local account from configuration.
///
/// Configuration parameters:
/// - `private_key`: 32-byte hex private key, usually `${LEDGER_PRIVATE_KEY}`
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	LocalAccountSchema
		.validate(config)
		.map_err(|e| AccountError::InvalidKey(e.to_string()))?;

	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.ok_or_else(|| AccountError::InvalidKey("private_key is required".into()))?;

	Ok(Box::new(LocalAccount::new(private_key)?))
}

/// Registry for the local account implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = AccountFactory;

	fn factory() -> Self::Factory {
		create_account
	}
}

impl AccountRegistry for Registry {}
