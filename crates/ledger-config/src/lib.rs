//! Configuration module for the allowance ledger.
//!
//! Configuration is TOML. String values may reference environment variables as
//! `${VAR}` or `${VAR:-default}`, which keeps private keys out of config files.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["domain.toml", "storage.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

mod loader;

use alloy_primitives::Address;
use ledger_types::DomainDescriptor;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the ledger.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this ledger instance.
	pub ledger: LedgerConfig,
	/// EIP-712 signing domain, fixed for the lifetime of the deployment.
	pub domain: DomainConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Optional signing account for local tooling.
	pub account: Option<AccountConfig>,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to the ledger instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
	/// Unique identifier for this ledger instance, used in logs.
	pub id: String,
	/// Capacity of the event bus channel.
	#[serde(default = "default_event_capacity")]
	pub event_capacity: usize,
}

fn default_event_capacity() -> usize {
	1000
}

/// EIP-712 domain configuration.
///
/// Changing any of these values invalidates every signature issued so far.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DomainConfig {
	/// Token name used as the domain name.
	pub name: String,
	/// Domain version string, e.g. "1.0".
	pub version: String,
	/// Chain / network identifier.
	pub chain_id: u64,
	/// Address of the verifying contract instance.
	pub verifying_contract: Address,
}

impl DomainConfig {
	/// Builds the immutable domain descriptor used for hashing.
	pub fn descriptor(&self) -> DomainDescriptor {
		DomainDescriptor::new(
			self.name.clone(),
			self.version.clone(),
			self.chain_id,
			self.verifying_contract,
		)
	}
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for account management.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of account implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Maximum request size in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

/// Authorization bodies are a few hundred bytes.
fn default_max_request_size() -> usize {
	64 * 1024
}

/// Largest configuration input accepted, bounding regex work.
const MAX_CONFIG_BYTES: usize = 1024 * 1024;

/// Substitutes `${NAME}` and `${NAME:-fallback}` with environment values.
///
/// A reference without a fallback to an unset variable is an error.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	if input.len() > MAX_CONFIG_BYTES {
		return Err(ConfigError::Validation(format!(
			"Configuration input is {} bytes, limit is {}",
			input.len(),
			MAX_CONFIG_BYTES
		)));
	}

	let pattern = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut missing: Option<String> = None;
	let resolved = pattern.replace_all(input, |caps: &regex::Captures<'_>| {
		let name = &caps[1];
		match (std::env::var(name), caps.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(fallback)) => fallback.as_str().to_string(),
			(Err(_), None) => {
				missing.get_or_insert_with(|| name.to_string());
				String::new()
			},
		}
	});

	match missing {
		Some(name) => Err(ConfigError::Validation(format!(
			"Environment variable '{}' not found",
			name
		))),
		None => Ok(resolved.into_owned()),
	}
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration to ensure all required fields are properly set.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.ledger.id.is_empty() {
			return Err(ConfigError::Validation("Ledger ID cannot be empty".into()));
		}
		if self.ledger.event_capacity == 0 {
			return Err(ConfigError::Validation(
				"ledger.event_capacity must be greater than 0".into(),
			));
		}

		// Validate domain config
		if self.domain.name.is_empty() {
			return Err(ConfigError::Validation(
				"Domain name cannot be empty".into(),
			));
		}
		if self.domain.version.is_empty() {
			return Err(ConfigError::Validation(
				"Domain version cannot be empty".into(),
			));
		}
		if self.domain.chain_id == 0 {
			return Err(ConfigError::Validation(
				"Domain chain_id must be non-zero".into(),
			));
		}
		if self.domain.verifying_contract == Address::ZERO {
			return Err(ConfigError::Validation(
				"Domain verifying_contract cannot be the zero address".into(),
			));
		}

		// Validate storage config
		if self.storage.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one storage implementation must be configured".into(),
			));
		}
		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		// Validate account config if present
		if let Some(ref account) = self.account {
			if !account.implementations.contains_key(&account.primary) {
				return Err(ConfigError::Validation(format!(
					"Primary account '{}' not found in implementations",
					account.primary
				)));
			}
		}

		// Validate API config if enabled
		if let Some(ref api) = self.api {
			if api.enabled && api.port == 0 {
				return Err(ConfigError::Validation(
					"API port must be non-zero when the API is enabled".into(),
				));
			}
		}

		Ok(())
	}
}

/// Parses a TOML string, resolving environment variables and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	const BASE: &str = r#"
[ledger]
id = "ledger-test"

[domain]
name = "GiddyToken"
version = "1.0"
chain_id = 31337
verifying_contract = "0x5FbDB2315678afecb367f032d93F642f64180aa3"

[storage]
primary = "memory"
[storage.implementations.memory]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("LEDGER_TEST_HOST", "localhost");
		std::env::set_var("LEDGER_TEST_PORT", "5432");

		let input = "host = \"${LEDGER_TEST_HOST}:${LEDGER_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "host = \"localhost:5432\"");

		std::env::remove_var("LEDGER_TEST_HOST");
		std::env::remove_var("LEDGER_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${LEDGER_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("value = \"${LEDGER_MISSING_VAR}\"");
		assert!(result.unwrap_err().to_string().contains("LEDGER_MISSING_VAR"));
	}

	#[test]
	fn test_minimal_config_parses() {
		let config: Config = BASE.parse().unwrap();
		assert_eq!(config.ledger.id, "ledger-test");
		assert_eq!(config.ledger.event_capacity, 1000);
		assert!(config.api.is_none());
		assert!(config.account.is_none());

		let descriptor = config.domain.descriptor();
		assert_eq!(descriptor.name, "GiddyToken");
		assert_eq!(descriptor.version, "1.0");
		assert_eq!(descriptor.chain_id, 31337);
		assert_eq!(
			descriptor.verifying_contract,
			address!("5FbDB2315678afecb367f032d93F642f64180aa3")
		);
	}

	#[test]
	fn test_account_and_api_sections() {
		let config_str = format!(
			r#"{}
[account]
primary = "local"
[account.implementations.local]
private_key = "${{LEDGER_TEST_KEY:-0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80}}"

[api]
enabled = true
port = 8080
"#,
			BASE
		);
		let config: Config = config_str.parse().unwrap();

		let account = config.account.unwrap();
		assert_eq!(account.primary, "local");
		assert!(account.implementations["local"]
			.get("private_key")
			.and_then(|v| v.as_str())
			.is_some_and(|k| k.starts_with("0xac09")));

		let api = config.api.unwrap();
		assert!(api.enabled);
		assert_eq!(api.port, 8080);
		assert_eq!(api.host, "127.0.0.1");
	}

	#[test]
	fn test_zero_chain_id_rejected() {
		let config_str = BASE.replace("chain_id = 31337", "chain_id = 0");
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err.to_string().contains("chain_id must be non-zero"));
	}

	#[test]
	fn test_zero_verifying_contract_rejected() {
		let config_str = BASE.replace(
			"0x5FbDB2315678afecb367f032d93F642f64180aa3",
			"0x0000000000000000000000000000000000000000",
		);
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err.to_string().contains("zero address"));
	}

	#[test]
	fn test_malformed_verifying_contract_rejected() {
		let config_str = BASE.replace("0x5FbDB2315678afecb367f032d93F642f64180aa3", "0x1234");
		assert!(matches!(
			Config::from_str(&config_str),
			Err(ConfigError::Parse(_))
		));
	}

	#[test]
	fn test_unknown_primary_storage_rejected() {
		let config_str = BASE.replace("primary = \"memory\"", "primary = \"file\"");
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err
			.to_string()
			.contains("Primary storage 'file' not found in implementations"));
	}

	#[test]
	fn test_unknown_primary_account_rejected() {
		let config_str = format!(
			"{}\n[account]\nprimary = \"kms\"\n[account.implementations.local]\n",
			BASE
		);
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err.to_string().contains("Primary account 'kms'"));
	}
}
