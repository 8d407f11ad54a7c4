//! Main entry point for the ledger service.
//!
//! `ledger` (or `ledger serve`) runs the allowance ledger and, when enabled,
//! the relayer HTTP API. `ledger sign` signs an approval request with the
//! configured account, for owners preparing authorizations offline.

use clap::{Parser, Subcommand};
use ledger_account::AccountService;
use ledger_config::Config;
use ledger_core::{AuthorizationEngine, LedgerBuilder, LedgerFactories};
use ledger_types::{ApprovalRequest, LedgerEvent};
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

use ledger_account::implementations::local::create_account;
use ledger_storage::implementations::file::create_storage as create_file_storage;
use ledger_storage::implementations::memory::create_storage as create_memory_storage;

/// Command-line arguments for the ledger service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
	/// Run the ledger (default).
	Serve,
	/// Sign an approval request (JSON file) with the configured account.
	Sign {
		/// Path to the request JSON
		#[arg(short, long)]
		request: PathBuf,
	},
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let config_path = args
		.config
		.to_str()
		.ok_or("configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.ledger.id);

	match args.command.unwrap_or(Command::Serve) {
		Command::Serve => serve(config).await,
		Command::Sign { request } => sign(config, request).await,
	}
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

fn build_ledger(config: Config) -> Result<AuthorizationEngine, Box<dyn std::error::Error>> {
	let storage_factories = create_factory_map!(
		ledger_storage::StorageInterface,
		ledger_storage::StorageError,
		"file" => create_file_storage,
		"memory" => create_memory_storage,
	);

	Ok(LedgerBuilder::new(config).build(LedgerFactories { storage_factories })?)
}

fn build_account(config: &Config) -> Result<AccountService, Box<dyn std::error::Error>> {
	let account_config = config
		.account
		.as_ref()
		.ok_or("no [account] section configured")?;

	let account_factories = create_factory_map!(
		ledger_account::AccountInterface,
		ledger_account::AccountError,
		"local" => create_account,
	);

	let factory = account_factories
		.get(&account_config.primary)
		.ok_or_else(|| format!("unknown account implementation '{}'", account_config.primary))?;
	let implementation_config = account_config
		.implementations
		.get(&account_config.primary)
		.ok_or_else(|| format!("missing configuration for '{}'", account_config.primary))?;

	Ok(AccountService::new(factory(implementation_config)?))
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
	let api_config = config.api.clone().filter(|api| api.enabled);
	let engine = Arc::new(build_ledger(config)?);

	let mut events = engine.event_bus().subscribe();
	tokio::spawn(async move {
		while let Ok(event) = events.recv().await {
			log_event(&event);
		}
	});

	tracing::info!("Started ledger");

	match api_config {
		Some(api_config) => {
			tokio::select! {
				result = server::start_server(api_config, engine) => {
					tracing::info!("API server finished");
					result?;
				}
				_ = tokio::signal::ctrl_c() => {}
			}
		},
		None => {
			tracing::warn!("API disabled; the ledger accepts no requests");
			tokio::signal::ctrl_c().await?;
		},
	}

	tracing::info!("Stopped ledger");
	Ok(())
}

async fn sign(config: Config, request_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
	let account = build_account(&config)?;
	let request: ApprovalRequest = serde_json::from_slice(&tokio::fs::read(&request_path).await?)?;

	let domain = config.domain.descriptor();
	let signature = account.sign_authorization(&domain, &request).await?;
	tracing::info!(owner = %request.owner, nonce = %request.nonce, "Signed authorization");

	let output = serde_json::json!({
		"request": request,
		"signature": signature,
		"digest": request.signing_digest(&domain),
	});
	println!("{}", serde_json::to_string_pretty(&output)?);
	Ok(())
}

fn log_event(event: &LedgerEvent) {
	match event {
		LedgerEvent::Allowance(ledger_types::AllowanceEvent::Approval {
			owner,
			spender,
			value,
			source,
		}) => {
			tracing::debug!(owner = %owner, spender = %spender, value = %value, source = ?source, "Approval");
		},
		LedgerEvent::Authorization(ledger_types::AuthorizationEvent::Used { owner, nonce }) => {
			tracing::debug!(owner = %owner, nonce = %nonce, "AuthorizationUsed");
		},
		LedgerEvent::Authorization(ledger_types::AuthorizationEvent::Rejected {
			owner,
			nonce,
			reason,
		}) => {
			tracing::debug!(owner = %owner, nonce = %nonce, reason = %reason, "AuthorizationRejected");
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, B256, U256};
	use std::fs;
	use tempfile::tempdir;

	fn write_config(dir: &std::path::Path, extra: &str) -> PathBuf {
		let path = dir.join("config.toml");
		fs::write(
			&path,
			format!(
				r#"
[ledger]
id = "service-test"

[domain]
name = "GiddyToken"
version = "1.0"
chain_id = 31337
verifying_contract = "0x5FbDB2315678afecb367f032d93F642f64180aa3"

[storage]
primary = "memory"
[storage.implementations.memory]
{extra}
"#
			),
		)
		.unwrap();
		path
	}

	#[test]
	fn test_args_default_values() {
		let args = Args::parse_from(["ledger"]);
		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
		assert!(args.command.is_none());
	}

	#[test]
	fn test_sign_subcommand() {
		let args = Args::parse_from(["ledger", "-c", "custom.toml", "sign", "--request", "req.json"]);
		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(
			args.command,
			Some(Command::Sign {
				request: PathBuf::from("req.json")
			})
		);
	}

	#[tokio::test]
	async fn test_build_ledger_from_file() {
		let dir = tempdir().unwrap();
		let path = write_config(dir.path(), "");
		let config = Config::from_file(path.to_str().unwrap()).await.unwrap();

		let engine = build_ledger(config.clone()).unwrap();
		assert_eq!(
			engine.domain_separator(),
			config.domain.descriptor().separator()
		);
	}

	#[tokio::test]
	async fn test_configured_account_signs_for_ledger() {
		let dir = tempdir().unwrap();
		let path = write_config(
			dir.path(),
			r#"
[account]
primary = "local"
[account.implementations.local]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
"#,
		);
		let config = Config::from_file(path.to_str().unwrap()).await.unwrap();
		let account = build_account(&config).unwrap();
		let engine = build_ledger(config.clone()).unwrap();

		let request = ApprovalRequest {
			owner: address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
			spender: address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
			value: U256::from(1u64),
			deadline: U256::MAX,
			nonce: B256::repeat_byte(9),
			current_approval: U256::ZERO,
		};
		let signature = account
			.sign_authorization(&config.domain.descriptor(), &request)
			.await
			.unwrap();

		engine
			.approve_with_authorization(&request, &signature)
			.await
			.unwrap();
	}

	#[tokio::test]
	async fn test_missing_account_section() {
		let dir = tempdir().unwrap();
		let path = write_config(dir.path(), "");
		let config = Config::from_file(path.to_str().unwrap()).await.unwrap();
		assert!(build_account(&config).is_err());
	}
}
