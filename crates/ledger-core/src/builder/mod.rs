//! Builds an [`AuthorizationEngine`] from configuration.
//!
//! Storage backends are pluggable: the caller passes a map of factory
//! functions keyed by implementation name, and the builder instantiates the
//! ones named in the `[storage]` section.

use crate::clock::{Clock, SystemClock};
use crate::engine::{event_bus::EventBus, AuthorizationEngine};
use ledger_config::Config;
use ledger_storage::{StorageError, StorageInterface, StorageService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Factory functions available to the builder.
pub struct LedgerFactories<SF> {
	pub storage_factories: HashMap<String, SF>,
}

pub struct LedgerBuilder {
	config: Config,
	clock: Arc<dyn Clock>,
}

impl LedgerBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			clock: Arc::new(SystemClock),
		}
	}

	/// Replaces the wall clock, e.g. with a [`ManualClock`](crate::clock::ManualClock).
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	pub fn build<SF>(self, factories: LedgerFactories<SF>) -> Result<AuthorizationEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			let Some(factory) = factories.storage_factories.get(name) else {
				tracing::warn!(
					component = "storage",
					implementation = %name,
					"Unknown storage implementation, skipping"
				);
				continue;
			};
			match factory(config) {
				Ok(implementation) => {
					storage_impls.insert(name.clone(), implementation);
					let is_primary = &self.config.storage.primary == name;
					tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
				},
				Err(e) => {
					tracing::error!(
						component = "storage",
						implementation = %name,
						error = %e,
						"Failed to create storage implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create storage implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary storage '{}' failed to load or has invalid configuration",
				primary_storage
			))
		})?;
		let storage = Arc::new(StorageService::new(storage_backend));

		let domain = self.config.domain.descriptor();
		tracing::info!(
			ledger_id = %self.config.ledger.id,
			name = %domain.name,
			version = %domain.version,
			chain_id = domain.chain_id,
			verifying_contract = %domain.verifying_contract,
			separator = %domain.separator(),
			"Signing domain"
		);

		Ok(AuthorizationEngine::new(
			domain,
			storage,
			self.clock,
			EventBus::new(self.config.ledger.event_capacity),
		))
	}
}
