//! EIP-712 domain descriptor for a ledger instance.
//!
//! The descriptor is fixed when the ledger is initialized and mixed into every
//! authorization digest, so a signature issued for one deployment, network or
//! version cannot be replayed against another.

use crate::utils::eip712::compute_domain_hash;
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

/// Identity of the ledger instance that signatures are bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainDescriptor {
	/// Human-readable name of the signing domain (the token name).
	pub name: String,
	/// Current major version of the signing domain.
	pub version: String,
	/// Chain / network identifier.
	pub chain_id: u64,
	/// Address of the contract instance verifying the signatures.
	pub verifying_contract: Address,
}

impl DomainDescriptor {
	pub fn new(
		name: impl Into<String>,
		version: impl Into<String>,
		chain_id: u64,
		verifying_contract: Address,
	) -> Self {
		Self {
			name: name.into(),
			version: version.into(),
			chain_id,
			verifying_contract,
		}
	}

	/// Returns the EIP-712 domain separator for this descriptor.
	pub fn separator(&self) -> B256 {
		compute_domain_hash(
			&self.name,
			&self.version,
			self.chain_id,
			&self.verifying_contract,
		)
	}
}
