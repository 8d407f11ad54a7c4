//! Utility functions shared across the ledger crates.

pub mod crypto;
pub mod eip712;
pub mod formatting;
pub mod helpers;

pub use crypto::public_key_address;
pub use eip712::{
	approve_with_authorization_type_hash, compute_domain_hash, compute_final_digest,
	domain_type_hash, Eip712AbiEncoder, APPROVE_WITH_AUTHORIZATION_TYPE, DOMAIN_TYPE,
};
pub use formatting::{truncate_id, without_0x_prefix};
pub use helpers::current_timestamp;
