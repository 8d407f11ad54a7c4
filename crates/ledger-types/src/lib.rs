//! Common types for the allowance ledger.
//!
//! This crate defines the data shared by every ledger component: the signed
//! approval request and its EIP-712 hashing, the domain descriptor, events,
//! HTTP API bodies, and configuration validation helpers.

/// HTTP API request/response types and the structured API error.
pub mod api;
/// Signed approval requests and their typed-data digest.
pub mod authorization;
/// EIP-712 domain descriptor.
pub mod domain;
/// Events published after committed state changes.
pub mod events;
/// Registry trait for pluggable implementations.
pub mod registry;
/// Redacting wrapper for private keys.
pub mod secret_string;
/// Storage namespaces.
pub mod storage;
/// Utility functions (EIP-712 encoding, formatting, time).
pub mod utils;
/// Configuration validation for pluggable implementations.
pub mod validation;

pub use alloy_primitives::{Address, Bytes, B256, U256};
pub use api::*;
pub use authorization::ApprovalRequest;
pub use domain::DomainDescriptor;
pub use events::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use storage::StorageKey;
pub use utils::{current_timestamp, public_key_address, truncate_id, without_0x_prefix};
pub use validation::*;
