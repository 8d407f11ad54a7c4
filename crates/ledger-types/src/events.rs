//! Event types published by the ledger.
//!
//! Events flow through the ledger's event bus after a state transition has been
//! committed, so subscribers never observe a change that was later rolled back.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

/// Main event type encompassing all ledger events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
	/// Events from the allowance table.
	Allowance(AllowanceEvent),
	/// Events from the authorization protocol.
	Authorization(AuthorizationEvent),
}

/// How an allowance change was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalSource {
	/// Ordinary approval issued by the owner.
	Direct,
	/// Signed authorization submitted by a relayer.
	Authorization,
}

/// Events related to allowance changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllowanceEvent {
	/// The allowance of `spender` over `owner`'s tokens was set to `value`.
	Approval {
		owner: Address,
		spender: Address,
		value: U256,
		source: ApprovalSource,
	},
}

/// Events related to signed authorizations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationEvent {
	/// An authorization was applied and its nonce consumed.
	Used { owner: Address, nonce: B256 },
	/// An authorization was rejected; no state changed.
	Rejected {
		owner: Address,
		nonce: B256,
		reason: String,
	},
}
