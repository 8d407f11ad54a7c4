//! Authorization engine: the single entry point that mutates allowances.
//!
//! Two paths write the allowance table. `approve` is the owner's direct call and
//! overwrites unconditionally. `approve_with_authorization` applies a signed
//! [`ApprovalRequest`] submitted by any relayer, after these checks in order:
//!
//! 1. `now <= deadline`, else [`AuthorizationError::Expired`]
//! 2. nonce unused, else [`AuthorizationError::AuthorizationReused`]
//! 3. signature recovers, else [`AuthorizationError::InvalidSignature`]
//! 4. signer is the owner, else [`AuthorizationError::SignerMismatch`]
//! 5. stored allowance equals `current_approval`, else [`AuthorizationError::StalePrecondition`]
//!
//! The allowance swap and the nonce consumption then commit together. Both
//! paths hold the same commit lock, so no mutation interleaves with another.

pub mod event_bus;

use crate::allowance::{AllowanceError, AllowanceLedger};
use crate::clock::Clock;
use crate::nonce::{NonceError, NonceRegistry};
use crate::signature::{recover_signer, SignatureError};
use alloy_primitives::{Address, B256, U256};
use event_bus::EventBus;
use ledger_storage::StorageService;
use ledger_types::utils::{approve_with_authorization_type_hash, compute_final_digest};
use ledger_types::{
	truncate_id, AllowanceEvent, ApprovalRequest, ApprovalSource, AuthorizationEvent,
	DomainDescriptor, LedgerEvent,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Why an authorization was not applied.
///
/// Every variant except `Storage` leaves ledger state untouched by construction.
/// `Storage` means the backend failed; any partial write has been undone.
#[derive(Debug, Error)]
pub enum AuthorizationError {
	#[error("ApprovalRequest: expired (deadline {deadline}, now {now})")]
	Expired { deadline: U256, now: u64 },
	#[error("ApprovalRequest: authorization is already used")]
	AuthorizationReused { nonce: B256 },
	#[error("ApprovalRequest: invalid signature ({0})")]
	InvalidSignature(#[from] SignatureError),
	#[error("ApprovalRequest: invalid signature (signed by {signer}, not owner {owner})")]
	SignerMismatch { signer: Address, owner: Address },
	#[error("ApprovalRequest: Incorrect approval given (expected {expected})")]
	StalePrecondition { expected: U256 },
	#[error("Storage error: {0}")]
	Storage(String),
}

impl AuthorizationError {
	/// Machine-readable code reported to relayers.
	pub fn code(&self) -> &'static str {
		match self {
			AuthorizationError::Expired { .. } => "EXPIRED",
			AuthorizationError::AuthorizationReused { .. } => "AUTHORIZATION_REUSED",
			AuthorizationError::InvalidSignature(_) => "INVALID_SIGNATURE",
			AuthorizationError::SignerMismatch { .. } => "SIGNER_MISMATCH",
			AuthorizationError::StalePrecondition { .. } => "STALE_PRECONDITION",
			AuthorizationError::Storage(_) => "STORAGE_ERROR",
		}
	}

	/// True for rejections decided by the protocol rather than by a backend fault.
	pub fn is_rejection(&self) -> bool {
		!matches!(self, AuthorizationError::Storage(_))
	}
}

impl From<AllowanceError> for AuthorizationError {
	fn from(err: AllowanceError) -> Self {
		AuthorizationError::Storage(err.to_string())
	}
}

impl From<NonceError> for AuthorizationError {
	fn from(err: NonceError) -> Self {
		AuthorizationError::Storage(err.to_string())
	}
}

/// Orchestrates allowance changes for one ledger instance.
pub struct AuthorizationEngine {
	domain: DomainDescriptor,
	/// Cached separator; the domain never changes after construction.
	separator: B256,
	allowances: AllowanceLedger,
	nonces: NonceRegistry,
	clock: Arc<dyn Clock>,
	event_bus: EventBus,
	commit_lock: Mutex<()>,
}

impl AuthorizationEngine {
	pub fn new(
		domain: DomainDescriptor,
		storage: Arc<StorageService>,
		clock: Arc<dyn Clock>,
		event_bus: EventBus,
	) -> Self {
		let separator = domain.separator();
		Self {
			domain,
			separator,
			allowances: AllowanceLedger::new(storage.clone()),
			nonces: NonceRegistry::new(storage),
			clock,
			event_bus,
			commit_lock: Mutex::new(()),
		}
	}

	pub fn domain(&self) -> &DomainDescriptor {
		&self.domain
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	pub fn domain_separator(&self) -> B256 {
		self.separator
	}

	pub fn approve_with_authorization_typehash(&self) -> B256 {
		approve_with_authorization_type_hash()
	}

	/// The digest an owner must sign for `request` to be accepted here.
	pub fn digest(&self, request: &ApprovalRequest) -> B256 {
		compute_final_digest(&self.separator, &request.struct_hash())
	}

	pub async fn allowance(&self, owner: &Address, spender: &Address) -> Result<U256, AllowanceError> {
		self.allowances.get(owner, spender).await
	}

	/// Whether `nonce` has been consumed.
	pub async fn authorization_state(&self, nonce: &B256) -> Result<bool, NonceError> {
		self.nonces.is_consumed(nonce).await
	}

	/// Direct approval by the owner. Authentication of `owner` is the caller's job.
	pub async fn approve(
		&self,
		owner: Address,
		spender: Address,
		value: U256,
	) -> Result<(), AllowanceError> {
		let _guard = self.commit_lock.lock().await;
		self.allowances.set(owner, spender, value).await?;

		tracing::info!(owner = %owner, spender = %spender, value = %value, "Allowance set");
		self.event_bus
			.publish(LedgerEvent::Allowance(AllowanceEvent::Approval {
				owner,
				spender,
				value,
				source: ApprovalSource::Direct,
			}));
		Ok(())
	}

	/// Applies a signed approval request.
	pub async fn approve_with_authorization(
		&self,
		request: &ApprovalRequest,
		signature: &[u8],
	) -> Result<(), AuthorizationError> {
		let _guard = self.commit_lock.lock().await;

		match self.apply(request, signature).await {
			Ok(()) => {
				tracing::info!(
					owner = %request.owner,
					spender = %request.spender,
					value = %request.value,
					nonce = %truncate_id(&request.nonce.to_string()),
					"Authorization applied"
				);
				self.event_bus
					.publish(LedgerEvent::Allowance(AllowanceEvent::Approval {
						owner: request.owner,
						spender: request.spender,
						value: request.value,
						source: ApprovalSource::Authorization,
					}));
				self.event_bus
					.publish(LedgerEvent::Authorization(AuthorizationEvent::Used {
						owner: request.owner,
						nonce: request.nonce,
					}));
				Ok(())
			},
			Err(e) if e.is_rejection() => {
				tracing::warn!(
					owner = %request.owner,
					nonce = %truncate_id(&request.nonce.to_string()),
					kind = e.code(),
					error = %e,
					"Authorization rejected"
				);
				self.event_bus
					.publish(LedgerEvent::Authorization(AuthorizationEvent::Rejected {
						owner: request.owner,
						nonce: request.nonce,
						reason: e.code().to_string(),
					}));
				Err(e)
			},
			Err(e) => {
				tracing::error!(
					owner = %request.owner,
					nonce = %truncate_id(&request.nonce.to_string()),
					error = %e,
					"Authorization failed"
				);
				Err(e)
			},
		}
	}

	/// Runs the checks and the commit. Caller holds the commit lock.
	async fn apply(
		&self,
		request: &ApprovalRequest,
		signature: &[u8],
	) -> Result<(), AuthorizationError> {
		let now = self.clock.now();
		if request.is_expired_at(now) {
			return Err(AuthorizationError::Expired {
				deadline: request.deadline,
				now,
			});
		}

		if self.nonces.is_consumed(&request.nonce).await? {
			return Err(AuthorizationError::AuthorizationReused {
				nonce: request.nonce,
			});
		}

		let signer = recover_signer(&self.digest(request), signature)?;
		if signer != request.owner {
			return Err(AuthorizationError::SignerMismatch {
				signer,
				owner: request.owner,
			});
		}

		let swapped = self
			.allowances
			.compare_and_set(
				request.owner,
				request.spender,
				request.current_approval,
				request.value,
			)
			.await?;
		if !swapped {
			return Err(AuthorizationError::StalePrecondition {
				expected: request.current_approval,
			});
		}

		if let Err(e) = self.nonces.consume(&request.nonce, request.owner, now).await {
			// Put back the value the swap replaced. An entry that was never set
			// is written as an explicit zero, which reads the same.
			if let Err(restore) = self
				.allowances
				.set(request.owner, request.spender, request.current_approval)
				.await
			{
				tracing::error!(
					owner = %request.owner,
					spender = %request.spender,
					error = %restore,
					"Failed to restore allowance after nonce write failure"
				);
			}
			return Err(e.into());
		}

		Ok(())
	}
}
