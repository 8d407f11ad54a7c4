//! Allowance table: how much each spender may move on behalf of each owner.
//!
//! Direct approvals use [`AllowanceLedger::set`]; signed authorizations use
//! [`AllowanceLedger::compare_and_set`]. Both write the same entry, so a direct
//! approval invalidates any pending authorization signed against the old value.

use alloy_primitives::{Address, U256};
use ledger_storage::{StorageError, StorageService};
use ledger_types::{u256_serde, StorageKey};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum AllowanceError {
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AllowanceRecord {
	owner: Address,
	spender: Address,
	#[serde(with = "u256_serde")]
	value: U256,
}

pub struct AllowanceLedger {
	storage: Arc<StorageService>,
	write_lock: Mutex<()>,
}

impl AllowanceLedger {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self {
			storage,
			write_lock: Mutex::new(()),
		}
	}

	fn key(owner: &Address, spender: &Address) -> String {
		format!("{:#x}-{:#x}", owner, spender)
	}

	/// Current allowance; zero when never set.
	pub async fn get(&self, owner: &Address, spender: &Address) -> Result<U256, AllowanceError> {
		let record: Option<AllowanceRecord> = self
			.storage
			.retrieve_optional(StorageKey::Allowances.as_str(), &Self::key(owner, spender))
			.await?;
		Ok(record.map(|r| r.value).unwrap_or(U256::ZERO))
	}

	async fn write(
		&self,
		owner: Address,
		spender: Address,
		value: U256,
	) -> Result<(), AllowanceError> {
		let record = AllowanceRecord {
			owner,
			spender,
			value,
		};
		self.storage
			.store(
				StorageKey::Allowances.as_str(),
				&Self::key(&owner, &spender),
				&record,
			)
			.await?;
		Ok(())
	}

	/// Unconditionally sets the allowance.
	pub async fn set(
		&self,
		owner: Address,
		spender: Address,
		value: U256,
	) -> Result<(), AllowanceError> {
		let _guard = self.write_lock.lock().await;
		self.write(owner, spender, value).await
	}

	/// Sets the allowance to `new` only if it currently equals `expected`.
	///
	/// Returns whether the write happened.
	pub async fn compare_and_set(
		&self,
		owner: Address,
		spender: Address,
		expected: U256,
		new: U256,
	) -> Result<bool, AllowanceError> {
		let _guard = self.write_lock.lock().await;
		let current = self.get(&owner, &spender).await?;
		if current != expected {
			tracing::debug!(
				owner = %owner,
				spender = %spender,
				expected = %expected,
				current = %current,
				"Allowance precondition not met"
			);
			return Ok(false);
		}
		self.write(owner, spender, new).await?;
		Ok(true)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;
	use ledger_storage::implementations::memory::MemoryStorage;

	const OWNER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
	const SPENDER: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

	fn ledger() -> AllowanceLedger {
		AllowanceLedger::new(Arc::new(StorageService::new(Box::new(MemoryStorage::new()))))
	}

	#[tokio::test]
	async fn test_unset_is_zero() {
		assert_eq!(ledger().get(&OWNER, &SPENDER).await.unwrap(), U256::ZERO);
	}

	#[tokio::test]
	async fn test_set_is_directional() {
		let ledger = ledger();
		ledger.set(OWNER, SPENDER, U256::from(5)).await.unwrap();

		assert_eq!(ledger.get(&OWNER, &SPENDER).await.unwrap(), U256::from(5));
		assert_eq!(ledger.get(&SPENDER, &OWNER).await.unwrap(), U256::ZERO);
	}

	#[tokio::test]
	async fn test_compare_and_set() {
		let ledger = ledger();

		assert!(ledger
			.compare_and_set(OWNER, SPENDER, U256::ZERO, U256::from(100))
			.await
			.unwrap());
		assert_eq!(ledger.get(&OWNER, &SPENDER).await.unwrap(), U256::from(100));

		// Stale expectation leaves the value alone.
		assert!(!ledger
			.compare_and_set(OWNER, SPENDER, U256::ZERO, U256::from(7))
			.await
			.unwrap());
		assert_eq!(ledger.get(&OWNER, &SPENDER).await.unwrap(), U256::from(100));
	}

	#[tokio::test]
	async fn test_concurrent_compare_and_set_single_winner() {
		let ledger = Arc::new(ledger());

		let handles: Vec<_> = (1..=8u64)
			.map(|i| {
				let ledger = ledger.clone();
				tokio::spawn(async move {
					ledger
						.compare_and_set(OWNER, SPENDER, U256::ZERO, U256::from(i))
						.await
						.unwrap()
				})
			})
			.collect();

		let mut winners = 0;
		for handle in handles {
			if handle.await.unwrap() {
				winners += 1;
			}
		}
		assert_eq!(winners, 1);
	}

	#[tokio::test]
	async fn test_max_value() {
		let ledger = ledger();
		ledger.set(OWNER, SPENDER, U256::MAX).await.unwrap();
		assert_eq!(ledger.get(&OWNER, &SPENDER).await.unwrap(), U256::MAX);
	}
}
