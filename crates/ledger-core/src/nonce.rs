//! Registry of consumed authorization nonces.
//!
//! Nonces are global to a ledger instance and never expire. A nonce is
//! consumed by the first successful authorization that carries it; after that
//! every request with the same nonce is refused, whoever signed it.

use alloy_primitives::{Address, B256};
use ledger_storage::{StorageError, StorageService};
use ledger_types::StorageKey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum NonceError {
	#[error("nonce {0} is already consumed")]
	AlreadyConsumed(B256),
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
}

/// What is kept for each consumed nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceRecord {
	pub owner: Address,
	/// Unix time at which the authorization was applied.
	pub consumed_at: u64,
}

pub struct NonceRegistry {
	storage: Arc<StorageService>,
	write_lock: Mutex<()>,
}

impl NonceRegistry {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self {
			storage,
			write_lock: Mutex::new(()),
		}
	}

	fn key(nonce: &B256) -> String {
		format!("{:#x}", nonce)
	}

	pub async fn is_consumed(&self, nonce: &B256) -> Result<bool, NonceError> {
		Ok(self
			.storage
			.exists(StorageKey::Nonces.as_str(), &Self::key(nonce))
			.await?)
	}

	pub async fn record(&self, nonce: &B256) -> Result<Option<NonceRecord>, NonceError> {
		Ok(self
			.storage
			.retrieve_optional(StorageKey::Nonces.as_str(), &Self::key(nonce))
			.await?)
	}

	/// Marks `nonce` consumed. Consuming a nonce twice is an error.
	pub async fn consume(
		&self,
		nonce: &B256,
		owner: Address,
		consumed_at: u64,
	) -> Result<(), NonceError> {
		let _guard = self.write_lock.lock().await;
		if self.is_consumed(nonce).await? {
			return Err(NonceError::AlreadyConsumed(*nonce));
		}

		let record = NonceRecord { owner, consumed_at };
		self.storage
			.store(StorageKey::Nonces.as_str(), &Self::key(nonce), &record)
			.await?;
		tracing::debug!(nonce = %nonce, owner = %owner, "Nonce consumed");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;
	use ledger_storage::implementations::memory::MemoryStorage;

	fn registry() -> NonceRegistry {
		NonceRegistry::new(Arc::new(StorageService::new(Box::new(MemoryStorage::new()))))
	}

	#[tokio::test]
	async fn test_consume_once() {
		let registry = registry();
		let nonce = B256::repeat_byte(0xab);
		let owner = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

		assert!(!registry.is_consumed(&nonce).await.unwrap());
		assert_eq!(registry.record(&nonce).await.unwrap(), None);

		registry.consume(&nonce, owner, 1_700).await.unwrap();
		assert!(registry.is_consumed(&nonce).await.unwrap());
		assert_eq!(
			registry.record(&nonce).await.unwrap(),
			Some(NonceRecord {
				owner,
				consumed_at: 1_700
			})
		);

		let again = registry.consume(&nonce, Address::ZERO, 1_800).await;
		assert!(matches!(again, Err(NonceError::AlreadyConsumed(n)) if n == nonce));
		// The first record is kept.
		assert_eq!(registry.record(&nonce).await.unwrap().unwrap().owner, owner);
	}

	#[tokio::test]
	async fn test_nonces_are_independent() {
		let registry = registry();
		registry
			.consume(&B256::repeat_byte(1), Address::ZERO, 0)
			.await
			.unwrap();
		assert!(!registry.is_consumed(&B256::repeat_byte(2)).await.unwrap());
	}
}
