//! Storage namespaces for the ledger tables.

/// Storage namespaces for the ledger tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// `(owner, spender) -> amount`
	Allowances,
	/// Consumed authorization nonces
	Nonces,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Allowances => "allowances",
			StorageKey::Nonces => "nonces",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_namespaces_are_distinct() {
		assert_eq!(StorageKey::Allowances.as_str(), "allowances");
		assert_eq!(StorageKey::Nonces.as_str(), "nonces");
	}
}
