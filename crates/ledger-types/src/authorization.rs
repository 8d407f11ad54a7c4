//! Signed approval authorization types.
//!
//! An [`ApprovalRequest`] is built off-chain by the owner, signed with EIP-712
//! typed data and handed to any relayer for submission. This module also holds
//! the typed-data hashing that turns a request into the digest being signed.

use crate::{
	api::u256_serde,
	utils::eip712::{approve_with_authorization_type_hash, compute_final_digest, Eip712AbiEncoder},
	DomainDescriptor,
};
use alloy_primitives::{keccak256, Address, B256, U256};
use serde::{Deserialize, Serialize};

/// The signed message authorizing `spender` to move up to `value` of `owner`'s tokens.
///
/// `current_approval` is a compare-and-set guard: the request only applies while the
/// stored allowance still equals the value the owner saw when signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
	/// Account granting the allowance; must be the recovered signer.
	pub owner: Address,
	/// Account receiving the allowance.
	pub spender: Address,
	/// New allowance value.
	#[serde(with = "u256_serde")]
	pub value: U256,
	/// Last second (inclusive, unix time) at which the request may be applied.
	#[serde(with = "u256_serde")]
	pub deadline: U256,
	/// Random one-time token chosen by the signer.
	pub nonce: B256,
	/// Allowance value the signer expects to replace.
	#[serde(with = "u256_serde")]
	pub current_approval: U256,
}

impl ApprovalRequest {
	/// Computes `hashStruct(ApproveWithAuthorization)`.
	pub fn struct_hash(&self) -> B256 {
		let mut enc = Eip712AbiEncoder::new();
		enc.push_b256(&approve_with_authorization_type_hash());
		enc.push_address(&self.owner);
		enc.push_address(&self.spender);
		enc.push_u256(self.value);
		enc.push_u256(self.deadline);
		enc.push_b256(&self.nonce);
		enc.push_u256(self.current_approval);
		keccak256(enc.finish())
	}

	/// Computes the EIP-712 digest the owner signs for the given domain.
	pub fn signing_digest(&self, domain: &DomainDescriptor) -> B256 {
		compute_final_digest(&domain.separator(), &self.struct_hash())
	}

	/// Returns true when `now` (unix seconds) is past the deadline.
	///
	/// A request whose deadline equals `now` is still valid.
	pub fn is_expired_at(&self, now: u64) -> bool {
		U256::from(now) > self.deadline
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::utils::eip712::APPROVE_WITH_AUTHORIZATION_TYPE;
	use alloy_primitives::{address, b256};

	fn domain() -> DomainDescriptor {
		DomainDescriptor::new(
			"GiddyToken",
			"1.0",
			31337,
			address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
		)
	}

	fn request() -> ApprovalRequest {
		ApprovalRequest {
			owner: address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
			spender: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
			value: U256::from(100_000_000_000u64),
			deadline: U256::from(1_700_000_500u64),
			nonce: keccak256(b"nonce-1"),
			current_approval: U256::ZERO,
		}
	}

	#[test]
	fn test_struct_hash_matches_manual_encoding() {
		let req = request();

		// Assemble abi.encode by hand so a reordered or retyped field is caught.
		let mut raw = Vec::new();
		raw.extend_from_slice(keccak256(APPROVE_WITH_AUTHORIZATION_TYPE).as_slice());
		raw.extend_from_slice(&[0u8; 12]);
		raw.extend_from_slice(req.owner.as_slice());
		raw.extend_from_slice(&[0u8; 12]);
		raw.extend_from_slice(req.spender.as_slice());
		raw.extend_from_slice(&req.value.to_be_bytes::<32>());
		raw.extend_from_slice(&req.deadline.to_be_bytes::<32>());
		raw.extend_from_slice(req.nonce.as_slice());
		raw.extend_from_slice(&req.current_approval.to_be_bytes::<32>());

		assert_eq!(raw.len(), 7 * 32);
		assert_eq!(req.struct_hash(), keccak256(raw));
	}

	#[test]
	fn test_known_typed_data_vector() {
		// eth_signTypedData_v4 hashes for a fixed request under the dev domain.
		let req = ApprovalRequest {
			nonce: B256::repeat_byte(0x01),
			..request()
		};

		assert_eq!(
			domain().separator(),
			b256!("345c6f234a52e23cc56db1ac593af5eb9be5a93e6951b5d2e44082b253d09292")
		);
		assert_eq!(
			req.struct_hash(),
			b256!("c976b641491db453634ddd56b9951f43521921fa3e7488e5df16e23c27d44f42")
		);
		assert_eq!(
			req.signing_digest(&domain()),
			b256!("cbcbcd632a7be754447b54bdd0544e195a194b536369abc962629da04de3ff9f")
		);
	}

	#[test]
	fn test_type_string_mismatch_changes_digest() {
		let req = request();
		// A signer that forgot the currentApproval member.
		let truncated = "ApproveWithAuthorization(address owner,address spender,uint256 value,uint256 deadline,bytes32 nonce)";
		let mut enc = Eip712AbiEncoder::new();
		enc.push_b256(&keccak256(truncated));
		enc.push_address(&req.owner);
		enc.push_address(&req.spender);
		enc.push_u256(req.value);
		enc.push_u256(req.deadline);
		enc.push_b256(&req.nonce);
		enc.push_u256(req.current_approval);

		assert_ne!(keccak256(enc.finish()), req.struct_hash());
	}

	#[test]
	fn test_every_field_changes_digest() {
		let base = request();
		let d = domain();
		let digest = base.signing_digest(&d);

		let variants = vec![
			ApprovalRequest {
				owner: address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
				..base.clone()
			},
			ApprovalRequest {
				spender: address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
				..base.clone()
			},
			ApprovalRequest {
				value: base.value + U256::from(1),
				..base.clone()
			},
			ApprovalRequest {
				deadline: base.deadline + U256::from(1),
				..base.clone()
			},
			ApprovalRequest {
				nonce: keccak256(b"nonce-2"),
				..base.clone()
			},
			ApprovalRequest {
				current_approval: U256::from(10),
				..base.clone()
			},
		];

		for variant in variants {
			assert_ne!(variant.signing_digest(&d), digest, "{:?}", variant);
		}
	}

	#[test]
	fn test_deadline_boundary_is_inclusive() {
		let req = request();
		assert!(!req.is_expired_at(1_700_000_499));
		assert!(!req.is_expired_at(1_700_000_500));
		assert!(req.is_expired_at(1_700_000_501));
	}

	#[test]
	fn test_json_shape_uses_decimal_amounts() {
		let json = serde_json::to_value(request()).unwrap();
		assert_eq!(json["value"], "100000000000");
		assert_eq!(json["currentApproval"], "0");
		assert_eq!(json["deadline"], "1700000500");

		let parsed: ApprovalRequest = serde_json::from_value(json).unwrap();
		assert_eq!(parsed, request());
	}
}
