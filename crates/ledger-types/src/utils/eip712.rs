//! EIP-712 utilities shared across the ledger.
//!
//! These helpers provide:
//! - The canonical type strings signers and the ledger must agree on
//! - Domain separator computation
//! - Final digest computation (0x1901 || domainSeparator || structHash)
//! - A minimal ABI encoder for the static field types used by authorizations

use alloy_primitives::{keccak256, Address, B256, U256};

/// Type string of the EIP-712 domain, including the `version` member.
pub const DOMAIN_TYPE: &str =
	"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Type string of the signed approval authorization.
///
/// Field order and type tags are part of the wire format. Offline signing tools
/// must reproduce this string byte for byte or recovery yields a different signer.
pub const APPROVE_WITH_AUTHORIZATION_TYPE: &str = "ApproveWithAuthorization(address owner,address spender,uint256 value,uint256 deadline,bytes32 nonce,uint256 currentApproval)";

/// keccak256 of [`DOMAIN_TYPE`].
pub fn domain_type_hash() -> B256 {
	keccak256(DOMAIN_TYPE.as_bytes())
}

/// keccak256 of [`APPROVE_WITH_AUTHORIZATION_TYPE`].
pub fn approve_with_authorization_type_hash() -> B256 {
	keccak256(APPROVE_WITH_AUTHORIZATION_TYPE.as_bytes())
}

/// Compute the EIP-712 domain separator:
/// keccak256(abi.encode(typeHash, keccak256(name), keccak256(version), chainId, verifyingContract)).
pub fn compute_domain_hash(
	name: &str,
	version: &str,
	chain_id: u64,
	verifying_contract: &Address,
) -> B256 {
	let mut enc = Eip712AbiEncoder::new();
	enc.push_b256(&domain_type_hash());
	enc.push_string(name);
	enc.push_string(version);
	enc.push_u256(U256::from(chain_id));
	enc.push_address(verifying_contract);
	keccak256(enc.finish())
}

/// Compute the final EIP-712 digest: keccak256(0x1901 || domainHash || structHash).
pub fn compute_final_digest(domain_hash: &B256, struct_hash: &B256) -> B256 {
	let mut out = Vec::with_capacity(2 + 32 + 32);
	out.push(0x19);
	out.push(0x01);
	out.extend_from_slice(domain_hash.as_slice());
	out.extend_from_slice(struct_hash.as_slice());
	keccak256(out)
}

/// Minimal ABI encoder for static types used in EIP-712 struct hashing.
///
/// Every push appends exactly one 32-byte word.
pub struct Eip712AbiEncoder {
	buf: Vec<u8>,
}

impl Default for Eip712AbiEncoder {
	fn default() -> Self {
		Self::new()
	}
}

impl Eip712AbiEncoder {
	pub fn new() -> Self {
		Self {
			buf: Vec::with_capacity(7 * 32),
		}
	}

	pub fn push_b256(&mut self, v: &B256) {
		self.buf.extend_from_slice(v.as_slice());
	}

	pub fn push_address(&mut self, addr: &Address) {
		let mut word = [0u8; 32];
		word[12..].copy_from_slice(addr.as_slice());
		self.buf.extend_from_slice(&word);
	}

	pub fn push_u256(&mut self, v: U256) {
		let word: [u8; 32] = v.to_be_bytes::<32>();
		self.buf.extend_from_slice(&word);
	}

	/// Dynamic `string` members are encoded as the keccak256 of their UTF-8 bytes.
	pub fn push_string(&mut self, s: &str) {
		self.push_b256(&keccak256(s.as_bytes()));
	}

	pub fn finish(self) -> Vec<u8> {
		self.buf
	}
}
