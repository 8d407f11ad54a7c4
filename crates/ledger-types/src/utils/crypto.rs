//! secp256k1 key helpers shared by the signer and the verifier.

use alloy_primitives::{keccak256, Address};
use k256::ecdsa::VerifyingKey;

/// Derives the Ethereum address of a public key: the last 20 bytes of the
/// keccak256 hash of the uncompressed point without its `0x04` tag.
pub fn public_key_address(key: &VerifyingKey) -> Address {
	let point = key.to_encoded_point(false);
	let hash = keccak256(&point.as_bytes()[1..]);
	Address::from_slice(&hash[12..])
}
