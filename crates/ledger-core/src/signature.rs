//! ECDSA signer recovery for typed-data digests.
//!
//! Two encodings are accepted:
//! - 65 bytes `r ‖ s ‖ v` with `v` in {27, 28}
//! - 64 bytes `r ‖ vs` (EIP-2098), where the top bit of `vs` is the y parity
//!
//! Signatures with `s` in the upper half of the curve order are rejected, so
//! every accepted signature has exactly one valid encoding.

use alloy_primitives::{Address, B256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use ledger_types::public_key_address;
use thiserror::Error;

/// Reasons a signature is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
	#[error("invalid signature length: {0}")]
	InvalidLength(usize),
	#[error("invalid signature 'v' value: {0}")]
	InvalidV(u8),
	#[error("invalid signature 's' value")]
	HighS,
	#[error("invalid signature 'r' or 's' scalar")]
	InvalidScalar,
	#[error("signer recovery failed")]
	RecoveryFailed,
	#[error("signature recovers to the zero address")]
	ZeroAddress,
}

/// Splits an encoded signature into `r ‖ s` and a recovery id.
fn decode(signature: &[u8]) -> Result<([u8; 64], RecoveryId), SignatureError> {
	let mut rs = [0u8; 64];
	let parity = match signature.len() {
		65 => {
			rs.copy_from_slice(&signature[..64]);
			match signature[64] {
				v @ (27 | 28) => v - 27,
				v => return Err(SignatureError::InvalidV(v)),
			}
		},
		64 => {
			rs.copy_from_slice(signature);
			let parity = rs[32] >> 7;
			rs[32] &= 0x7f;
			parity
		},
		len => return Err(SignatureError::InvalidLength(len)),
	};

	let recovery_id = RecoveryId::from_byte(parity).ok_or(SignatureError::InvalidV(parity))?;
	Ok((rs, recovery_id))
}

/// Recovers the address that signed `digest`.
///
/// The digest is used as-is; no message prefix is applied.
pub fn recover_signer(digest: &B256, signature: &[u8]) -> Result<Address, SignatureError> {
	let (rs, recovery_id) = decode(signature)?;

	let signature = Signature::from_slice(&rs).map_err(|_| SignatureError::InvalidScalar)?;
	if signature.normalize_s().is_some() {
		return Err(SignatureError::HighS);
	}

	let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
		.map_err(|_| SignatureError::RecoveryFailed)?;

	let address = public_key_address(&key);
	if address == Address::ZERO {
		return Err(SignatureError::ZeroAddress);
	}
	Ok(address)
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, U256};
	use k256::ecdsa::SigningKey;

	const DEV_KEY: [u8; 32] = alloy_primitives::hex!(
		"ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
	);
	const DEV_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

	/// secp256k1 group order.
	fn curve_order() -> U256 {
		U256::from_str_radix(
			"FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141",
			16,
		)
		.unwrap()
	}

	fn sign(digest: &B256) -> Vec<u8> {
		let key = SigningKey::from_slice(&DEV_KEY).unwrap();
		let (sig, recid) = key.sign_prehash_recoverable(digest.as_slice()).unwrap();
		let mut out = sig.to_bytes().to_vec();
		out.push(27 + recid.to_byte());
		out
	}

	#[test]
	fn test_recovers_signer() {
		let digest = B256::repeat_byte(0x5a);
		assert_eq!(recover_signer(&digest, &sign(&digest)).unwrap(), DEV_ADDRESS);
	}

	#[test]
	fn test_recovers_externally_produced_signature() {
		// eth_signTypedData_v4 output for the dev key over a fixed authorization.
		let digest = alloy_primitives::b256!(
			"cbcbcd632a7be754447b54bdd0544e195a194b536369abc962629da04de3ff9f"
		);
		let signature = alloy_primitives::hex!("e8edb7b94b2c59b3b3010bf98872978dc5eb3f7b012576dbe6d04d1999ede09b094f085c0bedc15f5739a39391b961e694a39bcf2b666204720c2521b7fec9b81b");

		assert_eq!(recover_signer(&digest, &signature).unwrap(), DEV_ADDRESS);
	}

	#[test]
	fn test_other_digest_recovers_other_address() {
		let digest = B256::repeat_byte(0x5a);
		let signature = sign(&digest);
		let recovered = recover_signer(&B256::repeat_byte(0x5b), &signature);
		assert_ne!(recovered.ok(), Some(DEV_ADDRESS));
	}

	#[test]
	fn test_compact_form() {
		let digest = B256::repeat_byte(0x01);
		let full = sign(&digest);

		let mut compact = full[..64].to_vec();
		if full[64] == 28 {
			compact[32] |= 0x80;
		}
		assert_eq!(recover_signer(&digest, &compact).unwrap(), DEV_ADDRESS);
	}

	#[test]
	fn test_all_zero_signature_has_invalid_v() {
		assert_eq!(
			recover_signer(&B256::ZERO, &[0u8; 65]),
			Err(SignatureError::InvalidV(0))
		);
	}

	#[test]
	fn test_v_values() {
		let digest = B256::repeat_byte(0x02);
		let mut signature = sign(&digest);
		for v in [0u8, 1, 26, 29, 255] {
			signature[64] = v;
			assert_eq!(
				recover_signer(&digest, &signature),
				Err(SignatureError::InvalidV(v))
			);
		}
	}

	#[test]
	fn test_length() {
		assert_eq!(
			recover_signer(&B256::ZERO, &[1u8; 66]),
			Err(SignatureError::InvalidLength(66))
		);
		assert_eq!(
			recover_signer(&B256::ZERO, &[]),
			Err(SignatureError::InvalidLength(0))
		);
	}

	#[test]
	fn test_zero_scalars() {
		let digest = B256::repeat_byte(0x03);
		let mut signature = sign(&digest);
		signature[..32].fill(0);
		assert_eq!(
			recover_signer(&digest, &signature),
			Err(SignatureError::InvalidScalar)
		);
	}

	#[test]
	fn test_high_s_rejected() {
		let digest = B256::repeat_byte(0x04);
		let mut signature = sign(&digest);

		// (r, n - s) with flipped parity is the malleated twin of a valid signature.
		let s = U256::from_be_slice(&signature[32..64]);
		signature[32..64].copy_from_slice(&(curve_order() - s).to_be_bytes::<32>());
		signature[64] = if signature[64] == 27 { 28 } else { 27 };

		assert_eq!(recover_signer(&digest, &signature), Err(SignatureError::HighS));
	}
}
