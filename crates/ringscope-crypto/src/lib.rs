//! Crypto primitives for ringscope.
//!
//! Keccak-256 (CryptoNote variant with 0x01 padding, not SHA3), scalar and
//! point helpers over compressed Edwards bytes, and the output key
//! derivation used to recognise owned outputs.

use curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar;
use tiny_keccak::{Hasher, Keccak};

pub mod commitment;
pub mod derivation;

pub use commitment::{pedersen_commit, zero_commit};
pub use derivation::{
    check_output_key, derivation_to_scalar, derive_public_key, derive_secret_key,
    derive_view_tag, ecdh_decode_amount, generate_key_derivation,
};

/// Keccak-256, matching `cn_fast_hash`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut keccak = Keccak::v256();
    let mut output = [0u8; 32];
    keccak.update(data);
    keccak.finalize(&mut output);
    output
}

/// H_s(data) = keccak256(data) mod l
pub fn hash_to_scalar(data: &[u8]) -> [u8; 32] {
    Scalar::from_bytes_mod_order(keccak256(data)).to_bytes()
}

// ─── Scalar Operations ──────────────────────────────────────────────────────

/// Reduce 32 bytes mod l.
pub fn sc_reduce32(s: &[u8; 32]) -> [u8; 32] {
    Scalar::from_bytes_mod_order(*s).to_bytes()
}

/// True when `s` is already reduced mod l.
pub fn is_canonical_scalar(s: &[u8; 32]) -> bool {
    bool::from(Scalar::from_canonical_bytes(*s).is_some())
}

// ─── Point Operations (compressed Edwards) ──────────────────────────────────

pub(crate) fn decompress(p: &[u8; 32]) -> Option<EdwardsPoint> {
    CompressedEdwardsY(*p).decompress()
}

/// True when `p` decodes to a curve point.
pub fn is_valid_point(p: &[u8; 32]) -> bool {
    decompress(p).is_some()
}

/// Public key of a secret scalar: s·G
pub fn secret_to_public(sec_key: &[u8; 32]) -> [u8; 32] {
    let scalar = Scalar::from_bytes_mod_order(*sec_key);
    (ED25519_BASEPOINT_TABLE * &scalar).compress().to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_empty() {
        // Keccak-256 (not SHA3-256) of the empty string
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_hash_to_scalar_is_reduced() {
        let h = hash_to_scalar(b"ringscope");
        assert!(is_canonical_scalar(&h));
        assert_eq!(h, sc_reduce32(&keccak256(b"ringscope")));
    }

    #[test]
    fn test_canonical_scalar() {
        assert!(is_canonical_scalar(&[0u8; 32]));
        assert!(!is_canonical_scalar(&[0xff; 32]));
        assert!(is_canonical_scalar(&sc_reduce32(&[0xff; 32])));
    }

    #[test]
    fn test_secret_to_public() {
        let mut one = [0u8; 32];
        one[0] = 1;
        // 1·G is the compressed base point
        assert_eq!(
            hex::encode(secret_to_public(&one)),
            "5866666666666666666666666666666666666666666666666666666666666666"
        );
        assert!(is_valid_point(&secret_to_public(&[7u8; 32])));
        let mut y2 = [0u8; 32];
        y2[0] = 2;
        assert!(!is_valid_point(&y2));
    }
}
