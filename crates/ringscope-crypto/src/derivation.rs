//! CryptoNote one-time output keys.
//!
//! Sender:   P = H_s(r·A || i)·G + B
//! Receiver: P' = H_s(8·a·R || i)·G + B, owned iff P' == P

use curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
use curve25519_dalek::scalar::Scalar;
use ringscope_types::varint::write_varint;

use crate::{decompress, hash_to_scalar, keccak256};

/// H_s(derivation || varint(index))
pub fn derivation_to_scalar(derivation: &[u8; 32], output_index: u64) -> [u8; 32] {
    let mut buf = Vec::with_capacity(32 + 10);
    buf.extend_from_slice(derivation);
    write_varint(&mut buf, output_index);
    hash_to_scalar(&buf)
}

/// Key derivation D = 8·(sec·pub). `None` when `pub_key` is not a point.
pub fn generate_key_derivation(pub_key: &[u8; 32], sec_key: &[u8; 32]) -> Option<[u8; 32]> {
    let point = decompress(pub_key)?;
    let scalar = Scalar::from_bytes_mod_order(*sec_key);
    Some((scalar * point).mul_by_cofactor().compress().to_bytes())
}

/// Derive public key: base + H_s(derivation || index)·G
pub fn derive_public_key(
    derivation: &[u8; 32],
    output_index: u64,
    base_pub: &[u8; 32],
) -> Option<[u8; 32]> {
    let base = decompress(base_pub)?;
    let scalar = Scalar::from_bytes_mod_order(derivation_to_scalar(derivation, output_index));
    Some((ED25519_BASEPOINT_TABLE * &scalar + base).compress().to_bytes())
}

/// Derive secret key: base + H_s(derivation || index) mod l
pub fn derive_secret_key(derivation: &[u8; 32], output_index: u64, base_sec: &[u8; 32]) -> [u8; 32] {
    let scalar = Scalar::from_bytes_mod_order(derivation_to_scalar(derivation, output_index));
    let base = Scalar::from_bytes_mod_order(*base_sec);
    (base + scalar).to_bytes()
}

/// View tag: keccak256("view_tag" || derivation || varint(index))[0]
pub fn derive_view_tag(derivation: &[u8; 32], output_index: u64) -> u8 {
    let salt = b"view_tag";
    let mut buf = Vec::with_capacity(salt.len() + 32 + 10);
    buf.extend_from_slice(salt);
    buf.extend_from_slice(derivation);
    write_varint(&mut buf, output_index);
    keccak256(&buf)[0]
}

/// True when `output_key` is the one-time key for `spend_pub` at
/// `output_index` under `derivation`.
pub fn check_output_key(
    derivation: &[u8; 32],
    output_index: u64,
    spend_pub: &[u8; 32],
    output_key: &[u8; 32],
) -> Option<bool> {
    derive_public_key(derivation, output_index, spend_pub).map(|candidate| candidate == *output_key)
}

/// Decode an 8-byte ECDH amount: XOR with keccak256("amount" || H_s(D || i)).
pub fn ecdh_decode_amount(encrypted: &[u8; 8], derivation: &[u8; 32], output_index: u64) -> u64 {
    let shared_secret = derivation_to_scalar(derivation, output_index);
    let mut buf = Vec::with_capacity(6 + 32);
    buf.extend_from_slice(b"amount");
    buf.extend_from_slice(&shared_secret);
    let factor = keccak256(&buf);

    let mut plain = [0u8; 8];
    for (i, byte) in plain.iter_mut().enumerate() {
        *byte = encrypted[i] ^ factor[i];
    }
    u64::from_le_bytes(plain)
}
