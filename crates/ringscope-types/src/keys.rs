//! Fixed-size hash and key types, and their hex text form.
//!
//! Keys and hashes are plain byte arrays; the aliases only name intent.

use thiserror::Error;

/// Keccak-256 hash (block or transaction id).
pub type Hash = [u8; 32];

/// Short 8-byte hash (encrypted payment id).
pub type Hash8 = [u8; 8];

/// Compressed Ed25519 point.
pub type PublicKey = [u8; 32];

/// Ed25519 scalar.
pub type SecretKey = [u8; 32];

/// Key image of a spent output.
pub type KeyImage = [u8; 32];

#[derive(Debug, Error)]
pub enum KeyParseError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

/// Parse a hex string into exactly `N` bytes.
pub fn parse_hex_array<const N: usize>(s: &str) -> Result<[u8; N], KeyParseError> {
    let bytes = hex::decode(s.trim())?;
    if bytes.len() != N {
        return Err(KeyParseError::Length {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Parse a 64-character hex transaction or block hash.
pub fn parse_hash(s: &str) -> Result<Hash, KeyParseError> {
    parse_hex_array::<32>(s)
}

/// Parse a 64-character hex secret key.
///
/// Only the length is checked here; scalar canonicity is a curve concern.
pub fn parse_secret_key(s: &str) -> Result<SecretKey, KeyParseError> {
    parse_hex_array::<32>(s)
}
