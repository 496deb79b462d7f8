//! Payment ids carried in the extra nonce.
//!
//! Nonce layout: sub-tag 0x00 + 32 bytes (plain) or sub-tag 0x01 + 8 bytes
//! (encrypted with the recipient's view key).

use ringscope_crypto::{generate_key_derivation, keccak256};
use ringscope_types::{Hash, Hash8, PublicKey, SecretKey};

use crate::extra::parse_extra;
use crate::types::Transaction;

pub const TX_EXTRA_NONCE_PAYMENT_ID: u8 = 0x00;
pub const TX_EXTRA_NONCE_ENCRYPTED_PAYMENT_ID: u8 = 0x01;

const ENCRYPTED_PAYMENT_ID_TAIL: u8 = 0x8d;

/// Payment id found in a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentId {
    None,
    Plain(Hash),
    Encrypted(Hash8),
    /// Both forms present; the transaction is malformed but still reported.
    Ambiguous { plain: Hash, encrypted: Hash8 },
}

impl PaymentId {
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn encrypted(&self) -> Option<&Hash8> {
        match self {
            Self::Encrypted(e) | Self::Ambiguous { encrypted: e, .. } => Some(e),
            _ => None,
        }
    }

    pub fn plain(&self) -> Option<&Hash> {
        match self {
            Self::Plain(p) | Self::Ambiguous { plain: p, .. } => Some(p),
            _ => None,
        }
    }
}

/// Decode the payment id from a transaction's extra field.
pub fn decode(tx: &Transaction) -> PaymentId {
    decode_extra(&tx.prefix.extra)
}

/// Decode the payment id from a raw extra blob. The first id of each kind wins.
pub fn decode_extra(extra: &[u8]) -> PaymentId {
    let parsed = parse_extra(extra);
    let mut plain: Option<Hash> = None;
    let mut encrypted: Option<Hash8> = None;

    for nonce in parsed.nonces() {
        match nonce.split_first() {
            Some((&TX_EXTRA_NONCE_PAYMENT_ID, rest)) if rest.len() == 32 && plain.is_none() => {
                let mut id = [0u8; 32];
                id.copy_from_slice(rest);
                plain = Some(id);
            }
            Some((&TX_EXTRA_NONCE_ENCRYPTED_PAYMENT_ID, rest))
                if rest.len() == 8 && encrypted.is_none() =>
            {
                let mut id = [0u8; 8];
                id.copy_from_slice(rest);
                encrypted = Some(id);
            }
            _ => {}
        }
    }

    match (plain, encrypted) {
        (Some(plain), Some(encrypted)) => PaymentId::Ambiguous { plain, encrypted },
        (Some(p), None) => PaymentId::Plain(p),
        (None, Some(e)) => PaymentId::Encrypted(e),
        (None, None) => PaymentId::None,
    }
}

/// XOR an 8-byte id with keccak256(8·(sec·pub) || 0x8d). Encrypts and decrypts.
///
/// The receiver passes the tx public key and its private view key.
pub fn decrypt_payment_id(
    id: &Hash8,
    tx_public_key: &PublicKey,
    view_secret_key: &SecretKey,
) -> Option<Hash8> {
    let derivation = generate_key_derivation(tx_public_key, view_secret_key)?;
    let mut data = [0u8; 33];
    data[..32].copy_from_slice(&derivation);
    data[32] = ENCRYPTED_PAYMENT_ID_TAIL;
    let mask = keccak256(&data);

    let mut out = *id;
    for (b, m) in out.iter_mut().zip(mask.iter()) {
        *b ^= m;
    }
    Some(out)
}

/// Build the nonce payload for a plain payment id.
pub fn plain_nonce(id: &Hash) -> Vec<u8> {
    let mut nonce = Vec::with_capacity(33);
    nonce.push(TX_EXTRA_NONCE_PAYMENT_ID);
    nonce.extend_from_slice(id);
    nonce
}

/// Build the nonce payload for an encrypted payment id.
pub fn encrypted_nonce(id: &Hash8) -> Vec<u8> {
    let mut nonce = Vec::with_capacity(9);
    nonce.push(TX_EXTRA_NONCE_ENCRYPTED_PAYMENT_ID);
    nonce.extend_from_slice(id);
    nonce
}
