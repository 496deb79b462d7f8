//! Ownership verifier.
//!
//! An output at position `i` belongs to an account `(a, B)` when
//! `H_s(8·a·R || i)·G + B` equals the output key, where `R` is the shared tx
//! public key or, with per-output keys, the key at `i`.

use ringscope_crypto::{
    check_output_key, derive_view_tag, ecdh_decode_amount, generate_key_derivation,
    is_valid_point, secret_to_public,
};
use ringscope_tx::{parse_extra, EcdhInfo, Transaction};
use ringscope_types::{ParsedAddress, PublicKey, SecretKey};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OwnershipError {
    #[error("output position {position} out of range ({outputs} outputs)")]
    PositionOutOfRange { position: usize, outputs: usize },

    #[error("transaction has no tx public key")]
    MissingTxPublicKey,

    #[error("tx public key is not a valid point")]
    InvalidTxPublicKey,

    #[error("spend public key is not a valid point")]
    InvalidSpendKey,
}

/// Keys needed to recognise an account's outputs.
#[derive(Debug, Clone)]
pub struct Account {
    pub view_secret_key: SecretKey,
    pub spend_public_key: PublicKey,
    pub address: Option<ParsedAddress>,
}

impl Account {
    pub fn from_address(view_secret_key: SecretKey, address: ParsedAddress) -> Self {
        Self {
            view_secret_key,
            spend_public_key: address.spend_public_key,
            address: Some(address),
        }
    }

    /// Whether `a·G` equals the address view key.
    ///
    /// `None` for subaddresses (their view key is derived, not `a·G`) and
    /// when no address is attached.
    pub fn view_key_matches_address(&self) -> Option<bool> {
        let address = self.address.as_ref().filter(|a| !a.is_subaddress())?;
        Some(secret_to_public(&self.view_secret_key) == address.view_public_key)
    }

    pub fn is_owned(&self, position: usize, tx: &Transaction) -> Result<bool, OwnershipError> {
        is_owned(position, tx, &self.view_secret_key, &self.spend_public_key)
    }
}

/// Key derivations to try for the output at `position`.
fn derivations(
    position: usize,
    tx: &Transaction,
    view_key: &SecretKey,
) -> Result<Vec<[u8; 32]>, OwnershipError> {
    let extra = parse_extra(&tx.prefix.extra);
    let mut tx_keys = Vec::with_capacity(2);
    if let Some(r) = extra.tx_public_key() {
        tx_keys.push(r);
    }
    if let Some(r) = extra.additional_public_keys().get(position) {
        tx_keys.push(*r);
    }
    if tx_keys.is_empty() {
        return Err(OwnershipError::MissingTxPublicKey);
    }

    let derived: Vec<[u8; 32]> = tx_keys
        .iter()
        .filter_map(|r| generate_key_derivation(r, view_key))
        .collect();
    if derived.is_empty() {
        return Err(OwnershipError::InvalidTxPublicKey);
    }
    Ok(derived)
}

/// Derivation under which the output at `position` is owned, if any.
fn owning_derivation(
    position: usize,
    tx: &Transaction,
    view_key: &SecretKey,
    spend_public_key: &PublicKey,
) -> Result<Option<[u8; 32]>, OwnershipError> {
    let output = tx
        .prefix
        .outputs
        .get(position)
        .ok_or(OwnershipError::PositionOutOfRange {
            position,
            outputs: tx.prefix.outputs.len(),
        })?;
    if !is_valid_point(spend_public_key) {
        return Err(OwnershipError::InvalidSpendKey);
    }

    let index = position as u64;
    for derivation in derivations(position, tx, view_key)? {
        if let Some(tag) = output.view_tag() {
            if derive_view_tag(&derivation, index) != tag {
                continue;
            }
        }
        if check_output_key(&derivation, index, spend_public_key, output.key()) == Some(true) {
            return Ok(Some(derivation));
        }
    }
    Ok(None)
}

/// Decide whether the output at `position` of `tx` belongs to the account
/// with private view key `view_key` and public spend key `spend_public_key`.
///
/// `Err` means the question could not be evaluated.
pub fn is_owned(
    position: usize,
    tx: &Transaction,
    view_key: &SecretKey,
    spend_public_key: &PublicKey,
) -> Result<bool, OwnershipError> {
    Ok(owning_derivation(position, tx, view_key, spend_public_key)?.is_some())
}

/// Amount of an owned output: the clear amount for pre-RingCT outputs, the
/// decrypted 8-byte ECDH amount for later ones.
pub fn owned_amount(position: usize, tx: &Transaction, account: &Account) -> Option<u64> {
    let derivation =
        owning_derivation(position, tx, &account.view_secret_key, &account.spend_public_key)
            .ok()??;
    match tx.rct() {
        None => tx.prefix.outputs.get(position).map(|o| o.amount()),
        Some(rct) if rct.rct_type == ringscope_tx::rct_type::NULL => {
            tx.prefix.outputs.get(position).map(|o| o.amount())
        }
        Some(rct) => match rct.ecdh_info.get(position)? {
            EcdhInfo::Compact { amount } => {
                Some(ecdh_decode_amount(amount, &derivation, position as u64))
            }
            EcdhInfo::Full { .. } => None,
        },
    }
}
