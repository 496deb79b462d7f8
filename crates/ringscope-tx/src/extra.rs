//! Transaction extra field.
//!
//! Tags:
//! - 0x00 padding (run of zero bytes)
//! - 0x01 tx public key (32 bytes)
//! - 0x02 nonce (1-byte size + data), carries payment ids
//! - 0x03 merge mining (varint size + data)
//! - 0x04 additional public keys (varint count + 32 bytes each)
//! - 0xDE minergate (varint size + data)
//!
//! Anything else is read as varint size + data. Parsing is lenient: a
//! truncated field stops the walk and the fields read so far are kept.

use ringscope_types::varint::{read_varint, write_varint};
use ringscope_types::PublicKey;

pub const TX_EXTRA_TAG_PADDING: u8 = 0x00;
pub const TX_EXTRA_TAG_PUBKEY: u8 = 0x01;
pub const TX_EXTRA_NONCE: u8 = 0x02;
pub const TX_EXTRA_MERGE_MINING_TAG: u8 = 0x03;
pub const TX_EXTRA_TAG_ADDITIONAL_PUBKEYS: u8 = 0x04;
pub const TX_EXTRA_MYSTERIOUS_MINERGATE_TAG: u8 = 0xde;

pub const TX_EXTRA_NONCE_MAX_COUNT: usize = 255;

/// One field of the extra blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraField {
    /// Number of padding bytes, tag included.
    Padding(usize),
    TxPublicKey(PublicKey),
    Nonce(Vec<u8>),
    MergeMining(Vec<u8>),
    AdditionalPublicKeys(Vec<PublicKey>),
    MinerGate(Vec<u8>),
    Unknown { tag: u8, data: Vec<u8> },
}

/// Parsed extra blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxExtra {
    pub fields: Vec<ExtraField>,
    /// False when a field was cut short and parsing stopped early.
    pub complete: bool,
}

impl TxExtra {
    /// First tx public key (tag 0x01).
    pub fn tx_public_key(&self) -> Option<PublicKey> {
        self.fields.iter().find_map(|f| match f {
            ExtraField::TxPublicKey(k) => Some(*k),
            _ => None,
        })
    }

    /// Per-output public keys (tag 0x04), empty if absent.
    pub fn additional_public_keys(&self) -> Vec<PublicKey> {
        self.fields
            .iter()
            .find_map(|f| match f {
                ExtraField::AdditionalPublicKeys(keys) => Some(keys.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// All nonce payloads, in order.
    pub fn nonces(&self) -> impl Iterator<Item = &[u8]> {
        self.fields.iter().filter_map(|f| match f {
            ExtraField::Nonce(n) => Some(n.as_slice()),
            _ => None,
        })
    }
}

fn read_sized(extra: &[u8], offset: &mut usize) -> Option<Vec<u8>> {
    let (size, used) = read_varint(&extra[*offset..])?;
    let start = *offset + used;
    let size = usize::try_from(size).ok()?;
    let end = start.checked_add(size)?;
    if end > extra.len() {
        return None;
    }
    *offset = end;
    Some(extra[start..end].to_vec())
}

/// Parse an extra blob into its fields.
pub fn parse_extra(extra: &[u8]) -> TxExtra {
    let mut fields = Vec::new();
    let mut offset = 0;

    while offset < extra.len() {
        let tag = extra[offset];
        offset += 1;

        let field = match tag {
            TX_EXTRA_TAG_PADDING => {
                let start = offset - 1;
                while offset < extra.len() && extra[offset] == 0 {
                    offset += 1;
                }
                Some(ExtraField::Padding(offset - start))
            }
            TX_EXTRA_TAG_PUBKEY => extra.get(offset..offset + 32).map(|bytes| {
                let mut key = [0u8; 32];
                key.copy_from_slice(bytes);
                offset += 32;
                ExtraField::TxPublicKey(key)
            }),
            TX_EXTRA_NONCE => extra.get(offset).copied().and_then(|size| {
                let start = offset + 1;
                let end = start + size as usize;
                let nonce = extra.get(start..end)?.to_vec();
                offset = end;
                Some(ExtraField::Nonce(nonce))
            }),
            TX_EXTRA_MERGE_MINING_TAG => read_sized(extra, &mut offset).map(ExtraField::MergeMining),
            TX_EXTRA_TAG_ADDITIONAL_PUBKEYS => read_varint(&extra[offset..]).and_then(|(count, used)| {
                let start = offset + used;
                let len = usize::try_from(count).ok()?.checked_mul(32)?;
                let end = start.checked_add(len)?;
                let keys = extra
                    .get(start..end)?
                    .chunks_exact(32)
                    .map(|c| {
                        let mut k = [0u8; 32];
                        k.copy_from_slice(c);
                        k
                    })
                    .collect();
                offset = end;
                Some(ExtraField::AdditionalPublicKeys(keys))
            }),
            TX_EXTRA_MYSTERIOUS_MINERGATE_TAG => read_sized(extra, &mut offset).map(ExtraField::MinerGate),
            _ => read_sized(extra, &mut offset).map(|data| ExtraField::Unknown { tag, data }),
        };

        match field {
            Some(f) => fields.push(f),
            None => return TxExtra { fields, complete: false },
        }
    }

    TxExtra { fields, complete: true }
}

/// Serialize fields back into an extra blob.
pub fn write_extra(fields: &[ExtraField]) -> Vec<u8> {
    let mut buf = Vec::new();
    for field in fields {
        match field {
            ExtraField::Padding(n) => buf.resize(buf.len() + n, 0),
            ExtraField::TxPublicKey(k) => {
                buf.push(TX_EXTRA_TAG_PUBKEY);
                buf.extend_from_slice(k);
            }
            ExtraField::Nonce(n) => {
                buf.push(TX_EXTRA_NONCE);
                let n = &n[..n.len().min(TX_EXTRA_NONCE_MAX_COUNT)];
                buf.push(n.len() as u8);
                buf.extend_from_slice(n);
            }
            ExtraField::MergeMining(d) => {
                buf.push(TX_EXTRA_MERGE_MINING_TAG);
                write_varint(&mut buf, d.len() as u64);
                buf.extend_from_slice(d);
            }
            ExtraField::AdditionalPublicKeys(keys) => {
                buf.push(TX_EXTRA_TAG_ADDITIONAL_PUBKEYS);
                write_varint(&mut buf, keys.len() as u64);
                for k in keys {
                    buf.extend_from_slice(k);
                }
            }
            ExtraField::MinerGate(d) => {
                buf.push(TX_EXTRA_MYSTERIOUS_MINERGATE_TAG);
                write_varint(&mut buf, d.len() as u64);
                buf.extend_from_slice(d);
            }
            ExtraField::Unknown { tag, data } => {
                buf.push(*tag);
                write_varint(&mut buf, data.len() as u64);
                buf.extend_from_slice(data);
            }
        }
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pubkey_and_nonce() {
        let mut extra = vec![TX_EXTRA_TAG_PUBKEY];
        extra.extend_from_slice(&[0xab; 32]);
        extra.extend_from_slice(&[TX_EXTRA_NONCE, 9, 0x01, 1, 2, 3, 4, 5, 6, 7, 8]);

        let parsed = parse_extra(&extra);
        assert!(parsed.complete);
        assert_eq!(parsed.tx_public_key(), Some([0xab; 32]));
        let nonces: Vec<&[u8]> = parsed.nonces().collect();
        assert_eq!(nonces, vec![&[0x01, 1, 2, 3, 4, 5, 6, 7, 8][..]]);
    }

    #[test]
    fn test_additional_keys_and_padding() {
        let fields = vec![
            ExtraField::TxPublicKey([1; 32]),
            ExtraField::AdditionalPublicKeys(vec![[2; 32], [3; 32]]),
            ExtraField::MergeMining(vec![0x00, 0x11]),
            ExtraField::Padding(4),
        ];
        let parsed = parse_extra(&write_extra(&fields));
        assert!(parsed.complete);
        assert_eq!(parsed.fields, fields);
        assert_eq!(parsed.additional_public_keys(), vec![[2; 32], [3; 32]]);
    }

    #[test]
    fn test_unknown_tag_skipped_by_size() {
        let mut extra = vec![0x7a, 3, 9, 9, 9, TX_EXTRA_TAG_PUBKEY];
        extra.extend_from_slice(&[0x44; 32]);
        let parsed = parse_extra(&extra);
        assert!(parsed.complete);
        assert_eq!(parsed.fields[0], ExtraField::Unknown { tag: 0x7a, data: vec![9, 9, 9] });
        assert_eq!(parsed.tx_public_key(), Some([0x44; 32]));
    }

    #[test]
    fn test_truncated_keeps_prefix_fields() {
        let mut extra = vec![TX_EXTRA_TAG_PUBKEY];
        extra.extend_from_slice(&[0x55; 32]);
        extra.extend_from_slice(&[TX_EXTRA_NONCE, 33, 0x00, 1, 2]);
        let parsed = parse_extra(&extra);
        assert!(!parsed.complete);
        assert_eq!(parsed.fields.len(), 1);
        assert_eq!(parsed.tx_public_key(), Some([0x55; 32]));
    }

    #[test]
    fn test_empty_and_absent() {
        let parsed = parse_extra(&[]);
        assert!(parsed.complete);
        assert!(parsed.tx_public_key().is_none());
        assert!(parsed.additional_public_keys().is_empty());
    }
}
