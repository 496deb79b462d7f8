//! CryptoNote transaction handling for ringscope.
//!
//! Typed transactions with a binary parser and serializer, the tx extra
//! field, payment-id decoding and ring offset conversion.

pub mod extra;
pub mod offsets;
pub mod parse;
pub mod payment_id;
pub mod serialize;
pub mod types;

pub use extra::{parse_extra, ExtraField, TxExtra};
pub use offsets::{absolute_to_relative, relative_to_absolute, OffsetError};
pub use parse::{parse_transaction, parse_transaction_hex};
pub use payment_id::PaymentId;
pub use serialize::serialize_transaction;
pub use types::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxError {
    #[error("unexpected end of data at offset {offset} (need {need} bytes, have {have})")]
    UnexpectedEof {
        offset: usize,
        need: usize,
        have: usize,
    },

    #[error("varint decode failed at offset {0}")]
    BadVarint(usize),

    #[error("unsupported transaction version {0}")]
    UnsupportedVersion(u64),

    #[error("unsupported input type 0x{tag:02x} at offset {offset}")]
    UnsupportedInput { tag: u8, offset: usize },

    #[error("unsupported output type 0x{tag:02x} at offset {offset}")]
    UnsupportedOutput { tag: u8, offset: usize },

    #[error("invalid RingCT type {0}")]
    InvalidRctType(u8),

    #[error("{what} count {count} at offset {offset} exceeds the remaining data")]
    CountTooLarge {
        what: &'static str,
        count: u64,
        offset: usize,
    },

    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),

    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}
