//! Core types and constants for ringscope.
//!
//! Network configuration, address prefixes, CryptoNote Base58 address
//! encoding, varints and the hex text form of hashes and keys.

pub mod address;
pub mod base58;
pub mod constants;
pub mod keys;
pub mod varint;

pub use address::{parse_address, parse_address_for, AddressError, ParsedAddress};
pub use constants::{format_amount, network_config, AddressType, Network, NetworkConfig};
pub use keys::{Hash, Hash8, KeyImage, KeyParseError, PublicKey, SecretKey};
