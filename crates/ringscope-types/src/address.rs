//! Account address parsing and creation.
//!
//! Supports 9 address kinds: 3 networks x {standard, integrated, subaddress}.

use crate::base58;
use crate::constants::{
    address_data_size, get_prefix, prefix_info, AddressType, Network, KEY_SIZE, PAYMENT_ID_SIZE,
};
use crate::keys::PublicKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("address must be a non-empty string")]
    Empty,

    #[error("base58 decode error: {0}")]
    Base58(#[from] base58::Base58Error),

    #[error("unknown address prefix: {0}")]
    UnknownPrefix(u64),

    #[error("invalid data length: expected {expected} bytes, got {actual}")]
    InvalidDataLength { expected: usize, actual: usize },

    #[error("address is for {found}, expected {expected}")]
    WrongNetwork { expected: Network, found: Network },

    #[error("paymentId is required for integrated addresses")]
    MissingPaymentId,
}

/// Result of parsing an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub network: Network,
    pub address_type: AddressType,
    pub spend_public_key: PublicKey,
    pub view_public_key: PublicKey,
    pub payment_id: Option<[u8; PAYMENT_ID_SIZE]>,
}

impl ParsedAddress {
    pub fn is_subaddress(&self) -> bool {
        self.address_type == AddressType::Subaddress
    }

    /// Re-encode to the Base58 text form.
    pub fn to_address_string(&self) -> String {
        let mut data = Vec::with_capacity(address_data_size(self.address_type));
        data.extend_from_slice(&self.spend_public_key);
        data.extend_from_slice(&self.view_public_key);
        if let Some(pid) = &self.payment_id {
            data.extend_from_slice(pid);
        }
        base58::encode_address(get_prefix(self.network, self.address_type), &data)
    }
}

impl std::fmt::Display for ParsedAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_address_string())
    }
}

/// Parse and validate an address of any network.
pub fn parse_address(address: &str) -> Result<ParsedAddress, AddressError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AddressError::Empty);
    }

    let (tag, data) = base58::decode_address(address)?;
    let info = prefix_info(tag).ok_or(AddressError::UnknownPrefix(tag))?;

    let expected = address_data_size(info.address_type);
    if data.len() != expected {
        return Err(AddressError::InvalidDataLength {
            expected,
            actual: data.len(),
        });
    }

    let mut spend_public_key = [0u8; KEY_SIZE];
    spend_public_key.copy_from_slice(&data[..KEY_SIZE]);
    let mut view_public_key = [0u8; KEY_SIZE];
    view_public_key.copy_from_slice(&data[KEY_SIZE..KEY_SIZE * 2]);

    let payment_id = (info.address_type == AddressType::Integrated).then(|| {
        let mut pid = [0u8; PAYMENT_ID_SIZE];
        pid.copy_from_slice(&data[KEY_SIZE * 2..]);
        pid
    });

    Ok(ParsedAddress {
        network: info.network,
        address_type: info.address_type,
        spend_public_key,
        view_public_key,
        payment_id,
    })
}

/// Parse an address and require it to belong to `network`.
pub fn parse_address_for(address: &str, network: Network) -> Result<ParsedAddress, AddressError> {
    let parsed = parse_address(address)?;
    if parsed.network != network {
        return Err(AddressError::WrongNetwork {
            expected: network,
            found: parsed.network,
        });
    }
    Ok(parsed)
}

/// Build an address string from its components.
pub fn create_address(
    network: Network,
    address_type: AddressType,
    spend_public_key: &PublicKey,
    view_public_key: &PublicKey,
    payment_id: Option<&[u8; PAYMENT_ID_SIZE]>,
) -> Result<String, AddressError> {
    if address_type == AddressType::Integrated && payment_id.is_none() {
        return Err(AddressError::MissingPaymentId);
    }
    let parsed = ParsedAddress {
        network,
        address_type,
        spend_public_key: *spend_public_key,
        view_public_key: *view_public_key,
        payment_id: payment_id.filter(|_| address_type == AddressType::Integrated).copied(),
    };
    Ok(parsed.to_address_string())
}
