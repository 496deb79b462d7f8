//! Network constants, address prefixes and amount helpers.
//!
//! Values follow the CryptoNote reference chain (cryptonote_config.h).

use serde::Serialize;

// =============================================================================
// Network Types
// =============================================================================

/// Network type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Stagenet,
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(network_config(*self).name)
    }
}

/// Address type within a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    Standard,
    Integrated,
    Subaddress,
}

// =============================================================================
// Address Prefixes
// =============================================================================

/// Varint address tag and what it identifies.
#[derive(Debug, Clone, Copy)]
pub struct PrefixInfo {
    pub prefix: u64,
    pub network: Network,
    pub address_type: AddressType,
}

/// All 9 address tags (3 networks x 3 types).
pub static ALL_PREFIXES: [PrefixInfo; 9] = [
    PrefixInfo { prefix: 18, network: Network::Mainnet,  address_type: AddressType::Standard },
    PrefixInfo { prefix: 19, network: Network::Mainnet,  address_type: AddressType::Integrated },
    PrefixInfo { prefix: 42, network: Network::Mainnet,  address_type: AddressType::Subaddress },
    PrefixInfo { prefix: 53, network: Network::Testnet,  address_type: AddressType::Standard },
    PrefixInfo { prefix: 54, network: Network::Testnet,  address_type: AddressType::Integrated },
    PrefixInfo { prefix: 63, network: Network::Testnet,  address_type: AddressType::Subaddress },
    PrefixInfo { prefix: 24, network: Network::Stagenet, address_type: AddressType::Standard },
    PrefixInfo { prefix: 25, network: Network::Stagenet, address_type: AddressType::Integrated },
    PrefixInfo { prefix: 36, network: Network::Stagenet, address_type: AddressType::Subaddress },
];

/// Look up prefix info by varint tag.
pub fn prefix_info(prefix: u64) -> Option<&'static PrefixInfo> {
    ALL_PREFIXES.iter().find(|p| p.prefix == prefix)
}

/// Tag for a network/type combination.
pub fn get_prefix(network: Network, addr_type: AddressType) -> u64 {
    let config = network_config(network);
    match addr_type {
        AddressType::Standard => config.address_prefix,
        AddressType::Integrated => config.integrated_address_prefix,
        AddressType::Subaddress => config.subaddress_prefix,
    }
}

// =============================================================================
// Key and Data Sizes
// =============================================================================

/// Size of a public/private key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the address checksum in bytes.
pub const CHECKSUM_SIZE: usize = 4;

/// Size of the payment ID carried by integrated addresses.
pub const PAYMENT_ID_SIZE: usize = 8;

/// Address payload size (without tag and checksum).
pub fn address_data_size(addr_type: AddressType) -> usize {
    match addr_type {
        AddressType::Standard   => KEY_SIZE * 2,
        AddressType::Integrated => KEY_SIZE * 2 + PAYMENT_ID_SIZE,
        AddressType::Subaddress => KEY_SIZE * 2,
    }
}

// =============================================================================
// Network Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub network: Network,
    pub name: &'static str,
    pub address_prefix: u64,
    pub integrated_address_prefix: u64,
    pub subaddress_prefix: u64,
    /// Timestamp of the first mined block. Only used when the ledger cannot
    /// supply one (the genesis header itself carries timestamp 0).
    pub genesis_timestamp: Option<u64>,
    /// Sub-directory of the data dir holding this network's ledger.
    pub data_subdir: Option<&'static str>,
}

pub static MAINNET_CONFIG: NetworkConfig = NetworkConfig {
    network: Network::Mainnet,
    name: "mainnet",
    address_prefix: 18,
    integrated_address_prefix: 19,
    subaddress_prefix: 42,
    genesis_timestamp: Some(1_397_818_193),
    data_subdir: None,
};

pub static TESTNET_CONFIG: NetworkConfig = NetworkConfig {
    network: Network::Testnet,
    name: "testnet",
    address_prefix: 53,
    integrated_address_prefix: 54,
    subaddress_prefix: 63,
    genesis_timestamp: None,
    data_subdir: Some("testnet"),
};

pub static STAGENET_CONFIG: NetworkConfig = NetworkConfig {
    network: Network::Stagenet,
    name: "stagenet",
    address_prefix: 24,
    integrated_address_prefix: 25,
    subaddress_prefix: 36,
    genesis_timestamp: None,
    data_subdir: Some("stagenet"),
};

pub fn network_config(network: Network) -> &'static NetworkConfig {
    match network {
        Network::Mainnet  => &MAINNET_CONFIG,
        Network::Testnet  => &TESTNET_CONFIG,
        Network::Stagenet => &STAGENET_CONFIG,
    }
}

// =============================================================================
// Amount Helpers
// =============================================================================

/// Atomic units per coin (10^12).
pub const COIN: u64 = 1_000_000_000_000;

/// Number of decimal places for display.
pub const DISPLAY_DECIMAL_POINT: usize = 12;

/// Format an atomic amount with all 12 decimals (e.g. `1.500000000000`).
pub fn format_amount(atomic: u64) -> String {
    format!(
        "{}.{:0width$}",
        atomic / COIN,
        atomic % COIN,
        width = DISPLAY_DECIMAL_POINT
    )
}
