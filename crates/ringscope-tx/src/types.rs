//! Typed transaction structures.
//!
//! Covers the CryptoNote v1 layout (ring signatures) and the v2 RingCT
//! layout. CLSAG transactions (RingCT types 5 and 6) are decoded in full;
//! the prunable part of older RingCT types is kept as raw bytes.

use ringscope_types::{Hash, KeyImage, PublicKey};

// ─── Transaction Constants ──────────────────────────────────────────────────

pub mod input_type {
    pub const GEN: u8 = 0xff;
    pub const KEY: u8 = 0x02;
}

pub mod output_type {
    pub const KEY: u8 = 0x02;
    pub const TAGGED_KEY: u8 = 0x03;
}

pub mod rct_type {
    pub const NULL: u8 = 0;
    pub const FULL: u8 = 1;
    pub const SIMPLE: u8 = 2;
    pub const BULLETPROOF: u8 = 3;
    pub const BULLETPROOF2: u8 = 4;
    pub const CLSAG: u8 = 5;
    pub const BULLETPROOF_PLUS: u8 = 6;
}

pub fn rct_type_name(rct_type: u8) -> &'static str {
    match rct_type {
        rct_type::NULL => "Null",
        rct_type::FULL => "Full",
        rct_type::SIMPLE => "Simple",
        rct_type::BULLETPROOF => "Bulletproof",
        rct_type::BULLETPROOF2 => "Bulletproof2",
        rct_type::CLSAG => "CLSAG",
        rct_type::BULLETPROOF_PLUS => "BulletproofPlus",
        _ => "Unknown",
    }
}

// ─── Core Transaction Types ─────────────────────────────────────────────────

/// Complete transaction (prefix + signatures).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub prefix: TxPrefix,
    pub signatures: Signatures,
}

/// Transaction prefix (everything the signatures commit to).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxPrefix {
    pub version: u64,
    pub unlock_time: u64,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub extra: Vec<u8>,
}

/// Transaction input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxInput {
    /// Coinbase (generation) input.
    Gen { height: u64 },
    /// Key input spending one member of a ring.
    Key {
        amount: u64,
        /// Relative offsets: first absolute, then deltas.
        key_offsets: Vec<u64>,
        key_image: KeyImage,
    },
}

impl TxInput {
    pub fn key_image(&self) -> Option<&KeyImage> {
        match self {
            Self::Key { key_image, .. } => Some(key_image),
            Self::Gen { .. } => None,
        }
    }

    /// Number of ring members (0 for coinbase).
    pub fn ring_size(&self) -> usize {
        match self {
            Self::Key { key_offsets, .. } => key_offsets.len(),
            Self::Gen { .. } => 0,
        }
    }
}

/// Transaction output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutput {
    /// Plain one-time key output.
    Key { amount: u64, key: PublicKey },
    /// One-time key with a 1-byte view tag.
    TaggedKey {
        amount: u64,
        key: PublicKey,
        view_tag: u8,
    },
}

impl TxOutput {
    pub fn amount(&self) -> u64 {
        match self {
            Self::Key { amount, .. } | Self::TaggedKey { amount, .. } => *amount,
        }
    }

    pub fn key(&self) -> &PublicKey {
        match self {
            Self::Key { key, .. } | Self::TaggedKey { key, .. } => key,
        }
    }

    pub fn view_tag(&self) -> Option<u8> {
        match self {
            Self::TaggedKey { view_tag, .. } => Some(*view_tag),
            Self::Key { .. } => None,
        }
    }

    pub fn output_type_tag(&self) -> u8 {
        match self {
            Self::Key { .. } => output_type::KEY,
            Self::TaggedKey { .. } => output_type::TAGGED_KEY,
        }
    }
}

// ─── Signatures ─────────────────────────────────────────────────────────────

/// Signature section following the prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signatures {
    /// v1: one ring signature per input, one `(c, r)` pair per ring member.
    Ring(Vec<Vec<RingSignatureElement>>),
    /// v2: RingCT.
    RingCt(RctSignatures),
}

/// One `(c, r)` pair of a v1 ring signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingSignatureElement {
    pub c: [u8; 32],
    pub r: [u8; 32],
}

/// RingCT signature data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RctSignatures {
    pub rct_type: u8,
    pub txn_fee: u64,
    /// Only serialized in the base for `rct_type::SIMPLE`.
    pub base_pseudo_outs: Vec<[u8; 32]>,
    pub ecdh_info: Vec<EcdhInfo>,
    pub out_pk: Vec<[u8; 32]>,
    pub prunable: RctPrunable,
}

/// Encrypted amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcdhInfo {
    /// 8-byte form (Bulletproof2 and later).
    Compact { amount: [u8; 8] },
    /// Legacy mask + amount form.
    Full { mask: [u8; 32], amount: [u8; 32] },
}

/// Prunable RingCT data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RctPrunable {
    /// Nothing follows (`rct_type::NULL`).
    None,
    /// CLSAG transactions.
    Clsag {
        range_proofs: RangeProofs,
        clsags: Vec<Clsag>,
        pseudo_outs: Vec<[u8; 32]>,
    },
    /// Older types, not decoded.
    Raw(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeProofs {
    Bulletproofs(Vec<Bulletproof>),
    BulletproofsPlus(Vec<BulletproofPlus>),
}

impl RangeProofs {
    pub fn len(&self) -> usize {
        match self {
            Self::Bulletproofs(v) => v.len(),
            Self::BulletproofsPlus(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bulletproof {
    pub a: [u8; 32],
    pub s: [u8; 32],
    pub t1: [u8; 32],
    pub t2: [u8; 32],
    pub taux: [u8; 32],
    pub mu: [u8; 32],
    pub l_vec: Vec<[u8; 32]>,
    pub r_vec: Vec<[u8; 32]>,
    pub a_final: [u8; 32],
    pub b_final: [u8; 32],
    pub t: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulletproofPlus {
    pub a: [u8; 32],
    pub a1: [u8; 32],
    pub b: [u8; 32],
    pub r1: [u8; 32],
    pub s1: [u8; 32],
    pub d1: [u8; 32],
    pub l_vec: Vec<[u8; 32]>,
    pub r_vec: Vec<[u8; 32]>,
}

/// CLSAG ring signature data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clsag {
    pub s: Vec<[u8; 32]>,
    pub c1: [u8; 32],
    pub d: [u8; 32],
}

// ─── Accessors ──────────────────────────────────────────────────────────────

impl Transaction {
    pub fn version(&self) -> u64 {
        self.prefix.version
    }

    pub fn is_coinbase(&self) -> bool {
        self.prefix.inputs.iter().any(|i| matches!(i, TxInput::Gen { .. }))
    }

    pub fn key_images(&self) -> Vec<KeyImage> {
        self.prefix.inputs.iter().filter_map(|i| i.key_image().copied()).collect()
    }

    pub fn rct(&self) -> Option<&RctSignatures> {
        match &self.signatures {
            Signatures::RingCt(rct) => Some(rct),
            Signatures::Ring(_) => None,
        }
    }

    pub fn fee(&self) -> u64 {
        self.rct().map(|r| r.txn_fee).unwrap_or(0)
    }

    /// Shared tx public key (extra tag 0x01).
    pub fn tx_public_key(&self) -> Option<PublicKey> {
        crate::extra::parse_extra(&self.prefix.extra).tx_public_key()
    }

    /// Per-output tx public keys (extra tag 0x04).
    pub fn additional_public_keys(&self) -> Vec<PublicKey> {
        crate::extra::parse_extra(&self.prefix.extra).additional_public_keys()
    }

    /// Transaction id.
    pub fn hash(&self) -> Hash {
        crate::serialize::transaction_hash(self)
    }

    /// Hash of the prefix alone (the ring signature message for v1).
    pub fn prefix_hash(&self) -> Hash {
        crate::serialize::prefix_hash(&self.prefix)
    }
}
