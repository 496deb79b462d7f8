//! Read interface over the ledger.

use ringscope_tx::Transaction;
use ringscope_types::{Hash, PublicKey};

use crate::LedgerError;

/// Blocks searched past the hinted height by the default owner lookup.
pub const DEFAULT_SCAN_WINDOW: u64 = 1;

/// Block header data needed for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub height: u64,
    pub hash: Hash,
    pub timestamp: u64,
    pub miner_tx_hash: Hash,
    /// Non-coinbase transactions, in block order.
    pub tx_hashes: Vec<Hash>,
}

impl Block {
    /// Miner transaction first, then the rest.
    pub fn all_tx_hashes(&self) -> impl Iterator<Item = &Hash> {
        std::iter::once(&self.miner_tx_hash).chain(self.tx_hashes.iter())
    }
}

/// An output as indexed by `(amount, amount index)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub public_key: PublicKey,
    /// Height of the block containing the output.
    pub height: u64,
    pub unlock_time: u64,
    /// RingCT commitment; absent for pre-RingCT outputs.
    pub commitment: Option<[u8; 32]>,
}

/// Read access to an append-only ledger.
///
/// Missing data is `Ok(None)`; `Err` is reserved for store failures.
pub trait LedgerStore {
    /// Number of blocks (top height + 1).
    fn chain_height(&self) -> Result<u64, LedgerError>;

    fn block_by_height(&self, height: u64) -> Result<Option<Block>, LedgerError>;

    fn tx_by_hash(&self, hash: &Hash) -> Result<Option<Transaction>, LedgerError>;

    fn tx_block_height(&self, hash: &Hash) -> Result<Option<u64>, LedgerError>;

    /// Output `index` among all outputs of denomination `amount`
    /// (0 for RingCT outputs).
    fn output_by_index(&self, amount: u64, index: u64) -> Result<Option<OutputRecord>, LedgerError>;

    /// Per-denomination index of each output of a transaction, in output order.
    fn tx_output_indices(&self, hash: &Hash) -> Result<Option<Vec<u64>>, LedgerError>;

    /// Blocks past `approx_height` searched by `find_tx_by_output_key`.
    fn scan_window(&self) -> u64 {
        DEFAULT_SCAN_WINDOW
    }

    /// Find the transaction that created `output_key`.
    ///
    /// The default walks blocks `approx_height ..= approx_height + scan_window()`
    /// (bounded by the chain) and checks every transaction's outputs.
    fn find_tx_by_output_key(
        &self,
        output_key: &PublicKey,
        approx_height: u64,
    ) -> Result<Option<(Hash, Transaction)>, LedgerError> {
        scan_blocks_for_output(self, output_key, approx_height, self.scan_window())
    }

    /// Timestamp of the first block, falling back to block 1 when the
    /// genesis header carries 0.
    fn genesis_timestamp(&self) -> Result<Option<u64>, LedgerError> {
        for height in 0..2 {
            if let Some(block) = self.block_by_height(height)? {
                if block.timestamp != 0 {
                    return Ok(Some(block.timestamp));
                }
            }
        }
        Ok(None)
    }
}

/// Walk blocks `approx_height ..= approx_height + window` looking for the
/// transaction with an output keyed `output_key`.
pub fn scan_blocks_for_output<S: LedgerStore + ?Sized>(
    store: &S,
    output_key: &PublicKey,
    approx_height: u64,
    window: u64,
) -> Result<Option<(Hash, Transaction)>, LedgerError> {
    let top = store.chain_height()?;
    if top == 0 {
        return Ok(None);
    }
    let end = approx_height.saturating_add(window).min(top - 1);
    for height in approx_height..=end {
        let Some(block) = store.block_by_height(height)? else {
            continue;
        };
        for hash in block.all_tx_hashes() {
            let Some(tx) = store.tx_by_hash(hash)? else {
                log::warn!("block {} lists missing tx {}", height, hex::encode(hash));
                continue;
            };
            if tx.prefix.outputs.iter().any(|o| o.key() == output_key) {
                return Ok(Some((*hash, tx)));
            }
        }
    }
    Ok(None)
}
