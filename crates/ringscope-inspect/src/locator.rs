//! Output locator: absolute ring offsets to outputs, transactions and blocks.

use ringscope_ledger::{Block, LedgerError, LedgerStore, OutputRecord};
use ringscope_tx::Transaction;
use ringscope_types::{Hash, PublicKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("cannot find output {offset} of amount {amount}")]
    OutputNotFound { amount: u64, offset: u64 },

    #[error("cannot find tx_hash for output {}, blk: {height}", hex::encode(.output_key))]
    SourceTxNotFound { output_key: PublicKey, height: u64 },

    #[error("cannot find tx_out for output {} in tx {}", hex::encode(.output_key), hex::encode(.tx_hash))]
    OutputIndexNotFound { output_key: PublicKey, tx_hash: Hash },

    #[error("cannot get block of height {0}")]
    BlockNotFound(u64),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl LocateError {
    /// Store failures abort the run; a bad record or a missing lookup only
    /// affects one member.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Ledger(e) => e.is_fatal(),
            _ => false,
        }
    }
}

/// Output at position `offset` among outputs of denomination `amount`.
pub fn lookup_output<S: LedgerStore + ?Sized>(
    store: &S,
    amount: u64,
    offset: u64,
) -> Result<OutputRecord, LocateError> {
    store
        .output_by_index(amount, offset)?
        .ok_or(LocateError::OutputNotFound { amount, offset })
}

/// Transaction that created `output_key`, searched from `approx_height`.
pub fn locate_owning_tx<S: LedgerStore + ?Sized>(
    store: &S,
    output_key: &PublicKey,
    approx_height: u64,
) -> Result<(Hash, Transaction), LocateError> {
    store
        .find_tx_by_output_key(output_key, approx_height)?
        .ok_or(LocateError::SourceTxNotFound {
            output_key: *output_key,
            height: approx_height,
        })
}

/// Position of `output_key` among the outputs of `tx`.
pub fn locate_output_index(
    tx_hash: &Hash,
    tx: &Transaction,
    output_key: &PublicKey,
) -> Result<usize, LocateError> {
    tx.prefix
        .outputs
        .iter()
        .position(|o| o.key() == output_key)
        .ok_or(LocateError::OutputIndexNotFound {
            output_key: *output_key,
            tx_hash: *tx_hash,
        })
}

pub fn block_at<S: LedgerStore + ?Sized>(store: &S, height: u64) -> Result<Block, LocateError> {
    store
        .block_by_height(height)?
        .ok_or(LocateError::BlockNotFound(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringscope_ledger::{NewBlock, SqliteLedger};
    use ringscope_tx::{RctPrunable, RctSignatures, Signatures, TxInput, TxOutput, TxPrefix};

    fn coinbase(height: u64, keys: &[PublicKey]) -> Transaction {
        Transaction {
            prefix: TxPrefix {
                version: 2,
                unlock_time: height + 60,
                inputs: vec![TxInput::Gen { height }],
                outputs: keys.iter().map(|k| TxOutput::Key { amount: 7, key: *k }).collect(),
                extra: vec![],
            },
            signatures: Signatures::RingCt(RctSignatures {
                rct_type: 0,
                txn_fee: 0,
                base_pseudo_outs: vec![],
                ecdh_info: vec![],
                out_pk: vec![],
                prunable: RctPrunable::None,
            }),
        }
    }

    fn ledger() -> SqliteLedger {
        let mut db = SqliteLedger::open_in_memory().unwrap();
        for h in 0..3u8 {
            db.put_block(&NewBlock {
                hash: [h; 32],
                timestamp: 100 + h as u64,
                miner_tx: coinbase(h as u64, &[[h * 2 + 1; 32], [h * 2 + 2; 32]]),
                txs: vec![],
            })
            .unwrap();
        }
        db
    }

    #[test]
    fn test_resolves_member() {
        let db = ledger();
        let out = lookup_output(&db, 0, 3).unwrap();
        assert_eq!(out.public_key, [4; 32]);
        assert_eq!(out.height, 1);

        let (hash, tx) = locate_owning_tx(&db, &out.public_key, out.height).unwrap();
        assert_eq!(locate_output_index(&hash, &tx, &out.public_key).unwrap(), 1);
        assert_eq!(block_at(&db, out.height).unwrap().timestamp, 101);
    }

    #[test]
    fn test_soft_failures() {
        let db = ledger();
        let err = lookup_output(&db, 0, 6).unwrap_err();
        assert!(matches!(err, LocateError::OutputNotFound { amount: 0, offset: 6 }));
        assert!(!err.is_fatal());

        assert!(matches!(
            locate_owning_tx(&db, &[0x55; 32], 2),
            Err(LocateError::SourceTxNotFound { height: 2, .. })
        ));

        let (hash, tx) = locate_owning_tx(&db, &[1; 32], 0).unwrap();
        assert!(matches!(
            locate_output_index(&hash, &tx, &[0x55; 32]),
            Err(LocateError::OutputIndexNotFound { .. })
        ));
        assert!(matches!(block_at(&db, 9), Err(LocateError::BlockNotFound(9))));
    }

    #[test]
    fn test_bad_record_is_not_fatal() {
        let err = LocateError::from(LedgerError::Corrupt("bad output row".into()));
        assert!(!err.is_fatal());
        let err = LocateError::from(LedgerError::Db(rusqlite::Error::InvalidQuery));
        assert!(err.is_fatal());
        assert!(LocateError::from(LedgerError::ReadOnly).is_fatal());
    }
}
