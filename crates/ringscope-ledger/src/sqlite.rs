//! SQLite-backed ledger store.
//!
//! One file holds blocks, transaction blobs and the per-denomination output
//! index. Hashes and keys are stored as hex text; u64 values are stored
//! bit-for-bit in INTEGER columns.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use ringscope_crypto::zero_commit;
use ringscope_tx::{parse_transaction, serialize_transaction, Transaction};
use ringscope_types::keys::parse_hex_array;
use ringscope_types::{Hash, PublicKey};

use crate::config::LedgerConfig;
use crate::store::{scan_blocks_for_output, Block, LedgerStore, OutputRecord, DEFAULT_SCAN_WINDOW};
use crate::LedgerError;

// ─── Schema DDL ─────────────────────────────────────────────────────────────

const SCHEMA_VERSION: &str = "1";

const SCHEMA_DDL: &str = "
CREATE TABLE IF NOT EXISTS blocks (
  height          INTEGER PRIMARY KEY,
  hash            TEXT NOT NULL UNIQUE,
  timestamp       INTEGER NOT NULL,
  miner_tx_hash   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
  tx_hash         TEXT PRIMARY KEY,
  block_height    INTEGER NOT NULL,
  tx_index        INTEGER NOT NULL,
  blob            BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_txs_height ON transactions(block_height, tx_index);

CREATE TABLE IF NOT EXISTS outputs (
  amount          INTEGER NOT NULL,
  amount_index    INTEGER NOT NULL,
  public_key      TEXT NOT NULL,
  tx_hash         TEXT NOT NULL,
  output_index    INTEGER NOT NULL,
  block_height    INTEGER NOT NULL,
  unlock_time     INTEGER NOT NULL,
  commitment      TEXT,
  PRIMARY KEY (amount, amount_index)
);

CREATE INDEX IF NOT EXISTS idx_outputs_key ON outputs(public_key);
CREATE INDEX IF NOT EXISTS idx_outputs_tx ON outputs(tx_hash, output_index);

CREATE TABLE IF NOT EXISTS meta (
  key             TEXT PRIMARY KEY,
  value           TEXT
);
";

fn to_sql(v: u64) -> i64 {
    v as i64
}

fn from_sql(v: i64) -> u64 {
    v as u64
}

fn decode_hex<const N: usize>(column: &str, value: &str) -> Result<[u8; N], LedgerError> {
    parse_hex_array::<N>(value)
        .map_err(|e| LedgerError::Corrupt(format!("{column} '{value}': {e}")))
}

/// A block to append: header fields plus its transactions.
#[derive(Debug, Clone)]
pub struct NewBlock {
    pub hash: Hash,
    pub timestamp: u64,
    pub miner_tx: Transaction,
    pub txs: Vec<Transaction>,
}

// ─── SqliteLedger ───────────────────────────────────────────────────────────

pub struct SqliteLedger {
    conn: Connection,
    path: PathBuf,
    scan_window: u64,
    read_only: bool,
}

impl SqliteLedger {
    pub fn open(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let flags = if config.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
        };
        let conn = Connection::open_with_flags(&config.path, flags).map_err(|source| {
            LedgerError::Open {
                path: config.path.clone(),
                source,
            }
        })?;
        conn.busy_timeout(config.lock_wait)?;

        if !config.read_only {
            Self::create_tables(&conn)?;
        }

        let ledger = SqliteLedger {
            conn,
            path: config.path.clone(),
            scan_window: config.scan_window,
            read_only: config.read_only,
        };
        ledger.check_schema()?;
        log::debug!(
            "opened ledger {} ({})",
            ledger.path.display(),
            if ledger.read_only { "read-only" } else { "read-write" }
        );
        Ok(ledger)
    }

    /// Fresh writable ledger in memory.
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory()?;
        Self::create_tables(&conn)?;
        Ok(SqliteLedger {
            conn,
            path: PathBuf::from(":memory:"),
            scan_window: DEFAULT_SCAN_WINDOW,
            read_only: false,
        })
    }

    fn create_tables(conn: &Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(SCHEMA_DDL)?;
        conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION],
        )?;
        Ok(())
    }

    fn check_schema(&self) -> Result<(), LedgerError> {
        let not_a_ledger = || LedgerError::NotALedger {
            path: self.path.clone(),
        };
        match self.meta("schema_version") {
            Ok(Some(v)) if v == SCHEMA_VERSION => Ok(()),
            Ok(_) | Err(LedgerError::Db(_)) => Err(not_a_ledger()),
            Err(e) => Err(e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── Meta ────────────────────────────────────────────────────────────

    pub fn meta(&self, key: &str) -> Result<Option<String>, LedgerError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |r| r.get(0))
            .optional()?)
    }

    pub fn set_meta(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        if self.read_only {
            return Err(LedgerError::ReadOnly);
        }
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // ── Writer ──────────────────────────────────────────────────────────

    /// Append a block at the current chain height.
    ///
    /// Outputs of v2 transactions are indexed under amount 0 with their
    /// RingCT commitment (coinbase outputs get a zero-mask commitment);
    /// v1 outputs are indexed under their own amount.
    pub fn put_block(&mut self, block: &NewBlock) -> Result<Block, LedgerError> {
        if self.read_only {
            return Err(LedgerError::ReadOnly);
        }
        let height = self.chain_height()?;
        let miner_tx_hash = block.miner_tx.hash();

        let db = self.conn.transaction()?;
        db.execute(
            "INSERT INTO blocks (height, hash, timestamp, miner_tx_hash) VALUES (?1, ?2, ?3, ?4)",
            params![
                to_sql(height),
                hex::encode(block.hash),
                to_sql(block.timestamp),
                hex::encode(miner_tx_hash)
            ],
        )?;

        let mut tx_hashes = Vec::with_capacity(block.txs.len());
        for (tx_index, tx) in std::iter::once(&block.miner_tx).chain(block.txs.iter()).enumerate() {
            let tx_hash = tx.hash();
            if tx_index > 0 {
                tx_hashes.push(tx_hash);
            }
            insert_transaction(&db, height, tx_index, &tx_hash, tx)?;
        }
        db.commit()?;

        log::debug!("stored block {} with {} txs", height, tx_hashes.len() + 1);
        Ok(Block {
            height,
            hash: block.hash,
            timestamp: block.timestamp,
            miner_tx_hash,
            tx_hashes,
        })
    }
}

fn insert_transaction(
    db: &rusqlite::Transaction<'_>,
    height: u64,
    tx_index: usize,
    tx_hash: &Hash,
    tx: &Transaction,
) -> Result<(), LedgerError> {
    let hash_hex = hex::encode(tx_hash);
    db.execute(
        "INSERT INTO transactions (tx_hash, block_height, tx_index, blob) VALUES (?1, ?2, ?3, ?4)",
        params![hash_hex, to_sql(height), tx_index as i64, serialize_transaction(tx)],
    )?;

    let ringct = tx.version() >= 2;
    for (output_index, output) in tx.prefix.outputs.iter().enumerate() {
        let amount = if ringct { 0 } else { output.amount() };
        let commitment = match (ringct, tx.is_coinbase()) {
            (false, _) => None,
            (true, true) => Some(zero_commit(output.amount()).ok_or_else(|| {
                LedgerError::Corrupt("cannot build coinbase commitment".into())
            })?),
            (true, false) => tx.rct().and_then(|r| r.out_pk.get(output_index).copied()),
        };
        let next_index: i64 = db.query_row(
            "SELECT COALESCE(MAX(amount_index) + 1, 0) FROM outputs WHERE amount = ?1",
            params![to_sql(amount)],
            |r| r.get(0),
        )?;
        db.execute(
            "INSERT INTO outputs (
                amount, amount_index, public_key, tx_hash, output_index,
                block_height, unlock_time, commitment
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                to_sql(amount),
                next_index,
                hex::encode(output.key()),
                hash_hex,
                output_index as i64,
                to_sql(height),
                to_sql(tx.prefix.unlock_time),
                commitment.map(hex::encode)
            ],
        )?;
    }
    Ok(())
}

impl LedgerStore for SqliteLedger {
    fn chain_height(&self) -> Result<u64, LedgerError> {
        let count: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(height) + 1, 0) FROM blocks",
            [],
            |r| r.get(0),
        )?;
        Ok(from_sql(count))
    }

    fn block_by_height(&self, height: u64) -> Result<Option<Block>, LedgerError> {
        let row: Option<(String, i64, String)> = self
            .conn
            .query_row(
                "SELECT hash, timestamp, miner_tx_hash FROM blocks WHERE height = ?1",
                params![to_sql(height)],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .optional()?;
        let Some((hash, timestamp, miner_tx_hash)) = row else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare_cached(
            "SELECT tx_hash FROM transactions
             WHERE block_height = ?1 AND tx_index > 0 ORDER BY tx_index",
        )?;
        let tx_hashes = stmt
            .query_map(params![to_sql(height)], |r| r.get::<_, String>(0))?
            .map(|h| decode_hex::<32>("tx_hash", &h?))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Block {
            height,
            hash: decode_hex("hash", &hash)?,
            timestamp: from_sql(timestamp),
            miner_tx_hash: decode_hex("miner_tx_hash", &miner_tx_hash)?,
            tx_hashes,
        }))
    }

    fn tx_by_hash(&self, hash: &Hash) -> Result<Option<Transaction>, LedgerError> {
        let hash_hex = hex::encode(hash);
        let blob: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT blob FROM transactions WHERE tx_hash = ?1",
                params![hash_hex],
                |r| r.get(0),
            )
            .optional()?;
        blob.map(|b| {
            parse_transaction(&b).map_err(|source| LedgerError::TxDecode {
                hash: hash_hex.clone(),
                source,
            })
        })
        .transpose()
    }

    fn tx_block_height(&self, hash: &Hash) -> Result<Option<u64>, LedgerError> {
        let height: Option<i64> = self
            .conn
            .query_row(
                "SELECT block_height FROM transactions WHERE tx_hash = ?1",
                params![hex::encode(hash)],
                |r| r.get(0),
            )
            .optional()?;
        Ok(height.map(from_sql))
    }

    fn output_by_index(&self, amount: u64, index: u64) -> Result<Option<OutputRecord>, LedgerError> {
        let row: Option<(String, i64, i64, Option<String>)> = self
            .conn
            .query_row(
                "SELECT public_key, block_height, unlock_time, commitment
                 FROM outputs WHERE amount = ?1 AND amount_index = ?2",
                params![to_sql(amount), to_sql(index)],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .optional()?;
        let Some((public_key, height, unlock_time, commitment)) = row else {
            return Ok(None);
        };
        Ok(Some(OutputRecord {
            public_key: decode_hex("public_key", &public_key)?,
            height: from_sql(height),
            unlock_time: from_sql(unlock_time),
            commitment: commitment.map(|c| decode_hex("commitment", &c)).transpose()?,
        }))
    }

    fn tx_output_indices(&self, hash: &Hash) -> Result<Option<Vec<u64>>, LedgerError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT amount_index FROM outputs WHERE tx_hash = ?1 ORDER BY output_index",
        )?;
        let indices = stmt
            .query_map(params![hex::encode(hash)], |r| r.get::<_, i64>(0))?
            .map(|i| i.map(from_sql))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((!indices.is_empty()).then_some(indices))
    }

    fn scan_window(&self) -> u64 {
        self.scan_window
    }

    /// Indexed lookup on the output key, falling back to a block scan.
    fn find_tx_by_output_key(
        &self,
        output_key: &PublicKey,
        approx_height: u64,
    ) -> Result<Option<(Hash, Transaction)>, LedgerError> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT tx_hash FROM outputs WHERE public_key = ?1
                 ORDER BY ABS(block_height - ?2) LIMIT 1",
                params![hex::encode(output_key), to_sql(approx_height)],
                |r| r.get(0),
            )
            .optional()?;

        if let Some(hash_hex) = found {
            let hash = decode_hex::<32>("tx_hash", &hash_hex)?;
            if let Some(tx) = self.tx_by_hash(&hash)? {
                return Ok(Some((hash, tx)));
            }
            log::warn!("output index points at missing tx {}", hash_hex);
        }
        scan_blocks_for_output(self, output_key, approx_height, self.scan_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringscope_tx::{
        EcdhInfo, RctPrunable, RctSignatures, Signatures, TxInput, TxOutput, TxPrefix,
    };

    fn coinbase(height: u64, key: PublicKey, amount: u64) -> Transaction {
        Transaction {
            prefix: TxPrefix {
                version: 2,
                unlock_time: height + 60,
                inputs: vec![TxInput::Gen { height }],
                outputs: vec![TxOutput::Key { amount, key }],
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

    fn transfer(keys: &[PublicKey]) -> Transaction {
        Transaction {
            prefix: TxPrefix {
                version: 2,
                unlock_time: 0,
                inputs: vec![TxInput::Key {
                    amount: 0,
                    key_offsets: vec![0],
                    key_image: [0xee; 32],
                }],
                outputs: keys.iter().map(|k| TxOutput::Key { amount: 0, key: *k }).collect(),
                extra: vec![],
            },
            signatures: Signatures::RingCt(RctSignatures {
                rct_type: 4,
                txn_fee: 10,
                base_pseudo_outs: vec![],
                ecdh_info: keys.iter().map(|_| EcdhInfo::Compact { amount: [0; 8] }).collect(),
                out_pk: keys.iter().map(|k| [k[0] ^ 0xff; 32]).collect(),
                prunable: RctPrunable::Raw(vec![1, 2, 3]),
            }),
        }
    }

    fn new_block(n: u8, miner_key: PublicKey, txs: Vec<Transaction>) -> NewBlock {
        NewBlock {
            hash: [n; 32],
            timestamp: 1_500_000_000 + n as u64 * 120,
            miner_tx: coinbase(n as u64, miner_key, 1000),
            txs,
        }
    }

    #[test]
    fn test_put_and_read_blocks() {
        let mut db = SqliteLedger::open_in_memory().unwrap();
        assert_eq!(db.chain_height().unwrap(), 0);

        db.put_block(&new_block(0, [1; 32], vec![])).unwrap();
        let tx = transfer(&[[2; 32], [3; 32]]);
        let tx_hash = tx.hash();
        let stored = db.put_block(&new_block(1, [4; 32], vec![tx.clone()])).unwrap();

        assert_eq!(db.chain_height().unwrap(), 2);
        let block = db.block_by_height(1).unwrap().unwrap();
        assert_eq!(block, stored);
        assert_eq!(block.tx_hashes, vec![tx_hash]);
        assert_eq!(block.timestamp, 1_500_000_120);
        assert!(db.block_by_height(2).unwrap().is_none());

        assert_eq!(db.tx_by_hash(&tx_hash).unwrap(), Some(tx));
        assert_eq!(db.tx_block_height(&tx_hash).unwrap(), Some(1));
        assert!(db.tx_by_hash(&[0x99; 32]).unwrap().is_none());
    }

    #[test]
    fn test_output_index_per_amount() {
        let mut db = SqliteLedger::open_in_memory().unwrap();
        db.put_block(&new_block(0, [1; 32], vec![])).unwrap();
        let tx = transfer(&[[2; 32], [3; 32]]);
        db.put_block(&new_block(1, [4; 32], vec![tx.clone()])).unwrap();

        // RingCT outputs share amount 0: miner0, miner1, then the transfer
        let out = db.output_by_index(0, 3).unwrap().unwrap();
        assert_eq!(out.public_key, [3; 32]);
        assert_eq!(out.height, 1);
        assert_eq!(out.commitment, Some([3 ^ 0xff; 32]));

        let miner = db.output_by_index(0, 0).unwrap().unwrap();
        assert_eq!(miner.unlock_time, 60);
        assert_eq!(miner.commitment, zero_commit(1000));

        assert!(db.output_by_index(0, 4).unwrap().is_none());
        assert!(db.output_by_index(1000, 0).unwrap().is_none());

        assert_eq!(db.tx_output_indices(&tx.hash()).unwrap(), Some(vec![2, 3]));
        assert_eq!(db.tx_output_indices(&[0x99; 32]).unwrap(), None);
    }

    #[test]
    fn test_v1_outputs_indexed_by_amount() {
        let mut db = SqliteLedger::open_in_memory().unwrap();
        let mut miner = coinbase(0, [1; 32], 5000);
        miner.prefix.version = 1;
        miner.signatures = Signatures::Ring(vec![vec![]]);
        db.put_block(&NewBlock {
            hash: [0; 32],
            timestamp: 1,
            miner_tx: miner,
            txs: vec![],
        })
        .unwrap();
        let out = db.output_by_index(5000, 0).unwrap().unwrap();
        assert_eq!(out.public_key, [1; 32]);
        assert!(out.commitment.is_none());
    }

    #[test]
    fn test_find_tx_by_output_key() {
        let mut db = SqliteLedger::open_in_memory().unwrap();
        db.put_block(&new_block(0, [1; 32], vec![])).unwrap();
        let tx = transfer(&[[2; 32]]);
        db.put_block(&new_block(1, [4; 32], vec![tx.clone()])).unwrap();

        let (hash, found) = db.find_tx_by_output_key(&[2; 32], 0).unwrap().unwrap();
        assert_eq!(hash, tx.hash());
        assert_eq!(found, tx);
        assert!(db.find_tx_by_output_key(&[0x77; 32], 1).unwrap().is_none());
    }

    #[test]
    fn test_meta_and_genesis() {
        let mut db = SqliteLedger::open_in_memory().unwrap();
        assert_eq!(db.meta("schema_version").unwrap().as_deref(), Some(SCHEMA_VERSION));
        db.set_meta("network", "testnet").unwrap();
        assert_eq!(db.meta("network").unwrap().as_deref(), Some("testnet"));

        db.put_block(&new_block(0, [1; 32], vec![])).unwrap();
        assert_eq!(db.genesis_timestamp().unwrap(), Some(1_500_000_000));
    }
}
