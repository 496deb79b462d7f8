//! Ledger store access for ringscope.
//!
//! `LedgerStore` is the read interface the inspector needs; `SqliteLedger`
//! implements it over a single SQLite file and also offers the writer used
//! by importers and tests.

pub mod config;
pub mod sqlite;
pub mod store;

pub use config::{ledger_path, LedgerConfig};
pub use sqlite::{NewBlock, SqliteLedger};
pub use store::{Block, LedgerStore, OutputRecord};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("cannot open ledger at {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{} is not a ringscope ledger", path.display())]
    NotALedger { path: PathBuf },

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("cannot decode transaction {hash}: {source}")]
    TxDecode {
        hash: String,
        #[source]
        source: ringscope_tx::TxError,
    },

    #[error("ledger is opened read-only")]
    ReadOnly,
}

impl LedgerError {
    /// Whether the store itself is unusable, as opposed to one bad record.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Corrupt(_) | Self::TxDecode { .. })
    }
}
