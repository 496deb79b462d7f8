//! Ledger open options.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::store::DEFAULT_SCAN_WINDOW;

/// How long a reader waits on a locked database before giving up.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

pub const LEDGER_FILE_NAME: &str = "ledger.db";

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub path: PathBuf,
    /// SQLite busy timeout.
    pub lock_wait: Duration,
    /// Blocks past the hinted height searched when the output index
    /// cannot resolve an owner.
    pub scan_window: u64,
    pub read_only: bool,
}

impl LedgerConfig {
    /// Read-only access with default waits.
    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_wait: DEFAULT_LOCK_WAIT,
            scan_window: DEFAULT_SCAN_WINDOW,
            read_only: true,
        }
    }

    /// Read-write access (importers, tests).
    pub fn writable(path: impl Into<PathBuf>) -> Self {
        Self {
            read_only: false,
            ..Self::read_only(path)
        }
    }

    pub fn with_lock_wait(mut self, lock_wait: Duration) -> Self {
        self.lock_wait = lock_wait;
        self
    }

    pub fn with_scan_window(mut self, scan_window: u64) -> Self {
        self.scan_window = scan_window;
        self
    }
}

/// Ledger file under a data directory, with an optional network sub-directory.
pub fn ledger_path(data_dir: &Path, network_subdir: Option<&str>) -> PathBuf {
    let mut path = data_dir.to_path_buf();
    if let Some(sub) = network_subdir {
        path.push(sub);
    }
    path.push(LEDGER_FILE_NAME);
    path
}
