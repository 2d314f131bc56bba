//! Transaction log writer
//!
//! Appends framed entries, continuing the LSN sequence of an existing log.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::LogSyncStrategy;
use crate::error::Result;

use super::entry::{LogEntry, Operation};
use super::reader::scan;

/// Writes entries to the transaction log file
pub struct LogWriter {
    path: PathBuf,
    file: File,
    /// LSN handed to the next append
    next_lsn: u64,
    sync_strategy: LogSyncStrategy,
    /// Appends since the last fsync
    unsynced: usize,
}

impl LogWriter {
    /// Open or create a log file
    ///
    /// An existing log is scanned first: a torn tail is truncated away and
    /// numbering continues after the last valid LSN. A damaged frame with
    /// valid frames after it fails with `LogCorruption` and the file is left
    /// untouched.
    pub fn open(path: &Path, sync_strategy: LogSyncStrategy) -> Result<Self> {
        let mut last_lsn = 0;

        if path.exists() {
            let scanned = scan(path)?;
            last_lsn = scanned.last_lsn();

            if scanned.torn_tail {
                warn!(
                    path = %path.display(),
                    valid_len = scanned.valid_len,
                    "truncating torn transaction log tail"
                );
                let file = OpenOptions::new().write(true).open(path)?;
                file.set_len(scanned.valid_len)?;
                file.sync_all()?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!(path = %path.display(), last_lsn, "transaction log opened");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            next_lsn: last_lsn + 1,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Append an operation, returning its LSN
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        let lsn = self.next_lsn;
        let frame = LogEntry::new(lsn, operation).encode()?;

        self.file.write_all(&frame)?;
        self.next_lsn += 1;
        self.unsynced += 1;

        match self.sync_strategy {
            LogSyncStrategy::EveryWrite => self.sync()?,
            LogSyncStrategy::EveryNEntries { count } => {
                if self.unsynced >= count {
                    self.sync()?;
                }
            }
        }

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        if self.unsynced > 0 {
            self.file.sync_data()?;
            self.unsynced = 0;
        }
        Ok(())
    }

    /// LSN of the last appended entry (0 if none)
    pub fn current_lsn(&self) -> u64 {
        self.next_lsn - 1
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        if let Err(e) = self.sync() {
            warn!(path = %self.path.display(), error = %e, "transaction log sync on close failed");
        }
    }
}
