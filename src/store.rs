//! Store Module
//!
//! The record store that coordinates all components.
//!
//! ## Responsibilities
//! - Persist records under slots and index them by uid
//! - Look records up and delete them by uid
//! - Enumerate slots and serve the blob cache
//! - Append every mutation to the transaction log

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::BlobCache;
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::layout::{ensure_dir, sync_dir, write_atomic, Layout};
use crate::slot::{SlotAllocator, SlotEntries};
use crate::txlog::{LogWriter, Operation};

/// A record removed by [`RecordStore::delete`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Where the record lived
    pub path: PathBuf,
    /// Its content at the time of removal
    pub data: String,
}

/// The record store
///
/// ## Write Ordering
/// `store` makes the record file durable before the uid index entry is
/// renamed into place, so an index entry never names a record that was not
/// fully written. A crash between the two steps leaves an unindexed record
/// file behind.
///
/// `delete` removes the index entry before the record file, so a crash in
/// between leaves an unreachable record rather than a dangling index entry.
///
/// ## Concurrency
/// All methods take `&self`. Record numbers are claimed with exclusive
/// creates and index entries are replaced by atomic renames; the log writer
/// is the only in-process shared state and sits behind a mutex.
pub struct RecordStore {
    config: Config,
    layout: Layout,
    allocator: SlotAllocator,
    cache: BlobCache,
    /// Present when the transaction log is enabled
    log: Option<Mutex<LogWriter>>,
}

impl RecordStore {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Validate config and resolve the base directory
    /// 2. Create base, uid index and cache directories
    /// 3. Open the transaction log if enabled
    ///
    /// The base directory is canonicalized once it exists, so record paths
    /// and index entries agree however the store was reached. A log that
    /// cannot be opened disables logging for this handle with a warning.
    pub fn open(config: Config) -> Result<Self> {
        // Step 1: Validate
        if config.max_allocation_attempts == 0 {
            return Err(StoreError::Config(
                "max_allocation_attempts must be at least 1".to_string(),
            ));
        }
        let sync = config.sync_directories;
        let requested = Layout::new(&config.base_dir)?;
        ensure_dir(requested.base_dir(), sync)?;
        let layout = Layout::new(&fs::canonicalize(requested.base_dir())?)?;
        if layout.base_dir().to_str().is_none() {
            return Err(StoreError::Config(format!(
                "base directory {} is not valid UTF-8",
                layout.base_dir().display()
            )));
        }

        // Step 2: Directories
        ensure_dir(layout.uid_dir(), sync)?;
        ensure_dir(layout.cache_dir(), sync)?;

        // Step 3: Transaction log
        let log = if config.transaction_log {
            match LogWriter::open(layout.log_path(), config.log_sync_strategy) {
                Ok(writer) => Some(Mutex::new(writer)),
                Err(e) => {
                    warn!(
                        path = %layout.log_path().display(),
                        error = %e,
                        "transaction log unusable, logging disabled"
                    );
                    None
                }
            }
        } else {
            None
        };

        debug!(base_dir = %layout.base_dir().display(), "record store opened");

        Ok(Self {
            allocator: SlotAllocator::new(config.max_allocation_attempts),
            cache: BlobCache::new(layout.clone(), sync),
            config,
            layout,
            log,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified base directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().base_dir(path).build())
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Store `data` as a new record of `slot`, indexed under `uid`
    ///
    /// Steps:
    /// 1. Ensure the slot directory chain exists
    /// 2. Claim the next record number and write the record
    /// 3. Atomically point the uid index entry at it
    /// 4. Append to the transaction log
    ///
    /// The record is committed once step 3 succeeds; a failed log append
    /// after that is only warned about. Returns the record path. Storing an already indexed uid repoints the
    /// index; the previous record file is left in place.
    pub fn store(&self, uid: &str, slot: &str, data: &str) -> Result<PathBuf> {
        let index_path = self.layout.uid_path(uid)?;
        let slot_dir = self.layout.slot_path(slot)?;
        let sync = self.config.sync_directories;

        // Step 1: Slot directory
        ensure_dir(&slot_dir, sync)?;

        // Step 2: Record file
        let (record_path, mut file) = self.allocator.create(&slot_dir)?;
        let written = file
            .write_all(data.as_bytes())
            .and_then(|()| file.sync_all());
        drop(file);
        if let Err(e) = written {
            let _ = fs::remove_file(&record_path);
            return Err(e.into());
        }
        if sync {
            sync_dir(&slot_dir)?;
        }

        // Step 3: Index entry (last durable write)
        ensure_dir(self.layout.uid_dir(), sync)?;
        let record_str = record_path.to_string_lossy();
        write_atomic(&index_path, record_str.as_bytes(), sync)?;

        // Step 4: Log
        self.log_operation(Operation::Store {
            uid: uid.to_string(),
            path: record_path.clone(),
        });

        debug!(uid, slot, path = %record_path.display(), "record stored");
        Ok(record_path)
    }

    /// Path of the record currently indexed under `uid`
    ///
    /// An indexed path outside the base directory is accepted only if it
    /// resolves into it through symlinks.
    pub fn find_path(&self, uid: &str) -> Result<PathBuf> {
        let index_path = self.layout.uid_path(uid)?;
        let content = fs::read_to_string(&index_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(format!("uid '{}'", uid)),
            _ => StoreError::Io(e),
        })?;

        let record_path = PathBuf::from(content.trim_end_matches('\n'));
        if record_path.starts_with(self.layout.base_dir()) {
            return Ok(record_path);
        }

        let resolved = fs::canonicalize(&record_path)
            .map_err(|e| StoreError::from_io_at(e, &record_path))?;
        if !resolved.starts_with(self.layout.base_dir()) {
            return Err(StoreError::InvalidName(format!(
                "index entry for uid '{}' points outside the store: {}",
                uid,
                record_path.display()
            )));
        }
        Ok(record_path)
    }

    /// Content of the record indexed under `uid`
    ///
    /// `NotFound` when the uid has no index entry or its record is gone.
    pub fn find_by_uid(&self, uid: &str) -> Result<String> {
        let record_path = self.find_path(uid)?;
        fs::read_to_string(&record_path).map_err(|e| StoreError::from_io_at(e, &record_path))
    }

    /// Remove the record indexed under `uid` along with its index entry
    ///
    /// Steps:
    /// 1. Resolve the record path (`NotFound` without touching disk)
    /// 2. Read the record's content
    /// 3. Remove the index entry, then the record file
    /// 4. Append to the transaction log
    ///
    /// An index entry naming a vanished record is removed and reported as
    /// `NotFound`. As with `store`, a failed log append is only warned about.
    pub fn delete(&self, uid: &str) -> Result<Record> {
        let index_path = self.layout.uid_path(uid)?;
        let sync = self.config.sync_directories;

        // Step 1: Resolve
        let record_path = self.find_path(uid)?;

        // Step 2: Read
        let data = match fs::read(&record_path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(uid, path = %record_path.display(), "removing stale index entry");
                remove_if_present(&index_path)?;
                return Err(StoreError::NotFound(record_path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        // Step 3: Remove index, then record
        remove_if_present(&index_path)?;
        if sync {
            sync_dir(self.layout.uid_dir())?;
        }
        remove_if_present(&record_path)?;
        if let Some(slot_dir) = record_path.parent().filter(|_| sync) {
            sync_dir(slot_dir)?;
        }

        // Step 4: Log
        self.log_operation(Operation::Delete {
            uid: uid.to_string(),
            path: record_path.clone(),
        });

        debug!(uid, path = %record_path.display(), "record deleted");
        Ok(Record {
            path: record_path,
            data,
        })
    }

    /// Records of `slot`, whichever layout it uses
    pub fn entries(&self, slot: &str) -> Result<SlotEntries> {
        SlotEntries::open(&self.layout.slot_path(slot)?)
    }

    // =========================================================================
    // Blob Cache
    // =========================================================================

    /// Replace the cache blob `name`
    pub fn set_cache(&self, name: &str, value: &str) -> Result<()> {
        self.cache.set(name, value)
    }

    /// Content of the cache blob `name`
    pub fn cache(&self, name: &str) -> Result<String> {
        self.cache.get(name)
    }

    /// Path of the cache blob `name`
    pub fn cache_path(&self, name: &str) -> Result<PathBuf> {
        self.cache.path(name)
    }

    /// Candidates modified strictly after `cache_file`
    pub fn newer_items<P: AsRef<Path>>(&self, cache_file: &Path, candidates: &[P]) -> Result<Vec<PathBuf>> {
        BlobCache::newer_items(cache_file, candidates)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Flush the transaction log and close the store
    pub fn close(self) -> Result<()> {
        if let Some(log) = &self.log {
            log.lock().sync()?;
        }
        Ok(())
    }

    fn log_operation(&self, operation: Operation) {
        let Some(log) = &self.log else {
            return;
        };

        match log.lock().append(operation) {
            Ok(lsn) => debug!(lsn, "transaction logged"),
            Err(e) => warn!(error = %e, "transaction log append failed"),
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// LSN of the last logged mutation, `None` when logging is disabled
    pub fn last_lsn(&self) -> Option<u64> {
        self.log.as_ref().map(|log| log.lock().current_lsn())
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
