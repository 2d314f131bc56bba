//! Configuration for mhc-store
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a record store instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all store files
    /// Internal structure:
    ///   {base_dir}/
    ///     ├── <slot>/<N>                    (record files)
    ///     ├── db/uid/<uid>                  (uid index)
    ///     ├── db/mhc-db-transaction.log     (transaction log)
    ///     └── cache/<name>                  (blob cache)
    pub base_dir: PathBuf,

    /// fsync directories after creating entries in them
    pub sync_directories: bool,

    /// How many numbers the allocator tries before giving up on a slot
    pub max_allocation_attempts: u32,

    // -------------------------------------------------------------------------
    // Transaction Log Configuration
    // -------------------------------------------------------------------------
    /// Append store/delete operations to the transaction log
    pub transaction_log: bool,

    /// Sync strategy: how often to fsync the transaction log
    pub log_sync_strategy: LogSyncStrategy,
}

/// Transaction log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSyncStrategy {
    /// fsync after every append
    EveryWrite,

    /// fsync after N unsynced entries
    EveryNEntries { count: usize },
}

impl Config {
    /// Default base directory: `$HOME/Mail/schedule`
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_default()
            .join("Mail")
            .join("schedule")
    }

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: Self::default_base_dir(),
            sync_directories: true,
            max_allocation_attempts: 1024,
            transaction_log: true,
            log_sync_strategy: LogSyncStrategy::EveryWrite,
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the base directory (root for all storage)
    pub fn base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.base_dir = path.into();
        self
    }

    /// Enable or disable directory fsync
    pub fn sync_directories(mut self, enabled: bool) -> Self {
        self.config.sync_directories = enabled;
        self
    }

    /// Set the allocator attempt cap
    pub fn max_allocation_attempts(mut self, attempts: u32) -> Self {
        self.config.max_allocation_attempts = attempts;
        self
    }

    /// Enable or disable the transaction log
    pub fn transaction_log(mut self, enabled: bool) -> Self {
        self.config.transaction_log = enabled;
        self
    }

    /// Set the transaction log sync strategy
    pub fn log_sync_strategy(mut self, strategy: LogSyncStrategy) -> Self {
        self.config.log_sync_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
