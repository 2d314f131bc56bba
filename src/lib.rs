//! # mhc-store
//!
//! Filesystem record store for schedule entries:
//! - Records kept as numbered files inside date-bucket "slots"
//! - Uid index for direct lookup without scanning slots
//! - Transparent enumeration of flat-file and directory slots
//! - Blob cache with modification-time staleness checks
//! - Append-only transaction log of every mutation
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        RecordStore                          │
//! │        store / find_by_uid / delete / entries / cache       │
//! └──────┬──────────────┬───────────────┬──────────────┬────────┘
//!        │              │               │              │
//!        ▼              ▼               ▼              ▼
//!  ┌───────────┐  ┌───────────┐  ┌─────────────┐  ┌──────────┐
//!  │  Layout   │  │   Slot    │  │  BlobCache  │  │  TxLog   │
//!  │ (paths +  │  │ Allocator │  │  (cache/)   │  │ (append) │
//!  │  ensure)  │  │ + Entries │  └─────────────┘  └──────────┘
//!  └───────────┘  └───────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod layout;
pub mod slot;
pub mod cache;
pub mod txlog;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::{Config, LogSyncStrategy};
pub use layout::Layout;
pub use slot::{SlotEntries, SlotEntry};
pub use store::{Record, RecordStore};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of mhc-store
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
