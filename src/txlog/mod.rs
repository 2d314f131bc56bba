//! Transaction Log Module
//!
//! Append-only record of every store and delete, kept at
//! `db/mhc-db-transaction.log`. It is written for auditing; nothing replays
//! it.
//!
//! ## Responsibilities
//! - Append one entry per mutation, after the mutation is durable
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering
//! - Drop a torn last frame when reopening
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Entry 1                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Entry 2                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! └─────────────────────────────────────────┘
//! ```
//! Data is the bincode encoding of [`LogEntry`]; the CRC covers Data only.

mod entry;
mod reader;
mod writer;

pub use entry::{LogEntry, Operation, HEADER_SIZE};
pub use reader::{scan, LogIterator, LogReader, LogScan};
pub use writer::LogWriter;
