//! Transaction log entry definitions
//!
//! Defines the structure and framing of individual log entries.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Frame header: LSN (8) + CRC (4) + payload length (4)
pub const HEADER_SIZE: usize = 16;

/// A single entry in the transaction log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The mutation that was applied
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Mutations recorded in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// A record was written and its uid indexed
    Store { uid: String, path: PathBuf },

    /// A record and its uid index entry were removed
    Delete { uid: String, path: PathBuf },
}

impl Operation {
    pub fn uid(&self) -> &str {
        match self {
            Operation::Store { uid, .. } | Operation::Delete { uid, .. } => uid,
        }
    }
}

impl LogEntry {
    /// Stamp `operation` with `lsn` and the current time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    /// Encode as a complete frame: `[lsn][crc][len][payload]`
    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)?;
        let len = u32::try_from(payload.len()).map_err(|_| {
            StoreError::Serialization(format!("log entry of {} bytes is too large", payload.len()))
        })?;

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&self.lsn.to_le_bytes());
        frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        frame.extend_from_slice(&len.to_le_bytes());
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Verify and decode a payload read after a frame header
    ///
    /// Every rejection is `LogCorruption`: an empty payload, a checksum
    /// mismatch, undecodable bytes or a frame/entry LSN disagreement.
    pub fn decode(lsn: u64, crc: u32, payload: &[u8]) -> Result<Self> {
        if payload.is_empty() {
            return Err(StoreError::LogCorruption(format!(
                "empty frame at lsn {}",
                lsn
            )));
        }

        let actual = crc32fast::hash(payload);
        if actual != crc {
            return Err(StoreError::LogCorruption(format!(
                "CRC mismatch at lsn {}: expected {:08x}, found {:08x}",
                lsn, crc, actual
            )));
        }

        let entry: LogEntry = bincode::deserialize(payload).map_err(|e| {
            StoreError::LogCorruption(format!("undecodable frame at lsn {}: {}", lsn, e))
        })?;
        if entry.lsn != lsn {
            return Err(StoreError::LogCorruption(format!(
                "frame lsn {} does not match entry lsn {}",
                lsn, entry.lsn
            )));
        }
        Ok(entry)
    }
}
