//! Slot Allocator
//!
//! Picks the next record number in a slot directory and claims it with an
//! exclusive create, so two writers can never be handed the same file.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, StoreError};

/// Allocates numbered record files inside slot directories
#[derive(Debug, Clone, Copy)]
pub struct SlotAllocator {
    /// Candidate numbers tried before giving up
    max_attempts: u32,
}

impl SlotAllocator {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Highest numeric entry name in `slot_dir` plus one (1 for an empty slot)
    ///
    /// Only names made entirely of ASCII digits count. Holes left by deleted
    /// records are never reused.
    pub fn next_number(slot_dir: &Path) -> Result<u64> {
        let mut max = 0u64;

        for entry in fs::read_dir(slot_dir)? {
            let entry = entry?;
            if let Some(n) = Self::parse_record_number(&entry.file_name().to_string_lossy()) {
                max = max.max(n);
            }
        }

        Ok(max.saturating_add(1))
    }

    /// Claim a fresh record file in `slot_dir`
    ///
    /// Starts at `next_number` and opens with `create_new`; when another
    /// writer already holds a candidate, moves on to the next number.
    /// Returns the claimed path and its open, empty file.
    pub fn create(&self, slot_dir: &Path) -> Result<(PathBuf, File)> {
        let mut candidate = Self::next_number(slot_dir)?;

        for _ in 0..self.max_attempts {
            let path = slot_dir.join(candidate.to_string());

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    debug!(path = %path.display(), "allocated record file");
                    return Ok((path, file));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "record number taken, retrying");
                    candidate = match candidate.checked_add(1) {
                        Some(next) => next,
                        None => break,
                    };
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::AllocationExhausted {
            slot: slot_dir.to_path_buf(),
            attempts: self.max_attempts,
        })
    }

    /// "42" → Some(42); anything not purely decimal → None
    pub fn parse_record_number(name: &str) -> Option<u64> {
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        name.parse().ok()
    }
}
