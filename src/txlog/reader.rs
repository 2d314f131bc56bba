//! Transaction log reader
//!
//! Reads framed entries back, stopping cleanly at a torn tail.
//!
//! A tail is torn when the last frame is shorter than its header claims,
//! when the last frame fails verification, or when everything from the
//! current frame on is zero bytes (preallocated blocks a crash left behind).
//! A frame that fails verification with intact frames after it is
//! reported as `LogCorruption`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Result, StoreError};

use super::entry::{LogEntry, HEADER_SIZE};

/// Reads entries from a transaction log file
pub struct LogReader {
    reader: BufReader<File>,
    file_len: u64,
    /// End of the last fully read frame
    offset: u64,
    torn_tail: bool,
}

/// Outcome of reading a whole log
#[derive(Debug, Default)]
pub struct LogScan {
    /// Every valid entry, in file order
    pub entries: Vec<LogEntry>,

    /// Length in bytes of the valid prefix
    pub valid_len: u64,

    /// An incomplete or unverifiable tail followed the valid prefix
    pub torn_tail: bool,
}

impl LogScan {
    /// LSN of the last valid entry, 0 for an empty log
    pub fn last_lsn(&self) -> u64 {
        self.entries.last().map(|e| e.lsn).unwrap_or(0)
    }
}

impl LogReader {
    /// Open a log file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| StoreError::from_io_at(e, path))?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            reader: BufReader::new(file),
            file_len,
            offset: 0,
            torn_tail: false,
        })
    }

    /// Read the next entry
    ///
    /// Returns `Ok(None)` at end of file, including at a torn tail.
    pub fn next_entry(&mut self) -> Result<Option<LogEntry>> {
        let remaining = self.file_len - self.offset;
        if remaining == 0 || self.torn_tail {
            return Ok(None);
        }
        if remaining < HEADER_SIZE as u64 {
            self.torn_tail = true;
            return Ok(None);
        }

        let mut header = [0u8; HEADER_SIZE];
        self.reader.read_exact(&mut header)?;

        let lsn = u64::from_le_bytes(read_array(&header[0..8]));
        let crc = u32::from_le_bytes(read_array(&header[8..12]));
        let len = u32::from_le_bytes(read_array(&header[12..16])) as u64;

        if remaining - (HEADER_SIZE as u64) < len {
            self.torn_tail = true;
            return Ok(None);
        }

        let mut payload = vec![0u8; len as usize];
        self.reader.read_exact(&mut payload)?;

        let frame_end = self.offset + HEADER_SIZE as u64 + len;
        let entry = match LogEntry::decode(lsn, crc, &payload) {
            Ok(entry) => entry,
            Err(e) => {
                if frame_end == self.file_len || self.zeroed_from_frame(&header, &payload)? {
                    self.torn_tail = true;
                    return Ok(None);
                }
                return Err(e);
            }
        };
        self.offset = frame_end;
        Ok(Some(entry))
    }

    /// Whether the frame just read and every byte after it are zero
    fn zeroed_from_frame(&mut self, header: &[u8], payload: &[u8]) -> Result<bool> {
        if header.iter().chain(payload).any(|&b| b != 0) {
            return Ok(false);
        }

        let mut buf = [0u8; 4096];
        loop {
            let n = self.reader.read(&mut buf)?;
            if n == 0 {
                return Ok(true);
            }
            if buf[..n].iter().any(|&b| b != 0) {
                return Ok(false);
            }
        }
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> LogIterator {
        LogIterator {
            reader: self,
            done: false,
        }
    }

    /// End of the last fully read frame
    pub fn valid_len(&self) -> u64 {
        self.offset
    }

    /// Whether a torn tail was found after the valid prefix
    pub fn torn_tail(&self) -> bool {
        self.torn_tail
    }
}

/// Read every valid entry of the log at `path`
pub fn scan(path: &Path) -> Result<LogScan> {
    let mut reader = LogReader::open(path)?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry()? {
        entries.push(entry);
    }

    Ok(LogScan {
        entries,
        valid_len: reader.valid_len(),
        torn_tail: reader.torn_tail(),
    })
}

/// Iterator over log entries; ends after the first error
pub struct LogIterator {
    reader: LogReader,
    done: bool,
}

impl Iterator for LogIterator {
    type Item = Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn read_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}
