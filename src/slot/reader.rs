//! Entry Enumerator
//!
//! Lazy iteration over the records of a slot, whichever layout it uses.

use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::vec;

use regex::Regex;

use crate::error::{Result, StoreError};

use super::SlotAllocator;

/// Whole-line comments, matched the same way in every flat slot
static COMMENT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*#.*$").expect("comment pattern is valid"));

/// Two or more newlines separate records
static RECORD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\n+").expect("separator pattern is valid"));

/// One enumerated record: `path` is `None` for records of a flat slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotEntry {
    pub path: Option<PathBuf>,
    pub text: String,
}

/// A slot resolved to its on-disk layout
///
/// The variant is picked from the filesystem type of the slot path when
/// opened. `iter()` can be called any number of times; each call starts a
/// fresh pass that re-reads the disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotEntries {
    /// Single file of blank-line separated records
    Flat(PathBuf),
    /// Directory holding one record per file
    Directory(PathBuf),
    /// Nothing at the slot path
    Missing,
}

impl SlotEntries {
    /// Inspect `path` and choose the matching layout
    pub fn open(path: &Path) -> Result<Self> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => Ok(SlotEntries::Flat(path.to_path_buf())),
            Ok(meta) if meta.is_dir() => Ok(SlotEntries::Directory(path.to_path_buf())),
            Ok(_) => Err(StoreError::NotAFile(path.to_path_buf())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(SlotEntries::Missing),
            Err(e) => Err(e.into()),
        }
    }

    /// Start a new pass over the slot
    pub fn iter(&self) -> Entries {
        let state = match self {
            SlotEntries::Flat(path) => State::Flat {
                path: path.clone(),
                records: None,
            },
            SlotEntries::Directory(dir) => State::Directory {
                dir: dir.clone(),
                files: None,
            },
            SlotEntries::Missing => State::Done,
        };
        Entries { state }
    }

    /// Collect one full pass, stopping at the first error
    pub fn collect_all(&self) -> Result<Vec<SlotEntry>> {
        self.iter().collect()
    }
}

impl<'a> IntoIterator for &'a SlotEntries {
    type Item = Result<SlotEntry>;
    type IntoIter = Entries;

    fn into_iter(self) -> Entries {
        self.iter()
    }
}

impl IntoIterator for SlotEntries {
    type Item = Result<SlotEntry>;
    type IntoIter = Entries;

    fn into_iter(self) -> Entries {
        self.iter()
    }
}

/// Iterator over one pass of a slot
pub struct Entries {
    state: State,
}

enum State {
    /// Records are split on the first `next()`
    Flat {
        path: PathBuf,
        records: Option<vec::IntoIter<String>>,
    },
    /// Directory is listed on the first `next()`, files are read one by one
    Directory {
        dir: PathBuf,
        files: Option<vec::IntoIter<PathBuf>>,
    },
    Done,
}

impl Iterator for Entries {
    type Item = Result<SlotEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.state {
            State::Flat { path, records } => {
                if records.is_none() {
                    match fs::read(&*path) {
                        Ok(bytes) => *records = Some(split_records(&bytes).into_iter()),
                        Err(e) => {
                            self.state = State::Done;
                            return Some(Err(e.into()));
                        }
                    }
                }
                let text = records.as_mut()?.next()?;
                Some(Ok(SlotEntry { path: None, text }))
            }
            State::Directory { dir, files } => {
                if files.is_none() {
                    match list_record_files(dir) {
                        Ok(listed) => *files = Some(listed.into_iter()),
                        Err(e) => {
                            self.state = State::Done;
                            return Some(Err(e));
                        }
                    }
                }
                // Files deleted since the listing are skipped
                loop {
                    let path = files.as_mut()?.next()?;
                    match read_first_paragraph(&path) {
                        Err(StoreError::Io(e)) if e.kind() == io::ErrorKind::NotFound => continue,
                        result => {
                            return Some(result.map(|text| SlotEntry {
                                path: Some(path),
                                text,
                            }))
                        }
                    }
                }
            }
            State::Done => None,
        }
    }
}

// =============================================================================
// Flat Layout
// =============================================================================

/// Split a flat slot's raw bytes into records
///
/// Invalid UTF-8 is replaced, comment lines are blanked, the text is
/// trimmed, and runs of two or more newlines separate records.
pub fn split_records(raw: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(raw);
    let stripped = COMMENT_LINE.replace_all(&text, "");
    let trimmed = stripped.trim();

    if trimmed.is_empty() {
        return Vec::new();
    }

    RECORD_SEPARATOR
        .split(trimmed)
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Directory Layout
// =============================================================================

/// Regular, non-hidden files of `dir`, numeric names first in numeric order
fn list_record_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<(String, PathBuf)> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        // Hidden names include in-flight temp files
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => files.push((name, path)),
            Ok(_) => {}
            // Removed after read_dir, or a dangling symlink
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    files.sort_by(|(a, _), (b, _)| compare_names(a, b));
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

fn compare_names(a: &str, b: &str) -> Ordering {
    match (
        SlotAllocator::parse_record_number(a),
        SlotAllocator::parse_record_number(b),
    ) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Text of `path` up to (not including) the first blank line
fn read_first_paragraph(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf: Vec<u8> = Vec::new();

    loop {
        let read = reader.read_until(b'\n', &mut buf)?;
        if read == 0 {
            break;
        }
        if buf.ends_with(b"\n\n") {
            buf.truncate(buf.len() - 2);
            break;
        }
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}
