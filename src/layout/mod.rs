//! Layout Module
//!
//! Maps slot names, uids and cache names to absolute paths under the base
//! directory, and owns the filesystem helpers that create those paths.
//!
//! ## Directory Layout
//! ```text
//! {base_dir}/
//!   ├── 2024/01/1, 2024/01/2, ...     (slot directories, numbered records)
//!   ├── intersect                     (flat slot, blank-line separated)
//!   ├── db/
//!   │   ├── uid/<uid>                 (one-line index: record path)
//!   │   └── mhc-db-transaction.log    (transaction log)
//!   └── cache/<name>                  (memoized blobs)
//! ```
//!
//! Resolution is purely lexical: no component is looked up on disk, and
//! nothing may climb above the base directory.

mod atomic;
mod ensure;

pub use atomic::write_atomic;
pub use ensure::{ensure_dir, sync_dir};

use std::path::{Component, Path, PathBuf};

use crate::error::{Result, StoreError};

/// Resolves logical names to paths under one base directory
#[derive(Debug, Clone)]
pub struct Layout {
    base_dir: PathBuf,
    uid_dir: PathBuf,
    cache_dir: PathBuf,
    log_path: PathBuf,
}

impl Layout {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const DB_DIR: &'static str = "db";
    const UID_DIR: &'static str = "uid";
    const CACHE_DIR: &'static str = "cache";
    const LOG_FILENAME: &'static str = "mhc-db-transaction.log";

    /// Build a layout rooted at `base_dir` (made absolute against the cwd)
    pub fn new(base_dir: &Path) -> Result<Self> {
        let base_dir = std::path::absolute(base_dir)?;
        let db_dir = base_dir.join(Self::DB_DIR);

        Ok(Self {
            uid_dir: db_dir.join(Self::UID_DIR),
            cache_dir: base_dir.join(Self::CACHE_DIR),
            log_path: db_dir.join(Self::LOG_FILENAME),
            base_dir,
        })
    }

    /// Resolve a slot name such as `2024/01` to its path
    ///
    /// `.` components are dropped and `..` pops the previous component.
    /// Absolute names, names escaping the base directory, and names landing
    /// in the reserved `db`/`cache` areas are rejected.
    pub fn slot_path(&self, slot: &str) -> Result<PathBuf> {
        let mut relative = PathBuf::new();

        for component in Path::new(slot).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !relative.pop() {
                        return Err(StoreError::InvalidName(format!(
                            "slot '{}' escapes the base directory",
                            slot
                        )));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(StoreError::InvalidName(format!(
                        "slot '{}' must be relative",
                        slot
                    )));
                }
            }
        }

        match relative.components().next() {
            None => Err(StoreError::InvalidName(format!(
                "slot '{}' resolves to the base directory",
                slot
            ))),
            Some(Component::Normal(first))
                if first == Self::DB_DIR || first == Self::CACHE_DIR =>
            {
                Err(StoreError::InvalidName(format!(
                    "slot '{}' lies in a reserved area",
                    slot
                )))
            }
            Some(_) => Ok(self.base_dir.join(relative)),
        }
    }

    /// Path of the index file for `uid`
    pub fn uid_path(&self, uid: &str) -> Result<PathBuf> {
        Ok(self.uid_dir.join(single_component(uid, "uid")?))
    }

    /// Path of the cache blob called `name`
    pub fn cache_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.cache_dir.join(single_component(name, "cache name")?))
    }

    /// Path reserved for the transaction log
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn uid_dir(&self) -> &Path {
        &self.uid_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

/// Accept `name` only if it is exactly one normal path component
fn single_component<'a>(name: &'a str, what: &str) -> Result<&'a str> {
    let invalid = || StoreError::InvalidName(format!("{} '{}'", what, name));

    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return Err(invalid());
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(invalid()),
    }
}
