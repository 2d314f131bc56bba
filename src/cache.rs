//! Blob Cache
//!
//! Named text blobs under `cache/`, used to memoize derived artifacts such
//! as a rendered slot. Staleness is decided by comparing modification times
//! against the files a blob was derived from.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::layout::{ensure_dir, write_atomic, Layout};

/// Name-keyed text blob store
#[derive(Debug, Clone)]
pub struct BlobCache {
    layout: Layout,
    sync_directories: bool,
}

impl BlobCache {
    pub fn new(layout: Layout, sync_directories: bool) -> Self {
        Self {
            layout,
            sync_directories,
        }
    }

    /// Replace the blob `name` with `value`
    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        let path = self.layout.cache_path(name)?;
        ensure_dir(self.layout.cache_dir(), self.sync_directories)?;
        write_atomic(&path, value.as_bytes(), self.sync_directories)?;

        debug!(name, bytes = value.len(), "cache blob written");
        Ok(())
    }

    /// Full content of the blob `name`
    pub fn get(&self, name: &str) -> Result<String> {
        let path = self.layout.cache_path(name)?;
        fs::read_to_string(&path).map_err(|e| StoreError::from_io_at(e, &path))
    }

    /// Path of the blob `name`, for staleness checks
    pub fn path(&self, name: &str) -> Result<PathBuf> {
        self.layout.cache_path(name)
    }

    /// Candidates that still exist and were modified strictly after `cache_file`
    ///
    /// Fails with `NotFound` when `cache_file` itself is missing. Candidate
    /// order is preserved.
    pub fn newer_items<P: AsRef<Path>>(cache_file: &Path, candidates: &[P]) -> Result<Vec<PathBuf>> {
        let cache_mtime = fs::metadata(cache_file)
            .and_then(|meta| meta.modified())
            .map_err(|e| StoreError::from_io_at(e, cache_file))?;

        let mut newer = Vec::new();
        for candidate in candidates {
            let candidate = candidate.as_ref();
            let modified = match fs::metadata(candidate) {
                Ok(meta) => meta.modified()?,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            if modified > cache_mtime {
                newer.push(candidate.to_path_buf());
            }
        }

        Ok(newer)
    }
}
