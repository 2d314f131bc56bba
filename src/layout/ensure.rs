//! Directory Ensurer
//!
//! Creates a directory and every missing ancestor, syncing each new
//! directory so its entry survives a crash.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, StoreError};

/// Ensure `dir` and all of its ancestors exist
///
/// Walks upward to the deepest existing ancestor, then creates the missing
/// directories top-down. With `sync` set, each created directory and its
/// parent are fsynced. Returns how many directories were created (0 when
/// `dir` already existed).
pub fn ensure_dir(dir: &Path, sync: bool) -> Result<usize> {
    // Step 1: Collect missing directories, deepest first
    let mut missing: Vec<PathBuf> = Vec::new();
    let mut cursor = Some(dir);

    while let Some(current) = cursor {
        match fs::metadata(current) {
            Ok(meta) if meta.is_dir() => break,
            Ok(_) => return Err(StoreError::NotADirectory(current.to_path_buf())),
            // A file further up reports NotADirectory here; keep walking to name it
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                missing.push(current.to_path_buf());
                cursor = current.parent().filter(|p| !p.as_os_str().is_empty());
            }
            Err(e) => return Err(e.into()),
        }
    }

    // Step 2: Create shallowest first
    let created = missing.len();
    for path in missing.iter().rev() {
        match fs::create_dir(path) {
            Ok(()) => {}
            // Another creator got there first
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => continue,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StoreError::NotADirectory(path.clone()))
            }
            Err(e) => return Err(e.into()),
        }

        if sync {
            sync_dir(path)?;
            if let Some(parent) = path.parent() {
                sync_dir(parent)?;
            }
        }
        debug!(path = %path.display(), "created directory");
    }

    Ok(created)
}

/// fsync a directory so that entries created or removed in it are durable
#[cfg(unix)]
pub fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

/// Directories cannot be opened for syncing on this platform
#[cfg(not(unix))]
pub fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
