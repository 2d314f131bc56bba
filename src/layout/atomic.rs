//! Atomic file replacement (temp file + fsync + rename)

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, StoreError};

use super::sync_dir;

/// Per-process counter keeping concurrent temp names apart
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace `path` with `data` so readers see either the old or new content
///
/// The temp file is hidden (`.<name>.<pid>.<n>.tmp`) and lives next to the
/// target so the rename never crosses filesystems. On failure the temp file
/// is removed.
pub fn write_atomic(path: &Path, data: &[u8], sync_parent: bool) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::InvalidName(path.display().to_string()))?;
    let temp_path = temp_path_for(path)?;

    let result = write_then_rename(&temp_path, path, data);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result?;

    if sync_parent {
        sync_dir(parent)?;
    }
    Ok(())
}

fn write_then_rename(temp_path: &Path, path: &Path, data: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(temp_path, path)?;
    Ok(())
}

fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StoreError::InvalidName(path.display().to_string()))?;
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);

    Ok(path.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), n)))
}
