//! Tests for BlobCache
//!
//! These tests verify:
//! - set/get round trips and overwrite
//! - Missing blobs report NotFound
//! - newer_items compares modification times strictly

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use mhc_store::cache::BlobCache;
use mhc_store::{RecordStore, StoreError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, RecordStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = RecordStore::open_path(temp_dir.path()).unwrap();
    (temp_dir, store)
}

fn write_with_mtime(path: &Path, mtime: SystemTime) {
    fs::write(path, "x").unwrap();
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(mtime).unwrap();
}

// =============================================================================
// set / get Tests
// =============================================================================

#[test]
fn test_set_then_get() {
    let (_temp, store) = setup_temp_store();

    store.set_cache("2024-01", "rendered month").unwrap();

    assert_eq!(store.cache("2024-01").unwrap(), "rendered month");
}

#[test]
fn test_set_overwrites() {
    let (temp, store) = setup_temp_store();

    store.set_cache("2024-01", "a much longer first value").unwrap();
    store.set_cache("2024-01", "short").unwrap();

    assert_eq!(store.cache("2024-01").unwrap(), "short");
    // No temp files left behind
    let names: Vec<_> = fs::read_dir(temp.path().join("cache"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names.len(), 1);
}

#[test]
fn test_get_missing() {
    let (_temp, store) = setup_temp_store();

    let result = store.cache("never-set");

    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[test]
fn test_set_recreates_cache_dir() {
    let (temp, store) = setup_temp_store();
    fs::remove_dir(temp.path().join("cache")).unwrap();

    store.set_cache("x", "value").unwrap();

    assert_eq!(store.cache("x").unwrap(), "value");
}

#[test]
fn test_invalid_names() {
    let (_temp, store) = setup_temp_store();

    assert!(matches!(
        store.set_cache("../outside", "v"),
        Err(StoreError::InvalidName(_))
    ));
    assert!(store.cache("a/b").is_err());
}

#[test]
fn test_cache_path_location() {
    let (temp, store) = setup_temp_store();

    let base = fs::canonicalize(temp.path()).unwrap();
    assert_eq!(store.cache_path("n").unwrap(), base.join("cache/n"));
}

// =============================================================================
// newer_items Tests
// =============================================================================

#[test]
fn test_newer_items_strictly_later() {
    let temp_dir = TempDir::new().unwrap();
    let t = SystemTime::now() - Duration::from_secs(3600);

    let cache_file = temp_dir.path().join("cache");
    write_with_mtime(&cache_file, t);

    let older = temp_dir.path().join("older");
    let same = temp_dir.path().join("same");
    let newer = temp_dir.path().join("newer");
    write_with_mtime(&older, t - Duration::from_secs(1));
    write_with_mtime(&same, t);
    write_with_mtime(&newer, t + Duration::from_secs(1));

    let result =
        BlobCache::newer_items(&cache_file, &[older, same, newer.clone()]).unwrap();

    assert_eq!(result, vec![newer]);
}

#[test]
fn test_newer_items_skips_missing_candidates() {
    let temp_dir = TempDir::new().unwrap();
    let t = SystemTime::now() - Duration::from_secs(3600);
    let cache_file = temp_dir.path().join("cache");
    write_with_mtime(&cache_file, t);
    let newer = temp_dir.path().join("newer");
    write_with_mtime(&newer, t + Duration::from_secs(5));

    let candidates: Vec<PathBuf> = vec![temp_dir.path().join("gone"), newer.clone()];
    let result = BlobCache::newer_items(&cache_file, &candidates).unwrap();

    assert_eq!(result, vec![newer]);
}

#[test]
fn test_newer_items_preserves_order() {
    let temp_dir = TempDir::new().unwrap();
    let t = SystemTime::now() - Duration::from_secs(3600);
    let cache_file = temp_dir.path().join("cache");
    write_with_mtime(&cache_file, t);

    let b = temp_dir.path().join("b");
    let a = temp_dir.path().join("a");
    write_with_mtime(&b, t + Duration::from_secs(2));
    write_with_mtime(&a, t + Duration::from_secs(1));

    let result = BlobCache::newer_items(&cache_file, &[b.clone(), a.clone()]).unwrap();

    assert_eq!(result, vec![b, a]);
}

#[test]
fn test_newer_items_missing_cache_file() {
    let temp_dir = TempDir::new().unwrap();

    let result = BlobCache::newer_items(&temp_dir.path().join("nope"), &[temp_dir.path()]);

    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[test]
fn test_store_records_newer_than_cache() {
    let (_temp, store) = setup_temp_store();
    store.set_cache("2024-01", "rendered").unwrap();
    let cache_file = store.cache_path("2024-01").unwrap();
    File::options()
        .write(true)
        .open(&cache_file)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(60))
        .unwrap();

    let record = store.store("u", "2024/01", "new").unwrap();

    let stale = store.newer_items(&cache_file, &[record.clone()]).unwrap();
    assert_eq!(stale, vec![record]);
}
