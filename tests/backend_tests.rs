//! Tests for the backends
//!
//! These tests verify:
//! - Basic get/set/remove/clear/keys
//! - Quota accounting and capacity failures
//! - Unavailable store simulation
//! - FileBackend persistence across reopen
//! - Snapshot corruption detection

use std::fs;
use std::sync::Arc;

use recordkv::backend::{FileBackend, KvBackend, MemoryBackend, Quota};
use recordkv::RecordError;
use tempfile::TempDir;

// =============================================================================
// MemoryBackend Tests
// =============================================================================

#[test]
fn test_memory_set_get_remove() {
    let backend = MemoryBackend::new();

    backend.set("k", "v").unwrap();
    assert_eq!(backend.get("k"), Some("v".to_string()));

    backend.remove("k").unwrap();
    assert_eq!(backend.get("k"), None);
    assert!(backend.is_empty());
}

#[test]
fn test_memory_remove_missing_is_noop() {
    let backend = MemoryBackend::new();

    backend.remove("missing").unwrap();
    assert_eq!(backend.size(), 0);
}

#[test]
fn test_memory_keys_in_sorted_order() {
    let backend = MemoryBackend::new();

    backend.set("b", "2").unwrap();
    backend.set("a", "1").unwrap();
    backend.set("c", "3").unwrap();

    assert_eq!(backend.keys(), vec!["a", "b", "c"]);
}

#[test]
fn test_memory_clear_wipes_everything() {
    let backend = MemoryBackend::new();

    backend.set("db_a_data", "x").unwrap();
    backend.set("unrelated", "y").unwrap();
    backend.clear().unwrap();

    assert!(backend.keys().is_empty());
    assert_eq!(backend.size(), 0);
}

#[test]
fn test_memory_unavailable_rejects_writes() {
    let backend = MemoryBackend::new();
    backend.set_available(false);

    assert!(matches!(backend.set("k", "v"), Err(RecordError::StoreUnavailable)));

    backend.set_available(true);
    backend.set("k", "v").unwrap();
}

#[test]
fn test_backend_through_reference_and_arc() {
    let backend = Arc::new(MemoryBackend::new());
    let by_ref: &MemoryBackend = &backend;

    by_ref.set("a", "1").unwrap();
    KvBackend::set(&backend, "b", "2").unwrap();

    assert_eq!(KvBackend::keys(&backend), vec!["a", "b"]);
}

// =============================================================================
// Quota Tests
// =============================================================================

#[test]
fn test_quota_counts_keys_and_values() {
    let backend = MemoryBackend::with_quota(Quota::bytes(10));

    backend.set("ab", "cdef").unwrap(); // 6 bytes
    assert_eq!(backend.size(), 6);

    let err = backend.set("gh", "ijk").unwrap_err(); // would be 11
    match err {
        RecordError::CapacityExceeded { key, required, limit } => {
            assert_eq!(key, "gh");
            assert_eq!(required, 11);
            assert_eq!(limit, 10);
        }
        other => panic!("expected CapacityExceeded, got {:?}", other),
    }

    // Failed write leaves the store unchanged
    assert_eq!(backend.get("gh"), None);
    assert_eq!(backend.size(), 6);
}

#[test]
fn test_quota_overwrite_counts_delta() {
    let backend = MemoryBackend::with_quota(Quota::bytes(8));

    backend.set("k", "1234567").unwrap(); // 8 bytes, exactly at limit
    backend.set("k", "abcdefg").unwrap(); // same size replaces in place
    assert_eq!(backend.size(), 8);

    backend.set("k", "x").unwrap();
    assert_eq!(backend.size(), 2);
}

#[test]
fn test_quota_freed_by_remove() {
    let backend = MemoryBackend::with_quota(Quota::bytes(6));

    backend.set("a", "12345").unwrap();
    assert!(backend.set("b", "1").unwrap_err().is_capacity());

    backend.remove("a").unwrap();
    backend.set("b", "1").unwrap();
}

// =============================================================================
// FileBackend Tests
// =============================================================================

#[test]
fn test_file_open_missing_starts_empty() {
    let temp_dir = TempDir::new().unwrap();
    let backend = FileBackend::open(temp_dir.path().join("nested/store.db"), Quota::unlimited()).unwrap();

    assert!(backend.is_empty());
    assert!(temp_dir.path().join("nested").exists());
}

#[test]
fn test_file_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.db");

    {
        let backend = FileBackend::open(&path, Quota::unlimited()).unwrap();
        backend.set("db_a_data", "hello").unwrap();
        backend.set("db_a_modified", "10").unwrap();
        backend.set("gone", "x").unwrap();
        backend.remove("gone").unwrap();
    }

    let backend = FileBackend::open(&path, Quota::unlimited()).unwrap();
    assert_eq!(backend.get("db_a_data"), Some("hello".to_string()));
    assert_eq!(backend.get("db_a_modified"), Some("10".to_string()));
    assert_eq!(backend.get("gone"), None);
    assert_eq!(backend.len(), 2);
}

#[test]
fn test_file_clear_persists() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.db");

    {
        let backend = FileBackend::open(&path, Quota::unlimited()).unwrap();
        backend.set("a", "1").unwrap();
        backend.clear().unwrap();
    }

    let backend = FileBackend::open(&path, Quota::unlimited()).unwrap();
    assert!(backend.is_empty());
}

#[test]
fn test_file_quota_enforced() {
    let temp_dir = TempDir::new().unwrap();
    let backend = FileBackend::open(temp_dir.path().join("store.db"), Quota::bytes(5)).unwrap();

    backend.set("a", "1234").unwrap();
    assert!(backend.set("b", "1").unwrap_err().is_capacity());
    assert_eq!(backend.size(), 5);
}

#[test]
fn test_file_detects_bad_checksum() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.db");

    {
        let backend = FileBackend::open(&path, Quota::unlimited()).unwrap();
        backend.set("key", "value").unwrap();
    }

    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&path, bytes).unwrap();

    let result = FileBackend::open(&path, Quota::unlimited());
    assert!(matches!(result, Err(RecordError::Corruption(_))));
}

#[test]
fn test_file_detects_bad_magic() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.db");
    fs::write(&path, b"NOPE not a snapshot at all").unwrap();

    let result = FileBackend::open(&path, Quota::unlimited());
    assert!(matches!(result, Err(RecordError::Corruption(_))));
}

#[test]
fn test_file_detects_truncation() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.db");

    {
        let backend = FileBackend::open(&path, Quota::unlimited()).unwrap();
        backend.set("key", "value").unwrap();
    }

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

    let result = FileBackend::open(&path, Quota::unlimited());
    assert!(matches!(result, Err(RecordError::Corruption(_))));
}

#[test]
fn test_file_failed_persist_removes_temp_and_rolls_back() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store.db");
    let backend = FileBackend::open(&path, Quota::unlimited()).unwrap();

    // A directory in the snapshot's place makes the final rename fail
    fs::create_dir(&path).unwrap();

    assert!(matches!(backend.set("key", "value"), Err(RecordError::Io(_))));
    assert!(!backend.temp_path().exists());
    assert_eq!(backend.get("key"), None);
    assert_eq!(backend.size(), 0);
}
