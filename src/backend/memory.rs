//! In-memory backend
//!
//! BTreeMap-based store with RwLock for concurrency. Keys enumerate in
//! sorted order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::error::{RecordError, Result};

use super::{KvBackend, Quota};

/// Entries plus their accounted size, guarded together
#[derive(Debug, Default)]
pub(super) struct Entries {
    pub(super) map: BTreeMap<String, String>,
    pub(super) size: usize,
}

impl Entries {
    pub(super) fn from_map(map: BTreeMap<String, String>) -> Self {
        let size = map.iter().map(|(k, v)| Quota::entry_size(k, v)).sum();
        Self { map, size }
    }

    /// Insert under the quota; returns the value that was replaced
    pub(super) fn insert(&mut self, quota: &Quota, key: &str, value: &str) -> Result<Option<String>> {
        let previous = self.map.get(key).map(String::as_str);
        self.size = quota.admit(self.size, key, value, previous)?;
        Ok(self.map.insert(key.to_string(), value.to_string()))
    }

    pub(super) fn remove(&mut self, key: &str) -> Option<String> {
        let removed = self.map.remove(key);
        if let Some(old) = &removed {
            self.size -= Quota::entry_size(key, old);
        }
        removed
    }

    /// Undo an `insert`, given what it returned
    pub(super) fn restore(&mut self, key: &str, previous: Option<String>) {
        self.remove(key);
        if let Some(old) = previous {
            self.size += Quota::entry_size(key, &old);
            self.map.insert(key.to_string(), old);
        }
    }
}

/// RAM-only backend with an optional byte quota
#[derive(Debug)]
pub struct MemoryBackend {
    entries: RwLock<Entries>,
    quota: Quota,
    /// When false every `set` fails, like storage disabled by the host
    available: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty, unlimited backend
    pub fn new() -> Self {
        Self::with_quota(Quota::unlimited())
    }

    pub fn with_quota(quota: Quota) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            quota,
            available: AtomicBool::new(true),
        }
    }

    /// Toggle whether writes are accepted
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Total accounted size in bytes
    pub fn size(&self) -> usize {
        self.entries.read().size
    }

    pub fn len(&self) -> usize {
        self.entries.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn quota(&self) -> Quota {
        self.quota
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().map.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if !self.available.load(Ordering::Relaxed) {
            return Err(RecordError::StoreUnavailable);
        }
        self.entries.write().insert(&self.quota, key, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.entries.write() = Entries::default();
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.read().map.keys().cloned().collect()
    }
}
