//! Backend Module
//!
//! The flat key-value store records are encoded into.
//!
//! ## Contract
//! - `get` / `keys` never fail
//! - `set` may fail with `CapacityExceeded` when the quota would be exceeded,
//!   or with `StoreUnavailable` / `Io` when the store cannot be written
//! - `remove` is idempotent
//! - `clear` wipes the whole namespace, not just one prefix
//! - `keys` order is backend-defined and is what finds use to break ties
//!
//! ## Implementations
//! - `MemoryBackend`: RAM only, optional quota
//! - `FileBackend`: RAM working set persisted as a checksummed snapshot

mod file;
mod memory;

use std::sync::Arc;

use crate::error::{RecordError, Result};

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// Synchronous string-keyed, string-valued store
pub trait KvBackend {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;

    fn keys(&self) -> Vec<String>;
}

impl<T: KvBackend + ?Sized> KvBackend for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }

    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }
}

impl<T: KvBackend + ?Sized> KvBackend for Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }

    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }
}

/// Byte budget over all stored entries (`key.len() + value.len()` each)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    limit: Option<usize>,
}

impl Quota {
    pub fn unlimited() -> Self {
        Self { limit: None }
    }

    pub fn bytes(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Size an entry contributes to the total
    pub fn entry_size(key: &str, value: &str) -> usize {
        key.len() + value.len()
    }

    /// Check that replacing `previous` (if any) with `value` under `key` fits.
    ///
    /// Returns the new total size on success.
    pub fn admit(
        &self,
        current_total: usize,
        key: &str,
        value: &str,
        previous: Option<&str>,
    ) -> Result<usize> {
        let freed = previous.map_or(0, |old| Self::entry_size(key, old));
        let required = current_total - freed + Self::entry_size(key, value);

        match self.limit {
            Some(limit) if required > limit => Err(RecordError::CapacityExceeded {
                key: key.to_string(),
                required,
                limit,
            }),
            _ => Ok(required),
        }
    }
}

impl Default for Quota {
    fn default() -> Self {
        Self::unlimited()
    }
}
