//! Record Store
//!
//! Record semantics over a flat `KvBackend`.
//!
//! ## Responsibilities
//! - Spread each record over three keys (data, created, modified)
//! - Keep `created` write-once
//! - Roll back partially written records
//! - Answer newest/oldest/smallest/biggest by full scan
//! - Evict oldest records on overflow when the policy is greedy

use std::time::{SystemTime, UNIX_EPOCH};

use crate::backend::KvBackend;
use crate::config::{Config, OverflowPolicy};
use crate::error::{RecordError, Result};
use crate::keys::{Field, KeyCodec};
use crate::record::{FetchParam, Query, Record};

/// Key written and removed by `capable()`; outside any record namespace
pub const PROBE_KEY: &str = "__recordkv_probe__";

/// Outcome of a successful save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// This save wrote the `created` entry (first write for the id)
    pub created: bool,

    /// Ids removed by greedy eviction, oldest first
    pub evicted: Vec<String>,
}

/// The main record store
///
/// ## Concurrency
/// All methods take `&self`, but nothing here serializes read-modify-write
/// sequences. Two writers sharing a backend can both see "no created entry"
/// or both pick the same eviction victim.
pub struct RecordStore<B: KvBackend> {
    backend: B,
    config: Config,
    codec: KeyCodec,
}

impl<B: KvBackend> RecordStore<B> {
    /// Create a store over `backend`, validating `config`
    pub fn new(backend: B, config: Config) -> Result<Self> {
        config.validate()?;
        let codec = KeyCodec::new(&config);
        Ok(Self {
            backend,
            config,
            codec,
        })
    }

    /// Create a store with the default configuration
    pub fn with_defaults(backend: B) -> Self {
        let config = Config::default();
        let codec = KeyCodec::new(&config);
        Self {
            backend,
            config,
            codec,
        }
    }

    // =========================================================================
    // Capability
    // =========================================================================

    /// Whether the backend currently accepts writes.
    ///
    /// A full backend reports `false` here too.
    pub fn capable(&self) -> bool {
        match self.probe() {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, "capability probe failed");
                false
            }
        }
    }

    /// Write and remove the probe key
    fn probe(&self) -> Result<()> {
        self.backend.set(PROBE_KEY, PROBE_KEY)?;
        if let Err(e) = self.backend.remove(PROBE_KEY) {
            tracing::warn!(error = %e, "failed to remove capability probe key");
        }
        Ok(())
    }

    // =========================================================================
    // Write Path
    // =========================================================================

    /// Save `data` under `id`.
    ///
    /// `custom_time` (seconds since epoch) replaces the current time for
    /// `modified`, and for `created` when this is the first write.
    ///
    /// Steps:
    /// 1. Reject an empty id (`EmptyId`)
    /// 2. Probe the backend; a failed probe means `StoreUnavailable` and
    ///    nothing is written. Under the greedy policy a full backend passes.
    /// 3. Write data, modified, then created if absent
    /// 4. On failure remove all three entries
    /// 5. Greedy policy: evict the oldest record and go back to 3
    pub fn save(&self, id: &str, data: &str, custom_time: Option<u64>) -> Result<SaveReport> {
        if id.is_empty() {
            return Err(RecordError::EmptyId);
        }

        if let Err(e) = self.probe() {
            let greedy = self.config.overflow_policy == OverflowPolicy::Greedy;
            if !(greedy && e.is_capacity()) {
                tracing::debug!(id, error = %e, "backend unavailable, nothing saved");
                return Err(RecordError::StoreUnavailable);
            }
        }

        let timestamp = custom_time.unwrap_or_else(now_secs);
        let mut evicted = Vec::new();
        let mut eviction_cap = self.config.max_evictions;

        loop {
            let err = match self.write_record(id, data, timestamp) {
                Ok(created) => {
                    tracing::debug!(id, timestamp, created, evictions = evicted.len(), "saved record");
                    return Ok(SaveReport { created, evicted });
                }
                Err(e) => e,
            };

            tracing::warn!(id, error = %err, "write failed, rolling back partial record");
            self.remove(id)?;

            if !err.is_capacity() || self.config.overflow_policy == OverflowPolicy::Relaxed {
                return Err(err);
            }

            let cap = *eviction_cap.get_or_insert_with(|| self.len());
            if evicted.len() >= cap {
                return Err(RecordError::EvictionExhausted {
                    id: id.to_string(),
                    evicted,
                });
            }

            let Some(victim) = self.find_oldest()? else {
                return Err(RecordError::EvictionExhausted {
                    id: id.to_string(),
                    evicted,
                });
            };

            tracing::info!(id, victim = %victim, "evicting oldest record to make room");
            self.remove(&victim)?;
            evicted.push(victim);
        }
    }

    /// One write attempt. Returns whether `created` was written.
    fn write_record(&self, id: &str, data: &str, timestamp: u64) -> Result<bool> {
        let [data_key, created_key, modified_key] = self.codec.record_keys(id);
        let stamp = timestamp.to_string();

        self.backend.set(&data_key, data)?;
        self.backend.set(&modified_key, &stamp)?;

        if self.backend.get(&created_key).is_some() {
            return Ok(false);
        }
        self.backend.set(&created_key, &stamp)?;
        Ok(true)
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Fetch by magic token or literal id.
    ///
    /// Numeric-looking literals are rejected with `InvalidFetchParameter`;
    /// use `fetch_by_id` for ids such as `"42"`.
    pub fn fetch(&self, param: &str) -> Result<Option<Record>> {
        match FetchParam::parse(param)? {
            FetchParam::Query(query) => self.fetch_by_query(query),
            FetchParam::Id(id) => self.fetch_by_id(&id),
        }
    }

    /// Fetch a record by id. `None` if it has no data entry.
    pub fn fetch_by_id(&self, id: &str) -> Result<Option<Record>> {
        let [data_key, created_key, modified_key] = self.codec.record_keys(id);

        let Some(data) = self.backend.get(&data_key) else {
            return Ok(None);
        };

        Ok(Some(Record {
            id: id.to_string(),
            data,
            data_field: self.config.data_field_name.clone(),
            created: self.read_timestamp(&created_key),
            modified: self.read_timestamp(&modified_key),
        }))
    }

    /// Resolve a magic token and fetch the matching record
    pub fn fetch_by_query(&self, query: Query) -> Result<Option<Record>> {
        match self.find(query)? {
            Some(id) => self.fetch_by_id(&id),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Finds
    // =========================================================================

    /// Id matching a magic token, or `None` if the namespace holds no records
    pub fn find(&self, query: Query) -> Result<Option<String>> {
        let found = match query {
            Query::Newest => self.scan_best(Field::Modified, |candidate, best| candidate > best),
            Query::Oldest => self.scan_best(Field::Modified, |candidate, best| candidate < best),
            Query::Smallest => self.scan_best(Field::Data, |candidate, best| candidate < best),
            Query::Biggest => self.scan_best(Field::Data, |candidate, best| candidate > best),
        };
        tracing::debug!(query = %query, found = ?found, "find");
        Ok(found)
    }

    pub fn find_newest(&self) -> Result<Option<String>> {
        self.find(Query::Newest)
    }

    pub fn find_oldest(&self) -> Result<Option<String>> {
        self.find(Query::Oldest)
    }

    pub fn find_smallest(&self) -> Result<Option<String>> {
        self.find(Query::Smallest)
    }

    pub fn find_biggest(&self) -> Result<Option<String>> {
        self.find(Query::Biggest)
    }

    /// Scan every key holding `field` and keep the id whose rank beats the
    /// running best. The first candidate always wins; ties keep the earlier key.
    fn scan_best<F>(&self, field: Field, beats: F) -> Option<String>
    where
        F: Fn(u64, u64) -> bool,
    {
        let mut best: Option<(String, u64)> = None;

        for key in self.backend.keys() {
            let Some(id) = self.codec.id_for(&key, field) else {
                continue;
            };
            let Some(rank) = self.rank(&key, field) else {
                continue;
            };

            let replace = match &best {
                None => true,
                Some((_, best_rank)) => beats(rank, *best_rank),
            };
            if replace {
                best = Some((id, rank));
            }
        }

        best.map(|(id, _)| id)
    }

    /// Timestamp for `modified`, payload length for data
    fn rank(&self, key: &str, field: Field) -> Option<u64> {
        match field {
            Field::Data => self
                .backend
                .get(key)
                .map(|data| data.encode_utf16().count() as u64),
            Field::Created | Field::Modified => self.read_timestamp(key),
        }
    }

    fn read_timestamp(&self, key: &str) -> Option<u64> {
        let raw = self.backend.get(key)?;
        match raw.trim().parse::<u64>() {
            Ok(ts) => Some(ts),
            Err(_) => {
                tracing::warn!(key, value = %raw, "ignoring unparseable timestamp");
                None
            }
        }
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// Every id with its created timestamp, in backend key order
    pub fn list_all_created(&self) -> Result<Vec<(String, u64)>> {
        Ok(self.list_timestamps(Field::Created))
    }

    /// Every id with its modified timestamp, in backend key order
    pub fn list_all_modified(&self) -> Result<Vec<(String, u64)>> {
        Ok(self.list_timestamps(Field::Modified))
    }

    fn list_timestamps(&self, field: Field) -> Vec<(String, u64)> {
        self.backend
            .keys()
            .into_iter()
            .filter_map(|key| {
                let id = self.codec.id_for(&key, field)?;
                let ts = self.read_timestamp(&key)?;
                Some((id, ts))
            })
            .collect()
    }

    /// Ids of every record with a data entry, in backend key order
    pub fn ids(&self) -> Vec<String> {
        self.backend
            .keys()
            .into_iter()
            .filter_map(|key| self.codec.id_for(&key, Field::Data))
            .collect()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Remove all three entries for `id`. Removing a missing id is a no-op.
    pub fn remove(&self, id: &str) -> Result<()> {
        for key in self.codec.record_keys(id) {
            self.backend.remove(&key)?;
        }
        tracing::debug!(id, "removed record");
        Ok(())
    }

    /// Wipe the whole backend, including keys outside this prefix
    pub fn clear_all(&self) -> Result<()> {
        self.backend.clear()?;
        tracing::info!("cleared backing store");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// Current time truncated to whole seconds
fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
