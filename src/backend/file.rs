//! File-backed backend
//!
//! Keeps the working set in RAM and rewrites a snapshot file after every
//! mutation. Snapshots are written to a sibling temp file, fsynced and
//! renamed over the old one, so a crash leaves either the old or the new
//! snapshot on disk.
//!
//! ## File Format
//! ```text
//! ┌──────────┬───────────┬───────────┬────────────┬──────────────────┐
//! │Magic (4) │Version (2)│ CRC32 (4) │ Len (8)    │ Payload          │
//! │ "RKVS"   │           │ of payload│            │ bincode(map)     │
//! └──────────┴───────────┴───────────┴────────────┴──────────────────┘
//! ```

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::{RecordError, Result};

use super::memory::Entries;
use super::{KvBackend, Quota};

/// Magic bytes at the start of every snapshot
pub const MAGIC: &[u8; 4] = b"RKVS";

/// Snapshot format version
pub const VERSION: u16 = 1;

/// Magic (4) + version (2) + crc (4) + payload length (8)
pub const HEADER_SIZE: usize = 18;

/// Durable backend persisted as a single snapshot file
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    entries: RwLock<Entries>,
    quota: Quota,
}

impl FileBackend {
    /// Open the snapshot at `path`, or start empty if it does not exist
    pub fn open(path: impl AsRef<Path>, quota: Quota) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let map = if path.exists() {
            let map = Self::load(&path)?;
            tracing::debug!(path = %path.display(), entries = map.len(), "loaded snapshot");
            map
        } else {
            BTreeMap::new()
        };

        let entries = Entries::from_map(map);
        if let Some(limit) = quota.limit() {
            if entries.size > limit {
                tracing::warn!(
                    path = %path.display(),
                    size = entries.size,
                    limit,
                    "snapshot already exceeds quota; writes will fail until space is freed"
                );
            }
        }

        Ok(Self {
            path,
            entries: RwLock::new(entries),
            quota,
        })
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
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

    /// Read and verify a snapshot file
    fn load(path: &Path) -> Result<BTreeMap<String, String>> {
        let mut bytes = Vec::new();
        File::open(path)?.read_to_end(&mut bytes)?;

        if bytes.len() < HEADER_SIZE {
            return Err(RecordError::Corruption(format!(
                "snapshot is {} bytes, shorter than its header",
                bytes.len()
            )));
        }

        if &bytes[0..4] != MAGIC {
            return Err(RecordError::Corruption(format!(
                "invalid snapshot magic: expected RKVS, got {:?}",
                &bytes[0..4]
            )));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(RecordError::Corruption(format!(
                "unsupported snapshot version: {}",
                version
            )));
        }

        let stored_crc = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&bytes[10..18]);
        let payload_len = u64::from_le_bytes(len_bytes) as usize;

        let payload = &bytes[HEADER_SIZE..];
        if payload.len() != payload_len {
            return Err(RecordError::Corruption(format!(
                "payload length mismatch: header says {}, found {}",
                payload_len,
                payload.len()
            )));
        }

        let actual_crc = crc32fast::hash(payload);
        if actual_crc != stored_crc {
            return Err(RecordError::Corruption(format!(
                "checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored_crc, actual_crc
            )));
        }

        bincode::deserialize(payload).map_err(|e| RecordError::Serialization(e.to_string()))
    }

    /// Path of the temp file snapshots are staged in
    pub fn temp_path(&self) -> PathBuf {
        let mut tmp_name: OsString = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        PathBuf::from(tmp_name)
    }

    /// Write the map to a temp file and rename it over the snapshot.
    /// The temp file does not outlive a failed attempt.
    fn persist(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let tmp_path = self.temp_path();

        let result = self.write_snapshot(&tmp_path, map);
        if result.is_err() && tmp_path.exists() {
            if let Err(e) = fs::remove_file(&tmp_path) {
                tracing::warn!(path = %tmp_path.display(), error = %e, "failed to remove temp snapshot");
            }
        }
        result
    }

    fn write_snapshot(&self, tmp_path: &Path, map: &BTreeMap<String, String>) -> Result<()> {
        let payload =
            bincode::serialize(map).map_err(|e| RecordError::Serialization(e.to_string()))?;
        let crc = crc32fast::hash(&payload);

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(tmp_path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&crc.to_le_bytes())?;
        writer.write_all(&(payload.len() as u64).to_le_bytes())?;
        writer.write_all(&payload)?;
        writer.flush()?;

        let file = writer.into_inner().map_err(|e| {
            RecordError::Io(std::io::Error::new(
                e.error().kind(),
                format!("failed to flush snapshot: {}", e.error()),
            ))
        })?;
        file.sync_all()?;

        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }
}

impl KvBackend for FileBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().map.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write();
        let previous = entries.insert(&self.quota, key, value)?;

        if let Err(e) = self.persist(&entries.map) {
            entries.restore(key, previous);
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write();
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };

        if let Err(e) = self.persist(&entries.map) {
            entries.restore(key, Some(previous));
            return Err(e);
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write();
        let previous = std::mem::take(&mut *entries);

        if let Err(e) = self.persist(&entries.map) {
            *entries = previous;
            return Err(e);
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.read().map.keys().cloned().collect()
    }
}
