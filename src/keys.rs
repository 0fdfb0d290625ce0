//! Key encoding
//!
//! Every record is spread across three flat keys:
//!
//! ```text
//! <prefix><sep><id><sep><data_field_name>  -> payload
//! <prefix><sep><id><sep>created            -> seconds since epoch
//! <prefix><sep><id><sep>modified           -> seconds since epoch
//! ```
//!
//! Decoding strips the leading `prefix + sep` and splits the remainder at its
//! last separator, so an id may itself contain the separator, the prefix or a
//! field name.

use crate::config::Config;

pub const CREATED_FIELD: &str = "created";
pub const MODIFIED_FIELD: &str = "modified";

/// The three per-record fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Data,
    Created,
    Modified,
}

/// A decoded record key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKey {
    pub id: String,
    pub field: Field,
}

/// Encodes and decodes record keys for one configuration
#[derive(Debug, Clone)]
pub struct KeyCodec {
    /// `prefix + separator`, precomputed for decoding
    head: String,
    separator: String,
    data_field_name: String,
}

impl KeyCodec {
    pub fn new(config: &Config) -> Self {
        Self {
            head: format!("{}{}", config.prefix, config.separator),
            separator: config.separator.clone(),
            data_field_name: config.data_field_name.clone(),
        }
    }

    /// Name of a field as it appears in the key
    pub fn field_name(&self, field: Field) -> &str {
        match field {
            Field::Data => &self.data_field_name,
            Field::Created => CREATED_FIELD,
            Field::Modified => MODIFIED_FIELD,
        }
    }

    pub fn encode_key(&self, id: &str, field: Field) -> String {
        let name = self.field_name(field);
        let mut key =
            String::with_capacity(self.head.len() + id.len() + self.separator.len() + name.len());
        key.push_str(&self.head);
        key.push_str(id);
        key.push_str(&self.separator);
        key.push_str(name);
        key
    }

    /// Keys for data, created and modified, in that order
    pub fn record_keys(&self, id: &str) -> [String; 3] {
        [
            self.encode_key(id, Field::Data),
            self.encode_key(id, Field::Created),
            self.encode_key(id, Field::Modified),
        ]
    }

    /// Decode a raw key. Returns `None` for keys outside this namespace.
    pub fn decode_key(&self, key: &str) -> Option<RecordKey> {
        let rest = key.strip_prefix(self.head.as_str())?;
        let (id, name) = rest.rsplit_once(self.separator.as_str())?;
        if id.is_empty() {
            return None;
        }

        let field = if name == self.data_field_name {
            Field::Data
        } else if name == CREATED_FIELD {
            Field::Created
        } else if name == MODIFIED_FIELD {
            Field::Modified
        } else {
            return None;
        };

        Some(RecordKey {
            id: id.to_string(),
            field,
        })
    }

    /// Decode `key` and return its id only if it holds `field`
    pub fn id_for(&self, key: &str, field: Field) -> Option<String> {
        self.decode_key(key)
            .filter(|decoded| decoded.field == field)
            .map(|decoded| decoded.id)
    }
}
