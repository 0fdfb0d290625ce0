//! Configuration for recordkv
//!
//! Each `RecordStore` holds its own `Config`, so several independently
//! configured stores can share one backend.

use std::fmt;
use std::str::FromStr;

use crate::error::{RecordError, Result};

/// Main configuration for a RecordStore instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Key Encoding
    // -------------------------------------------------------------------------
    /// Namespace tag prepended to every record key
    pub prefix: String,

    /// Field name used for the payload segment of the key
    pub data_field_name: String,

    /// Delimiter joining prefix, id and field segments
    pub separator: String,

    // -------------------------------------------------------------------------
    // Write Path
    // -------------------------------------------------------------------------
    /// What `save` does when the backend runs out of room
    pub overflow_policy: OverflowPolicy,

    /// Upper bound on greedy evictions per save.
    /// `None` caps at the number of records present when the first write failed.
    pub max_evictions: Option<usize>,
}

/// Overflow policy on write failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Give up and report the failure
    #[default]
    Relaxed,

    /// Evict the oldest record and retry, repeatedly
    Greedy,
}

impl OverflowPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverflowPolicy::Relaxed => "relaxed",
            OverflowPolicy::Greedy => "greedy",
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverflowPolicy {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "relaxed" => Ok(OverflowPolicy::Relaxed),
            "greedy" => Ok(OverflowPolicy::Greedy),
            other => Err(RecordError::Config(format!(
                "unknown overflow policy {:?} (expected \"relaxed\" or \"greedy\")",
                other
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: "db".to_string(),
            data_field_name: "data".to_string(),
            separator: "_".to_string(),
            overflow_policy: OverflowPolicy::Relaxed,
            max_evictions: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that keys built from this config decode unambiguously
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(RecordError::Config("prefix must not be empty".into()));
        }
        if self.separator.is_empty() {
            return Err(RecordError::Config("separator must not be empty".into()));
        }
        if self.data_field_name.is_empty() {
            return Err(RecordError::Config("data field name must not be empty".into()));
        }
        if self.data_field_name.contains(&self.separator) {
            return Err(RecordError::Config(format!(
                "data field name {:?} must not contain the separator {:?}",
                self.data_field_name, self.separator
            )));
        }
        if self.data_field_name == "created" || self.data_field_name == "modified" {
            return Err(RecordError::Config(format!(
                "data field name {:?} collides with a timestamp field",
                self.data_field_name
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the key namespace prefix
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    /// Set the payload field name
    pub fn data_field_name(mut self, name: impl Into<String>) -> Self {
        self.config.data_field_name = name.into();
        self
    }

    /// Set the key separator
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.config.separator = separator.into();
        self
    }

    /// Set the overflow policy
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.config.overflow_policy = policy;
        self
    }

    /// Cap greedy evictions per save
    pub fn max_evictions(mut self, count: usize) -> Self {
        self.config.max_evictions = Some(count);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
