//! Error types for recordkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using RecordError
pub type Result<T> = std::result::Result<T, RecordError>;

/// Unified error type for recordkv operations
#[derive(Debug, Error)]
pub enum RecordError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Backend Errors
    // -------------------------------------------------------------------------
    #[error("Backing store is unavailable")]
    StoreUnavailable,

    #[error("Capacity exceeded writing {key}: {required} bytes required, limit is {limit}")]
    CapacityExceeded {
        key: String,
        required: usize,
        limit: usize,
    },

    #[error("Snapshot corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Could not make room for record {id} after evicting {} record(s)", evicted.len())]
    EvictionExhausted { id: String, evicted: Vec<String> },

    #[error("Record id must not be empty")]
    EmptyId,

    #[error("Invalid fetch parameter {0:?}: numeric literals are not accepted as ids")]
    InvalidFetchParameter(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RecordError {
    /// True for the failure a full backend raises on `set`
    pub fn is_capacity(&self) -> bool {
        matches!(self, RecordError::CapacityExceeded { .. })
    }
}
