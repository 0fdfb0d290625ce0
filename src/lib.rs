//! # recordkv
//!
//! Record-style semantics over a flat string key-value store:
//! - created/modified timestamps per record (created is write-once)
//! - point lookup by caller-supplied id
//! - newest/oldest/smallest/biggest finds by full scan
//! - relaxed or greedy (evict oldest and retry) overflow handling
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       RecordStore                           │
//! │        save / fetch / find / remove / clear / list          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        KeyCodec                             │
//! │          <prefix><sep><id><sep><field>  <->  (id, field)    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │    trait KvBackend      │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Memory    │          │    File     │
//!   │  (RwLock)   │          │ (snapshot)  │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod keys;
pub mod record;
pub mod backend;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RecordError, Result};
pub use config::{Config, OverflowPolicy};
pub use backend::{FileBackend, KvBackend, MemoryBackend, Quota};
pub use record::{Query, Record};
pub use store::{RecordStore, SaveReport};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of recordkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
