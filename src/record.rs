//! Record and query definitions
//!
//! A `Record` is never stored as a unit; it is reassembled from its three
//! flat entries on every fetch.

use std::fmt;
use std::str::FromStr;

use crate::error::{RecordError, Result};

/// A record reassembled from the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Caller-supplied unique id
    pub id: String,

    /// Payload
    pub data: String,

    /// Configured name of the payload field
    pub data_field: String,

    /// Seconds since epoch of the first write.
    /// `None` only while a partial write is visible.
    pub created: Option<u64>,

    /// Seconds since epoch of the latest write
    pub modified: Option<u64>,
}

impl Record {
    /// The payload labelled with its configured field name
    pub fn data_entry(&self) -> (&str, &str) {
        (&self.data_field, &self.data)
    }
}

/// Magic find tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    /// Greatest `modified`
    Newest,
    /// Least `modified`
    Oldest,
    /// Shortest payload
    Smallest,
    /// Longest payload
    Biggest,
}

impl Query {
    pub const ALL: [Query; 4] = [Query::Newest, Query::Oldest, Query::Smallest, Query::Biggest];

    pub fn as_str(&self) -> &'static str {
        match self {
            Query::Newest => "newest",
            Query::Oldest => "oldest",
            Query::Smallest => "smallest",
            Query::Biggest => "biggest",
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Query {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self> {
        Query::ALL
            .into_iter()
            .find(|query| query.as_str() == s)
            .ok_or_else(|| RecordError::InvalidFetchParameter(s.to_string()))
    }
}

/// A parsed `fetch` parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchParam {
    Query(Query),
    Id(String),
}

impl FetchParam {
    /// Resolve a raw fetch parameter.
    ///
    /// Magic tokens win over ids. Numeric-looking literals are rejected:
    /// they must go through `RecordStore::fetch_by_id` instead.
    pub fn parse(param: &str) -> Result<Self> {
        if let Ok(query) = param.parse::<Query>() {
            return Ok(FetchParam::Query(query));
        }
        if looks_numeric(param) {
            return Err(RecordError::InvalidFetchParameter(param.to_string()));
        }
        Ok(FetchParam::Id(param.to_string()))
    }
}

/// Whether a string reads as a number under JavaScript's `Number()` coercion.
///
/// Blank strings coerce to 0 and so count as numeric. Accepted forms are
/// decimal literals with optional sign, fraction and exponent, unsigned
/// `0x`/`0o`/`0b` radix literals, and signed or unsigned `Infinity`.
pub fn looks_numeric(s: &str) -> bool {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return true;
    }

    for (tag, radix) in [("0x", 16), ("0o", 8), ("0b", 2)] {
        let lower = trimmed.get(..2).map(|head| head.to_ascii_lowercase());
        if lower.as_deref() == Some(tag) {
            let digits = &trimmed[2..];
            return !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
        }
    }

    let unsigned = trimmed
        .strip_prefix('+')
        .or_else(|| trimmed.strip_prefix('-'))
        .unwrap_or(trimmed);
    if unsigned == "Infinity" {
        return true;
    }

    // f64::from_str also takes "inf" and "nan", which JavaScript does not
    let decimal_chars = unsigned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    decimal_chars && unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && trimmed.parse::<f64>().is_ok()
}
