//! Configuration types for the parser and the store.
//!
//! This module provides plain configuration structs for library usage,
//! without any CLI framework dependencies. Every struct has a sensible
//! [`Default`] and `with_*` builder methods.
//!
//! - [`ParserConfig`] - line parsing, date fallback and tabular fallback settings
//! - [`StoreConfig`] - SQLite store location and timeouts
//!
//! # Example
//!
//! ```rust
//! use kakaopack::config::{ContinuationPolicy, ParserConfig};
//! use kakaopack::parser::KakaoParser;
//!
//! let config = ParserConfig::new()
//!     .with_min_line_rows(5)
//!     .with_continuation(ContinuationPolicy::Merge);
//!
//! let parser = KakaoParser::with_config(config);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What to do with a non-empty line that matches no pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContinuationPolicy {
    /// Discard the line. Multi-line messages keep only their first line.
    #[default]
    Drop,
    /// Append the line to the previous message's text, separated by `\n`.
    Merge,
}

/// Which date to use for a time-only line seen before any date header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFallback {
    /// The local date at normalization time. Replaying the same file on a
    /// different day yields different timestamps for these lines.
    #[default]
    Today,
    /// A caller-supplied date.
    Fixed(NaiveDate),
    /// Drop the line.
    Skip,
}

/// Configuration for export parsing.
///
/// # Example
///
/// ```rust
/// use kakaopack::config::{DateFallback, ParserConfig};
/// use chrono::NaiveDate;
///
/// let config = ParserConfig::new()
///     .with_date_fallback(DateFallback::Fixed(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
/// assert_eq!(config.min_line_rows, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Line parsing yielding fewer rows than this triggers the tabular fallback (default: 10)
    pub min_line_rows: usize,

    /// Number of leading bytes inspected by the encoding detector (default: 64KB)
    pub encoding_sample_len: usize,

    /// Handling of unmatched lines (default: drop)
    pub continuation: ContinuationPolicy,

    /// Date used before the first date header (default: today)
    pub date_fallback: DateFallback,

    /// Delimiters tried by the tabular fallback, in order (default: `,` tab `;` `|`)
    pub delimiters: Vec<u8>,

    /// Records read to validate a delimiter/encoding combination (default: 5)
    pub prefix_rows: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            min_line_rows: 10,
            encoding_sample_len: 64 * 1024, // 64KB
            continuation: ContinuationPolicy::Drop,
            date_fallback: DateFallback::Today,
            delimiters: vec![b',', b'\t', b';', b'|'],
            prefix_rows: 5,
        }
    }
}

impl ParserConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum-viable row count for line parsing.
    #[must_use]
    pub fn with_min_line_rows(mut self, rows: usize) -> Self {
        self.min_line_rows = rows;
        self
    }

    /// Sets how many leading bytes the encoding detector inspects.
    #[must_use]
    pub fn with_encoding_sample_len(mut self, len: usize) -> Self {
        self.encoding_sample_len = len.max(1);
        self
    }

    /// Sets the continuation-line policy.
    #[must_use]
    pub fn with_continuation(mut self, policy: ContinuationPolicy) -> Self {
        self.continuation = policy;
        self
    }

    /// Sets the date fallback policy.
    #[must_use]
    pub fn with_date_fallback(mut self, fallback: DateFallback) -> Self {
        self.date_fallback = fallback;
        self
    }

    /// Replaces the delimiter candidates of the tabular fallback.
    #[must_use]
    pub fn with_delimiters(mut self, delimiters: impl Into<Vec<u8>>) -> Self {
        self.delimiters = delimiters.into();
        self
    }

    /// Sets how many records validate a tabular layout.
    #[must_use]
    pub fn with_prefix_rows(mut self, rows: usize) -> Self {
        self.prefix_rows = rows.max(1);
        self
    }
}

/// Configuration for the SQLite store.
///
/// # Example
///
/// ```rust
/// use kakaopack::config::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::new("chats.db").with_busy_timeout(Duration::from_secs(10));
/// assert_eq!(config.path.to_str(), Some("chats.db"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file; `:memory:` opens a private in-memory database (default: `kakaopack.db`)
    pub path: PathBuf,

    /// How long a statement waits on a locked database (default: 5s)
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("kakaopack.db"),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreConfig {
    /// Creates a configuration for the given database path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Creates a configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    /// Sets the busy timeout.
    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Returns `true` when the configuration points at an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == ":memory:"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_config_default() {
        let config = ParserConfig::default();
        assert_eq!(config.min_line_rows, 10);
        assert_eq!(config.continuation, ContinuationPolicy::Drop);
        assert_eq!(config.date_fallback, DateFallback::Today);
        assert_eq!(config.delimiters, vec![b',', b'\t', b';', b'|']);
    }

    #[test]
    fn test_parser_config_builder() {
        let config = ParserConfig::new()
            .with_min_line_rows(3)
            .with_continuation(ContinuationPolicy::Merge)
            .with_date_fallback(DateFallback::Skip)
            .with_delimiters(*b";")
            .with_prefix_rows(0);

        assert_eq!(config.min_line_rows, 3);
        assert_eq!(config.continuation, ContinuationPolicy::Merge);
        assert_eq!(config.date_fallback, DateFallback::Skip);
        assert_eq!(config.delimiters, vec![b';']);
        assert_eq!(config.prefix_rows, 1);
    }

    #[test]
    fn test_store_config() {
        assert!(StoreConfig::in_memory().is_in_memory());
        assert!(!StoreConfig::new("a.db").is_in_memory());
        assert_eq!(StoreConfig::default().busy_timeout, Duration::from_secs(5));
    }
}
