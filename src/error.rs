//! Unified error types for kakaopack.
//!
//! This module provides a single [`KakaopackError`] enum that covers all error
//! cases in the library, following the pattern used by crates like `reqwest`,
//! `serde_json`, and `csv`.
//!
//! # Error Handling Philosophy
//!
//! - **Per-line problems are not errors.** A line that matches nothing, or a
//!   tabular row whose date cannot be read, is dropped and counted in the
//!   [`ParseReport`](crate::table::ParseReport).
//! - **Per-file problems are.** When no line pattern and no tabular layout
//!   produces usable rows, the whole import fails with a single descriptive
//!   error. No partial table is returned.
//! - **Store writes never fail silently.** Every database failure surfaces as
//!   [`KakaopackError::Database`] after the surrounding transaction rolled back.

use std::io;

use thiserror::Error;

/// A specialized [`Result`] type for kakaopack operations.
///
/// # Example
///
/// ```rust
/// use kakaopack::error::Result;
/// use kakaopack::Message;
///
/// fn my_function() -> Result<Vec<Message>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, KakaopackError>;

/// The error type for all kakaopack operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KakaopackError {
    /// An I/O error occurred.
    ///
    /// This typically happens when:
    /// - The input file doesn't exist
    /// - Permission denied
    /// - Disk is full (when writing output)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Neither the line parser nor any tabular layout produced usable rows.
    #[error("Unsupported file format ({name}): {reason}")]
    UnsupportedFormat {
        /// Declared name of the input (file name or caller-supplied label)
        name: String,
        /// Why the last attempted interpretation was rejected
        reason: String,
    },

    /// Tabular data parsed, but required columns are absent after alias mapping.
    #[error("Missing required column(s): {}", columns.join(", "))]
    MissingColumns {
        /// Canonical names of the missing columns (`timestamp`, `author`, `text`)
        columns: Vec<&'static str>,
    },

    /// Invalid date supplied by the caller (filters, fixed date context).
    #[error("Invalid date '{input}'. Expected format: {expected}")]
    InvalidDate {
        /// The invalid date string that was provided
        input: String,
        /// Expected format description
        expected: &'static str,
    },

    /// CSV reading or writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[cfg(feature = "json-output")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite error raised by the store.
    #[cfg(feature = "store")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A store lookup expected a row that does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record (`room`, `file`)
        entity: &'static str,
        /// Identifier that was looked up
        id: i64,
    },

    /// UTF-8 encoding error while converting generated output.
    #[error("UTF-8 encoding error in {context}: {source}")]
    Utf8 {
        /// Description of where the error occurred
        context: String,
        /// The underlying UTF-8 error
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl From<std::string::FromUtf8Error> for KakaopackError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        KakaopackError::Utf8 {
            context: "output conversion".to_string(),
            source: err,
        }
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl KakaopackError {
    /// Creates an unsupported-format error.
    pub fn unsupported_format(name: impl Into<String>, reason: impl Into<String>) -> Self {
        KakaopackError::UnsupportedFormat {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing-columns error.
    pub fn missing_columns(columns: Vec<&'static str>) -> Self {
        KakaopackError::MissingColumns { columns }
    }

    /// Creates an invalid date error.
    pub fn invalid_date(input: impl Into<String>) -> Self {
        KakaopackError::InvalidDate {
            input: input.into(),
            expected: "YYYY-MM-DD",
        }
    }

    /// Creates a not-found error.
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        KakaopackError::NotFound { entity, id }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, KakaopackError::Io(_))
    }

    /// Returns `true` if the input could not be interpreted in any known format.
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, KakaopackError::UnsupportedFormat { .. })
    }

    /// Returns `true` if tabular input lacked required columns.
    pub fn is_missing_columns(&self) -> bool {
        matches!(self, KakaopackError::MissingColumns { .. })
    }

    /// Returns `true` if this is a date-related error.
    pub fn is_invalid_date(&self) -> bool {
        matches!(self, KakaopackError::InvalidDate { .. })
    }

    /// Returns `true` if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, KakaopackError::NotFound { .. })
    }
}
