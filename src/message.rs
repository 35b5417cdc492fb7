//! The atomic chat record.
//!
//! A [`Message`] is one `(timestamp, author, text)` triple recovered from a
//! single export line or tabular row. Messages are immutable once built; the
//! derived [`length`](Message::length) and [`content_hash`](Message::content_hash)
//! are computed on demand.
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use kakaopack::Message;
//!
//! let ts = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap().and_hms_opt(16, 25, 0).unwrap();
//! let msg = Message::new(ts, "철수", "안녕");
//!
//! assert_eq!(msg.author(), "철수");
//! assert_eq!(msg.length(), 2);
//! assert_eq!(msg.content_hash().len(), 64);
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::hash::hash_fields;

/// Display format used for timestamps in hashes, CSV output and the store.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A normalized chat message.
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | `timestamp` | `NaiveDateTime` | Wall-clock send time, second precision |
/// | `author` | `String` | Display name (free text, not a stable user id) |
/// | `text` | `String` | Raw message body, emoji and markup untouched |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// When the message was sent, as written in the export (no time zone).
    pub timestamp: NaiveDateTime,

    /// Display name of the author.
    pub author: String,

    /// Message body.
    pub text: String,
}

impl Message {
    /// Creates a message. Sub-second precision is discarded.
    pub fn new(timestamp: NaiveDateTime, author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            timestamp: truncate_to_seconds(timestamp),
            author: author.into(),
            text: text.into(),
        }
    }

    /// Returns the timestamp.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Returns the author name.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Returns the message body.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of characters (Unicode scalar values) in the body.
    pub fn length(&self) -> usize {
        self.text.chars().count()
    }

    /// Deterministic fingerprint of `timestamp ‖ author ‖ text`.
    ///
    /// Two messages with the same hash are considered the same message by the
    /// store, regardless of which file they were imported from.
    pub fn content_hash(&self) -> String {
        let ts = self.timestamp.format(TIMESTAMP_FORMAT).to_string();
        hash_fields([ts.as_str(), self.author.as_str(), self.text.as_str()])
    }
}

fn truncate_to_seconds(ts: NaiveDateTime) -> NaiveDateTime {
    use chrono::Timelike;
    ts.with_nanosecond(0).unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 20)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_message_new() {
        let msg = Message::new(ts(16, 25), "철수", "안녕");
        assert_eq!(msg.author(), "철수");
        assert_eq!(msg.text(), "안녕");
        assert_eq!(msg.timestamp(), ts(16, 25));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let msg = Message::new(ts(0, 0), "a", "ㅋㅋ🎉");
        assert_eq!(msg.length(), 3);
    }

    #[test]
    fn test_content_hash_depends_on_all_fields() {
        let base = Message::new(ts(16, 25), "철수", "안녕");
        assert_eq!(base.content_hash(), Message::new(ts(16, 25), "철수", "안녕").content_hash());
        assert_ne!(base.content_hash(), Message::new(ts(16, 26), "철수", "안녕").content_hash());
        assert_ne!(base.content_hash(), Message::new(ts(16, 25), "영희", "안녕").content_hash());
        assert_ne!(base.content_hash(), Message::new(ts(16, 25), "철수", "안녕!").content_hash());
    }

    #[test]
    fn test_subsecond_precision_dropped() {
        use chrono::Timelike;
        let precise = ts(1, 2).with_nanosecond(500_000_000).unwrap();
        let msg = Message::new(precise, "a", "b");
        assert_eq!(msg.timestamp(), ts(1, 2));
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::new(ts(16, 25), "철수", "안녕");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("2024-01-20T16:25:00"));
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }
}
