//! The canonical message table.
//!
//! A [`ChatTable`] is an immutable, timestamp-sorted list of [`Message`]s plus
//! a [`ParseReport`] describing how it was produced. Sorting is stable, so
//! messages sharing a timestamp keep the order they were read in.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use kakaopack::{ChatTable, Message};
//!
//! let day = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
//! let table = ChatTable::from_messages(vec![
//!     Message::new(day.and_hms_opt(16, 26, 0).unwrap(), "영희", "ㅇㅇ"),
//!     Message::new(day.and_hms_opt(16, 25, 0).unwrap(), "철수", "안녕"),
//! ]);
//!
//! assert_eq!(table.messages()[0].author, "철수");
//! assert_eq!(table.participants().len(), 2);
//! ```

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Which pipeline produced a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseSource {
    /// Line-oriented export text.
    #[default]
    Lines,
    /// Delimited-table fallback.
    Tabular,
    /// Rows loaded from the store.
    Store,
}

impl fmt::Display for ParseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseSource::Lines => write!(f, "lines"),
            ParseSource::Tabular => write!(f, "tabular"),
            ParseSource::Store => write!(f, "store"),
        }
    }
}

/// Counters collected while building a table.
///
/// Per-line and per-row problems are never errors; they end up here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseReport {
    /// Pipeline that produced the rows.
    pub source: ParseSource,
    /// Name of the encoding the text was decoded with.
    pub encoding: String,
    /// Whether undecodable bytes were replaced.
    pub lossy: bool,
    /// Physical lines read by the line parser.
    pub lines_total: usize,
    /// Lines that matched a message layout.
    pub lines_matched: usize,
    /// Date headers seen.
    pub date_headers: usize,
    /// Unmatched lines appended to a previous message.
    pub lines_merged: usize,
    /// Rows whose time token was unreadable (noon sentinel).
    pub sentinel_count: usize,
    /// Rows dated by the fallback policy.
    pub defaulted_date_count: usize,
    /// Lines or rows that did not become messages.
    pub rows_dropped: usize,
}

/// A time-ordered message table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTable {
    messages: Vec<Message>,
    report: ParseReport,
}

impl ChatTable {
    /// Builds a table with a default report.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self::with_report(messages, ParseReport::default())
    }

    /// Builds a table, stably sorting `messages` by timestamp.
    pub fn with_report(mut messages: Vec<Message>, report: ParseReport) -> Self {
        messages.sort_by_key(|m| m.timestamp);
        Self { messages, report }
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if there are no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages in ascending timestamp order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Iterates over the messages.
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Consumes the table, returning its messages.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// How the table was produced.
    pub fn report(&self) -> &ParseReport {
        &self.report
    }

    /// Distinct authors, sorted.
    pub fn participants(&self) -> BTreeSet<&str> {
        self.messages.iter().map(|m| m.author.as_str()).collect()
    }

    /// First and last timestamps, or `None` for an empty table.
    pub fn date_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.messages.first()?.timestamp, self.messages.last()?.timestamp))
    }

    /// Returns a table holding only the messages that satisfy `keep`.
    ///
    /// Order and report are preserved.
    #[must_use]
    pub fn retain(mut self, keep: impl FnMut(&Message) -> bool) -> Self {
        self.messages.retain(keep);
        self
    }
}

impl<'a> IntoIterator for &'a ChatTable {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

impl IntoIterator for ChatTable {
    type Item = Message;
    type IntoIter = std::vec::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 20)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_sorted_by_timestamp() {
        let table = ChatTable::from_messages(vec![
            Message::new(at(10, 0), "b", "2"),
            Message::new(at(9, 0), "a", "1"),
            Message::new(at(11, 0), "c", "3"),
        ]);
        let texts: Vec<_> = table.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["1", "2", "3"]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let table = ChatTable::from_messages(vec![
            Message::new(at(9, 0), "a", "first"),
            Message::new(at(8, 0), "z", "earlier"),
            Message::new(at(9, 0), "b", "second"),
        ]);
        let texts: Vec<_> = table.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["earlier", "first", "second"]);
    }

    #[test]
    fn test_participants_and_range() {
        let table = ChatTable::from_messages(vec![
            Message::new(at(9, 0), "영희", "a"),
            Message::new(at(10, 0), "철수", "b"),
            Message::new(at(11, 0), "영희", "c"),
        ]);
        assert_eq!(table.participants().into_iter().collect::<Vec<_>>(), ["영희", "철수"]);
        assert_eq!(table.date_range(), Some((at(9, 0), at(11, 0))));
    }

    #[test]
    fn test_empty_table() {
        let table = ChatTable::default();
        assert!(table.is_empty());
        assert_eq!(table.date_range(), None);
        assert!(table.participants().is_empty());
    }

    #[test]
    fn test_retain_keeps_order_and_report() {
        let report = ParseReport {
            source: ParseSource::Tabular,
            ..ParseReport::default()
        };
        let table = ChatTable::with_report(
            vec![
                Message::new(at(9, 0), "a", "x"),
                Message::new(at(10, 0), "b", "y"),
            ],
            report,
        )
        .retain(|m| m.author == "b");
        assert_eq!(table.len(), 1);
        assert_eq!(table.report().source, ParseSource::Tabular);
    }

    #[test]
    fn test_parse_source_display() {
        assert_eq!(ParseSource::Lines.to_string(), "lines");
        assert_eq!(ParseSource::Tabular.to_string(), "tabular");
    }
}
