//! Filter a chat table by date range, author and keyword.
//!
//! This module provides [`FilterConfig`] for defining filter criteria and
//! [`apply_filters`] for narrowing a [`ChatTable`].
//!
//! # Filter Types
//!
//! | Filter | Method | Description |
//! |--------|--------|-------------|
//! | Date from | [`with_date_from`](FilterConfig::with_date_from) | Messages on or after date |
//! | Date to | [`with_date_to`](FilterConfig::with_date_to) | Messages on or before date (whole day) |
//! | Author | [`with_author`](FilterConfig::with_author) | Messages from any listed author |
//! | Keyword | [`with_keyword`](FilterConfig::with_keyword) | Messages containing any listed keyword |
//!
//! # Examples
//!
//! ```
//! use chrono::NaiveDate;
//! use kakaopack::core::filter::{FilterConfig, apply_filters};
//! use kakaopack::{ChatTable, Message};
//!
//! # fn main() -> kakaopack::Result<()> {
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap().and_hms_opt(12, 0, 0).unwrap();
//! let table = ChatTable::from_messages(vec![
//!     Message::new(day(1), "철수", "새해 복 많이 받아"),
//!     Message::new(day(20), "영희", "점심 먹자"),
//!     Message::new(day(21), "철수", "점심 어디서?"),
//! ]);
//!
//! let config = FilterConfig::new()
//!     .with_date_from("2024-01-15")?
//!     .with_keyword("점심");
//!
//! assert_eq!(apply_filters(table, &config).len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! # Behavior Notes
//!
//! - Author matching is exact; display names are free text
//! - Keyword matching is case-insensitive substring search
//! - Multiple filters are combined with AND logic; lists within one filter with OR

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{KakaopackError, Result};
use crate::message::Message;
use crate::table::ChatTable;

/// Configuration for filtering messages.
///
/// # Examples
///
/// ```
/// use kakaopack::core::filter::FilterConfig;
///
/// # fn main() -> kakaopack::Result<()> {
/// let config = FilterConfig::new()
///     .with_date_from("2024-01-01")?
///     .with_date_to("2024-12-31")?
///     .with_author("철수")
///     .with_keywords_csv("점심, 저녁");
///
/// assert_eq!(config.keywords, vec!["점심", "저녁"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Include only messages on or after this day.
    pub date_from: Option<NaiveDate>,

    /// Include only messages on or before this day.
    pub date_to: Option<NaiveDate>,

    /// Include only messages from these authors. Empty means everyone.
    pub authors: Vec<String>,

    /// Include only messages containing one of these keywords. Empty means all.
    pub keywords: Vec<String>,
}

impl FilterConfig {
    /// Creates a new empty filter configuration.
    ///
    /// No filters are active by default; all messages pass through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the start date filter (inclusive). Format: `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Returns [`KakaopackError::InvalidDate`] if the format is invalid.
    pub fn with_date_from(mut self, date_str: &str) -> Result<Self> {
        self.date_from = Some(parse_day(date_str)?);
        Ok(self)
    }

    /// Sets the end date filter (inclusive of the whole day). Format: `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Returns [`KakaopackError::InvalidDate`] if the format is invalid.
    pub fn with_date_to(mut self, date_str: &str) -> Result<Self> {
        self.date_to = Some(parse_day(date_str)?);
        Ok(self)
    }

    /// Sets the start day directly.
    #[must_use]
    pub fn with_after(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    /// Sets the end day directly.
    #[must_use]
    pub fn with_before(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    /// Adds an author to the author filter.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    /// Adds a keyword to the keyword filter. Blank keywords are ignored.
    #[must_use]
    pub fn with_keyword(mut self, keyword: impl AsRef<str>) -> Self {
        let keyword = keyword.as_ref().trim();
        if !keyword.is_empty() {
            self.keywords.push(keyword.to_string());
        }
        self
    }

    /// Adds every keyword of a comma-separated list.
    #[must_use]
    pub fn with_keywords_csv(self, list: &str) -> Self {
        list.split(',').fold(self, Self::with_keyword)
    }

    /// Returns `true` if any filter is active.
    pub fn is_active(&self) -> bool {
        self.has_date_filter() || !self.authors.is_empty() || !self.keywords.is_empty()
    }

    /// Returns `true` if date filters are active.
    pub fn has_date_filter(&self) -> bool {
        self.date_from.is_some() || self.date_to.is_some()
    }

    /// Returns `true` if `msg` passes every active filter.
    pub fn matches(&self, msg: &Message) -> bool {
        self.matches_date(msg.timestamp)
            && (self.authors.is_empty() || self.authors.iter().any(|a| *a == msg.author))
            && self.matches_keywords(&msg.text)
    }

    fn matches_date(&self, ts: NaiveDateTime) -> bool {
        let date = ts.date();
        self.date_from.is_none_or(|from| date >= from) && self.date_to.is_none_or(|to| date <= to)
    }

    fn matches_keywords(&self, text: &str) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .any(|kw| text.contains(&kw.to_lowercase()))
    }
}

/// Parses a `YYYY-MM-DD` day.
fn parse_day(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|_| KakaopackError::invalid_date(date_str))
}

/// Returns a table holding only the messages that pass `config`.
///
/// Order and report are preserved. If no filter is active the table is
/// returned unchanged.
pub fn apply_filters(table: ChatTable, config: &FilterConfig) -> ChatTable {
    if !config.is_active() {
        return table;
    }
    table.retain(|msg| config.matches(msg))
}
