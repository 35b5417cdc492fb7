//! Time-token normalization.
//!
//! Export lines carry either a bare time (`오후 4:25`, `16:25`) that needs the
//! current date context, or a complete date-time (`2024년 1월 20일 오후 4:25`).
//! Both end up as a second-precision [`NaiveDateTime`].
//!
//! Malformed tokens never fail: they resolve to the **sentinel** time 12:00:00
//! on the date context and are flagged [`Confidence::Sentinel`].
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use kakaopack::parsing::timestamp::{Confidence, normalize_time};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
//! let ts = normalize_time("오후 1:23", date);
//! assert_eq!(ts.value.to_string(), "2024-01-20 13:23:00");
//! assert_eq!(ts.confidence, Confidence::Exact);
//!
//! let bad = normalize_time("오후 1:99", date);
//! assert_eq!(bad.value.to_string(), "2024-01-20 12:00:00");
//! assert_eq!(bad.confidence, Confidence::Sentinel);
//! ```

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// How much a normalized timestamp can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Date and time were both read from the input.
    Exact,
    /// Time was read, but the date came from the fallback policy.
    DefaultedDate,
    /// The time token was unreadable; the value is noon on the date context.
    Sentinel,
}

/// A timestamp together with its [`Confidence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedTimestamp {
    /// The resolved wall-clock timestamp.
    pub value: NaiveDateTime,
    /// How the value was obtained.
    pub confidence: Confidence,
}

/// Half-day marker found in a time token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    /// Converts a 12-hour clock hour to 24-hour form.
    fn to_24h(self, hour: u32) -> u32 {
        match (self, hour) {
            (Meridiem::Pm, 12) => 12,
            (Meridiem::Pm, h) => h + 12,
            (Meridiem::Am, 12) => 0,
            (Meridiem::Am, h) => h,
        }
    }
}

const MERIDIEM_MARKERS: &[(&str, Meridiem)] = &[
    ("오전", Meridiem::Am),
    ("오후", Meridiem::Pm),
    ("AM", Meridiem::Am),
    ("PM", Meridiem::Pm),
];

/// The time assigned to lines whose time token cannot be read.
pub fn sentinel_time() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Parses a time token such as `오후 4:25`, `4:25 PM`, `16:25` or `16:25:07`.
///
/// Returns `None` for malformed tokens or values outside 00:00:00–23:59:59
/// after 12-hour conversion.
pub fn parse_time_token(token: &str) -> Option<NaiveTime> {
    let (meridiem, clock) = split_meridiem(token.trim());

    let mut parts = clock.split(':');
    let hour = parse_component(parts.next()?)?;
    let minute = parse_component(parts.next()?)?;
    let second = match parts.next() {
        Some(s) => parse_component(s)?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }

    let hour = match meridiem {
        Some(m) => m.to_24h(hour),
        None => hour,
    };

    if hour > 23 || minute > 59 || second > 59 {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Splits a leading or trailing meridiem marker off the token. Latin
/// markers match in any case.
fn split_meridiem(token: &str) -> (Option<Meridiem>, &str) {
    for &(marker, meridiem) in MERIDIEM_MARKERS {
        let len = marker.len();
        if token.get(..len).is_some_and(|head| head.eq_ignore_ascii_case(marker)) {
            return (Some(meridiem), token[len..].trim());
        }
        let tail_start = token.len().saturating_sub(len);
        if token.get(tail_start..).is_some_and(|tail| tail.eq_ignore_ascii_case(marker)) {
            return (Some(meridiem), token[..tail_start].trim());
        }
    }
    (None, token)
}

fn parse_component(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Resolves a time-only token against a date context.
///
/// Unreadable tokens yield the sentinel noon timestamp instead of an error.
pub fn normalize_time(token: &str, date: NaiveDate) -> NormalizedTimestamp {
    match parse_time_token(token) {
        Some(time) => NormalizedTimestamp {
            value: date.and_time(time),
            confidence: Confidence::Exact,
        },
        None => sentinel(date),
    }
}

/// Resolves a full date-time token, falling back to the sentinel on `context`.
pub fn normalize_datetime(token: &str, context: NaiveDate) -> NormalizedTimestamp {
    match parse_datetime(token) {
        Some(value) => NormalizedTimestamp {
            value,
            confidence: Confidence::Exact,
        },
        None => sentinel(context),
    }
}

fn sentinel(date: NaiveDate) -> NormalizedTimestamp {
    NormalizedTimestamp {
        value: date.and_time(sentinel_time()),
        confidence: Confidence::Sentinel,
    }
}

static KOREAN_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})년\s*(\d{1,2})월\s*(\d{1,2})일\s+(.+)$").expect("valid regex")
});

static DOTTED_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})\.\s*(\d{1,2})\.\s*(\d{1,2})\.?\s+(\S*\s*\d{1,2}:\d{2}(?::\d{2})?\s*\S*)$")
        .expect("valid regex")
});

/// Parses an export-style date-time (`2024년 1월 20일 오후 4:25`,
/// `2024. 1. 20. 오후 4:25`).
pub fn parse_korean_datetime(token: &str) -> Option<NaiveDateTime> {
    let token = token.trim();
    let caps = KOREAN_DATETIME
        .captures(token)
        .or_else(|| DOTTED_DATETIME.captures(token))?;

    let date = ymd(&caps[1], &caps[2], &caps[3])?;
    let time = parse_time_token(&caps[4])?;
    Some(date.and_time(time))
}

/// Builds a date from decimal year, month and day strings.
pub(crate) fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

const FREEFORM_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%Y. %m. %d. %H:%M",
];

const FREEFORM_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y. %m. %d."];

/// General-purpose date-time parsing used when no fixed template matched.
///
/// Accepts RFC 3339 (offset discarded, wall-clock kept), common ISO-like
/// layouts, date-only values (midnight), and export-style Korean date-times.
pub fn parse_datetime(token: &str) -> Option<NaiveDateTime> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    if let Some(value) = parse_korean_datetime(token) {
        return Some(value);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return Some(dt.naive_local());
    }
    for format in FREEFORM_DATETIME_FORMATS {
        if let Ok(value) = NaiveDateTime::parse_from_str(token, format) {
            return Some(value);
        }
    }
    for format in FREEFORM_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(token, format) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    None
}
