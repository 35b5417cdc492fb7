//! Line classification and tokenization.
//!
//! Every physical line is classified independently by [`classify_line`]. The
//! only state carried between lines is the date context set by date headers,
//! threaded through [`scan_step`] as an explicit accumulator:
//!
//! ```text
//! (ScanState, line) -> (ScanState, LineEvent)
//! ```
//!
//! Supported message layouts, tried in this order (first match wins):
//!
//! | Layout | Example |
//! |--------|---------|
//! | PC bracketed | `[철수] [오후 4:25] 안녕` |
//! | Full date-time | `2024년 1월 20일 오후 4:25, 철수 : 안녕` |
//! | Dotted date-time | `2024. 1. 20. 오후 4:25, 철수 : 안녕` |
//! | Meridiem time | `오후 4:25, 철수 : 안녕` |
//! | 24-hour time | `16:25, 철수 : 안녕` |
//!
//! More anchored layouts come first because the looser ones would also match
//! some of their lines.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ContinuationPolicy;
use crate::parsing::timestamp::ymd;

/// Message layout that matched a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinePattern {
    /// `[author] [time] text`
    Bracketed,
    /// `YYYY년 M월 D일 <meridiem> H:MM, author : text`
    KoreanDateTime,
    /// `YYYY. M. D. <meridiem> H:MM, author : text`
    DottedDateTime,
    /// `<meridiem> H:MM, author : text`
    MeridiemTime,
    /// `H:MM, author : text`
    ClockTime,
}

impl LinePattern {
    /// All layouts in matching priority order.
    pub fn all() -> &'static [LinePattern] {
        &[
            LinePattern::Bracketed,
            LinePattern::KoreanDateTime,
            LinePattern::DottedDateTime,
            LinePattern::MeridiemTime,
            LinePattern::ClockTime,
        ]
    }

    fn regex(self) -> &'static Regex {
        match self {
            LinePattern::Bracketed => &BRACKETED,
            LinePattern::KoreanDateTime => &KOREAN_DATETIME,
            LinePattern::DottedDateTime => &DOTTED_DATETIME,
            LinePattern::MeridiemTime => &MERIDIEM_TIME,
            LinePattern::ClockTime => &CLOCK_TIME,
        }
    }

    /// Whether the time capture already contains a full date.
    fn embeds_date(self) -> bool {
        matches!(
            self,
            LinePattern::KoreanDateTime | LinePattern::DottedDateTime
        )
    }
}

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([^\]]+)\] \[([^\]]+)\] (.+)$").expect("valid regex"));

static KOREAN_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}년 \d{1,2}월 \d{1,2}일 \S+ \d{1,2}:\d{2}), ([^:]+) : (.+)$")
        .expect("valid regex")
});

static DOTTED_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}\. \d{1,2}\. \d{1,2}\.? \S+ \d{1,2}:\d{2}), ([^:]+) : (.+)$")
        .expect("valid regex")
});

static MERIDIEM_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+ \d{1,2}:\d{2}), ([^:]+) : (.+)$").expect("valid regex")
});

static CLOCK_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}:\d{2}), ([^:]+) : (.+)$").expect("valid regex"));

static KOREAN_DATE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-*\s*(\d{4})년 (\d{1,2})월 (\d{1,2})일(?:\s+\S+요일)?\s*-*$").expect("valid regex")
});

static DOTTED_DATE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-*\s*(\d{4})\.\s*(\d{1,2})\.\s*(\d{1,2})\.?(?:\s+\S+요일)?\s*-*$")
        .expect("valid regex")
});

/// A timestamped line with no `author : text` part (joins, leaves, invites).
static SYSTEM_NOTICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{4}년 \d{1,2}월 \d{1,2}일|\d{4}\. \d{1,2}\. \d{1,2}\.?) \S+ \d{1,2}:\d{2}[,:]")
        .expect("valid regex")
});

/// The time part of a matched line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeToken {
    /// A time that needs the date context (`오후 4:25`).
    Time(String),
    /// A complete date-time (`2024년 1월 20일 오후 4:25`).
    DateTime(String),
}

impl TimeToken {
    /// The raw token text.
    pub fn as_str(&self) -> &str {
        match self {
            TimeToken::Time(s) | TimeToken::DateTime(s) => s,
        }
    }
}

/// Classification of a single line, independent of any context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Empty or whitespace-only.
    Blank,
    /// A date header.
    DateHeader(NaiveDate),
    /// A message line.
    Message {
        /// Layout that matched.
        pattern: LinePattern,
        /// Time or date-time token.
        time: TimeToken,
        /// Author display name, trimmed.
        author: String,
        /// Message body, trimmed.
        text: String,
    },
    /// A timestamped notice without an author.
    Notice,
    /// Anything else, including continuation lines of multi-line messages.
    Noise,
}

/// Classifies one line. Leading and trailing whitespace (including `\r`) is ignored.
///
/// # Example
///
/// ```rust
/// use kakaopack::parsing::line::{LineKind, classify_line};
///
/// assert!(matches!(classify_line("2024년 1월 20일 토요일"), LineKind::DateHeader(_)));
/// assert!(matches!(classify_line("오후 4:25, 철수 : 안녕"), LineKind::Message { .. }));
/// assert_eq!(classify_line("철수님이 들어왔습니다."), LineKind::Noise);
/// ```
pub fn classify_line(line: &str) -> LineKind {
    let line = line.trim();
    if line.is_empty() {
        return LineKind::Blank;
    }

    if let Some(date) = parse_date_header(line) {
        return LineKind::DateHeader(date);
    }

    for &pattern in LinePattern::all() {
        let Some(caps) = pattern.regex().captures(line) else {
            continue;
        };
        let (author, time) = match pattern {
            LinePattern::Bracketed => (&caps[1], &caps[2]),
            _ => (&caps[2], &caps[1]),
        };
        let author = author.trim();
        if author.is_empty() {
            // A timestamp with nobody behind it.
            return LineKind::Notice;
        }
        let time = if pattern.embeds_date() {
            TimeToken::DateTime(time.to_string())
        } else {
            TimeToken::Time(time.trim().to_string())
        };
        return LineKind::Message {
            pattern,
            time,
            author: author.to_string(),
            text: caps[3].trim().to_string(),
        };
    }

    if SYSTEM_NOTICE.is_match(line) {
        return LineKind::Notice;
    }

    LineKind::Noise
}

/// Parses a bare date header such as `2024년 1월 20일 토요일`.
///
/// Returns `None` for non-headers and for impossible dates.
pub fn parse_date_header(line: &str) -> Option<NaiveDate> {
    let line = line.trim();
    let caps = KOREAN_DATE_HEADER
        .captures(line)
        .or_else(|| DOTTED_DATE_HEADER.captures(line))?;
    ymd(&caps[1], &caps[2], &caps[3])
}

/// A matched message line before timestamp normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based physical line number.
    pub line_no: usize,
    /// Layout that matched.
    pub pattern: LinePattern,
    /// Time or date-time token.
    pub time: TimeToken,
    /// Date context in effect when the line was read.
    pub date: Option<NaiveDate>,
    /// Author display name.
    pub author: String,
    /// Message body.
    pub text: String,
}

/// State threaded through the line scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanState {
    /// Date set by the most recent date header.
    pub current_date: Option<NaiveDate>,
    /// Number of lines consumed so far.
    pub line_no: usize,
}

/// What a single scan step produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Blank line.
    Blank,
    /// Date context changed.
    DateHeader(NaiveDate),
    /// A message line.
    Record(RawRecord),
    /// A timestamped notice without an author.
    Notice,
    /// An unmatched line, carried so callers may merge it.
    Noise(String),
}

/// One step of the scan: consumes a line, returns the next state and the event.
///
/// This is a pure function; the scan is a fold of it over the lines.
pub fn scan_step(state: ScanState, line: &str) -> (ScanState, LineEvent) {
    let line_no = state.line_no + 1;
    let next = ScanState { line_no, ..state };

    match classify_line(line) {
        LineKind::Blank => (next, LineEvent::Blank),
        LineKind::DateHeader(date) => (
            ScanState {
                current_date: Some(date),
                line_no,
            },
            LineEvent::DateHeader(date),
        ),
        LineKind::Message {
            pattern,
            time,
            author,
            text,
        } => (
            next,
            LineEvent::Record(RawRecord {
                line_no,
                pattern,
                time,
                date: state.current_date,
                author,
                text,
            }),
        ),
        LineKind::Notice => (next, LineEvent::Notice),
        LineKind::Noise => (next, LineEvent::Noise(line.trim().to_string())),
    }
}

/// Per-line counters collected by [`tokenize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCounts {
    /// Physical lines read.
    pub total: usize,
    /// Blank lines.
    pub blank: usize,
    /// Date headers.
    pub date_headers: usize,
    /// Lines that matched a message layout.
    pub matched: usize,
    /// Timestamped notices.
    pub notices: usize,
    /// Unmatched lines that were dropped.
    pub dropped: usize,
    /// Unmatched lines appended to the previous message.
    pub merged: usize,
}

/// Output of [`tokenize`].
#[derive(Debug, Clone, Default)]
pub struct Tokenized {
    /// Matched records in encounter order.
    pub records: Vec<RawRecord>,
    /// Date context after the last line.
    pub final_date: Option<NaiveDate>,
    /// Line counters.
    pub counts: LineCounts,
}

/// Scans decoded text into raw records.
///
/// With [`ContinuationPolicy::Merge`], unmatched lines following a record are
/// appended to that record's text; otherwise they are dropped.
pub fn tokenize(text: &str, policy: ContinuationPolicy) -> Tokenized {
    let (state, mut tokenized) = text.lines().fold(
        (ScanState::default(), Tokenized::default()),
        |(state, mut acc), line| {
            let (state, event) = scan_step(state, line);
            acc.counts.total += 1;
            match event {
                LineEvent::Blank => acc.counts.blank += 1,
                LineEvent::DateHeader(_) => acc.counts.date_headers += 1,
                LineEvent::Record(record) => {
                    acc.counts.matched += 1;
                    acc.records.push(record);
                }
                LineEvent::Notice => acc.counts.notices += 1,
                LineEvent::Noise(line) => match (policy, acc.records.last_mut()) {
                    (ContinuationPolicy::Merge, Some(last)) => {
                        last.text.push('\n');
                        last.text.push_str(&line);
                        acc.counts.merged += 1;
                    }
                    _ => acc.counts.dropped += 1,
                },
            }
            (state, acc)
        },
    );
    tokenized.final_date = state.current_date;
    tokenized
}
