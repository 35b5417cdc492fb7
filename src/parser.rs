//! Export parser entry point.
//!
//! [`KakaoParser`] turns a named byte buffer into a [`ChatTable`]:
//!
//! 1. detect and decode the text encoding
//! 2. classify lines and fold the date context through them
//! 3. normalize time tokens into timestamps
//! 4. fall back to a delimited-table reading when too few messages were found
//!
//! # Example
//!
//! ```rust
//! use chrono::Timelike;
//! use kakaopack::parser::KakaoParser;
//!
//! let export = "2024년 1월 20일 토요일\n오후 4:25, 철수 : 안녕\n오후 4:26, 영희 : ㅇㅇ\n";
//! let table = KakaoParser::new().parse_str(export)?;
//!
//! assert_eq!(table.len(), 2);
//! assert_eq!(table.messages()[0].timestamp.hour(), 16);
//! assert_eq!(table.messages()[1].author, "영희");
//! # Ok::<(), kakaopack::KakaopackError>(())
//! ```

use std::path::Path;

use chrono::{Local, NaiveDate};

use crate::config::{DateFallback, ParserConfig};
use crate::error::{KakaopackError, Result};
use crate::message::Message;
use crate::parsing::encoding::{decode, detect_encoding};
use crate::parsing::line::{RawRecord, TimeToken, Tokenized, tokenize};
use crate::parsing::tabular::load_tabular;
use crate::parsing::timestamp::{Confidence, normalize_datetime, normalize_time, parse_datetime};
use crate::table::{ChatTable, ParseReport, ParseSource};

/// Name given to inputs that did not come from a file.
pub const MEMORY_INPUT_NAME: &str = "<memory>";

/// Parser for KakaoTalk chat exports.
///
/// Holds only configuration; one instance can parse any number of inputs.
#[derive(Debug, Clone, Default)]
pub struct KakaoParser {
    config: ParserConfig,
}

/// Messages recovered by the line pipeline, with their counters.
#[derive(Debug, Default)]
struct LineRows {
    messages: Vec<Message>,
    sentinel: usize,
    defaulted: usize,
    skipped: usize,
}

impl KakaoParser {
    /// Creates a parser with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Returns the parser configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses an export file. The file name is used in logs and errors.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ChatTable> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.parse_bytes(&name, &bytes)
    }

    /// Parses export text that is already in memory.
    pub fn parse_str(&self, content: &str) -> Result<ChatTable> {
        self.parse_bytes(MEMORY_INPUT_NAME, content.as_bytes())
    }

    /// Parses raw export bytes.
    ///
    /// # Errors
    ///
    /// - [`KakaopackError::UnsupportedFormat`] when neither the line parser nor
    ///   any tabular layout yields a message
    /// - [`KakaopackError::MissingColumns`] when the input is a table without
    ///   the required columns and no line could be parsed
    pub fn parse_bytes(&self, name: &str, bytes: &[u8]) -> Result<ChatTable> {
        let encoding = detect_encoding(bytes, self.config.encoding_sample_len);
        let decoded = decode(bytes, encoding);
        tracing::debug!(
            file = name,
            bytes = bytes.len(),
            encoding = decoded.encoding.name(),
            lossy = decoded.lossy,
            "decoded export"
        );

        let tokenized = tokenize(&decoded.text, self.config.continuation);
        let rows = self.normalize(&tokenized.records);

        let mut report = line_report(&tokenized, &rows);
        report.encoding = decoded.encoding.name().to_string();
        report.lossy = decoded.lossy;

        if rows.messages.len() >= self.config.min_line_rows {
            tracing::info!(
                file = name,
                messages = rows.messages.len(),
                sentinel = rows.sentinel,
                "parsed export lines"
            );
            return Ok(ChatTable::with_report(rows.messages, report));
        }

        tracing::debug!(
            file = name,
            messages = rows.messages.len(),
            threshold = self.config.min_line_rows,
            "too few line rows, trying tabular layout"
        );

        match load_tabular(name, bytes, encoding, &self.config) {
            Ok(tabular) if !tabular.messages.is_empty() || rows.messages.is_empty() => {
                tracing::info!(
                    file = name,
                    messages = tabular.messages.len(),
                    encoding = tabular.encoding.name(),
                    dropped = tabular.rows_dropped(),
                    "parsed tabular export"
                );
                let report = ParseReport {
                    source: ParseSource::Tabular,
                    encoding: tabular.encoding.name().to_string(),
                    rows_dropped: tabular.rows_dropped(),
                    ..report
                };
                Ok(ChatTable::with_report(tabular.messages, report))
            }
            Ok(_) => {
                tracing::warn!(
                    file = name,
                    messages = rows.messages.len(),
                    "tabular layout had no usable rows, keeping line rows"
                );
                Ok(ChatTable::with_report(rows.messages, report))
            }
            Err(err) if !rows.messages.is_empty() => {
                tracing::debug!(
                    file = name,
                    messages = rows.messages.len(),
                    error = %err,
                    "no tabular layout, keeping line rows"
                );
                Ok(ChatTable::with_report(rows.messages, report))
            }
            Err(err @ KakaopackError::MissingColumns { .. }) => Err(err),
            Err(_) => Err(KakaopackError::unsupported_format(
                name,
                "no message lines recognized and no tabular layout with Date/User/Message columns",
            )),
        }
    }

    /// Resolves the date for a record without a full date-time.
    ///
    /// Returns the date and whether it came from the fallback policy, or
    /// `None` when the record should be skipped.
    fn context_date(&self, context: Option<NaiveDate>, today: NaiveDate) -> Option<(NaiveDate, bool)> {
        match (context, self.config.date_fallback) {
            (Some(date), _) => Some((date, false)),
            (None, DateFallback::Today) => Some((today, true)),
            (None, DateFallback::Fixed(date)) => Some((date, true)),
            (None, DateFallback::Skip) => None,
        }
    }

    fn normalize(&self, records: &[RawRecord]) -> LineRows {
        let today = Local::now().date_naive();
        let mut rows = LineRows::default();

        for record in records {
            let normalized = match &record.time {
                TimeToken::DateTime(token) => match parse_datetime(token) {
                    Some(value) => Some((value, Confidence::Exact)),
                    None => self
                        .context_date(record.date, today)
                        .map(|(date, _)| normalize_datetime(token, date))
                        .map(|ts| (ts.value, ts.confidence)),
                },
                TimeToken::Time(token) => {
                    self.context_date(record.date, today)
                        .map(|(date, defaulted)| {
                            let ts = normalize_time(token, date);
                            let confidence = match ts.confidence {
                                Confidence::Exact if defaulted => Confidence::DefaultedDate,
                                other => other,
                            };
                            (ts.value, confidence)
                        })
                }
            };

            let Some((timestamp, confidence)) = normalized else {
                tracing::debug!(line = record.line_no, "skipped line without date context");
                rows.skipped += 1;
                continue;
            };

            match confidence {
                Confidence::Sentinel => {
                    tracing::debug!(
                        line = record.line_no,
                        token = record.time.as_str(),
                        "unreadable time, using noon sentinel"
                    );
                    rows.sentinel += 1;
                }
                Confidence::DefaultedDate => rows.defaulted += 1,
                Confidence::Exact => {}
            }

            rows.messages
                .push(Message::new(timestamp, record.author.as_str(), record.text.as_str()));
        }

        if rows.defaulted > 0 {
            tracing::warn!(
                count = rows.defaulted,
                "messages before the first date header were dated by the fallback policy"
            );
        }
        rows
    }
}

fn line_report(tokenized: &Tokenized, rows: &LineRows) -> ParseReport {
    let counts = &tokenized.counts;
    ParseReport {
        source: ParseSource::Lines,
        lines_total: counts.total,
        lines_matched: counts.matched,
        date_headers: counts.date_headers,
        lines_merged: counts.merged,
        sentinel_count: rows.sentinel,
        defaulted_date_count: rows.defaulted,
        rows_dropped: counts.dropped + counts.notices + rows.skipped,
        ..ParseReport::default()
    }
}
