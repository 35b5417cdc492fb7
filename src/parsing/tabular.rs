//! Delimited-table fallback loader.
//!
//! Used when line parsing recovers too few messages. Some tools re-save
//! exports as spreadsheets with a `날짜,사용자,메시지` (or `Date,User,Message`)
//! header; this module finds the delimiter and encoding that read such a file
//! cleanly and maps its columns onto the canonical message fields.
//!
//! Candidate layouts are tried encoding-first, then delimiter, and the first
//! one whose strict decode succeeds, whose header has at least three columns
//! and whose leading records parse is accepted. Only then are column names
//! checked, so a qualifying table with the wrong header is a schema error
//! rather than a silent miss.

use std::io::Cursor;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord};
use encoding_rs::{EUC_KR, Encoding, UTF_8};

use crate::config::ParserConfig;
use crate::error::{KakaopackError, Result};
use crate::message::Message;
use crate::parsing::encoding::decode_strict;
use crate::parsing::timestamp::parse_datetime;

/// Minimum header width for a layout to count as a table.
pub const MIN_COLUMNS: usize = 3;

/// Header aliases for each canonical column, matched exactly.
const TIMESTAMP_ALIASES: &[&str] = &["Date", "날짜"];
const AUTHOR_ALIASES: &[&str] = &["User", "사용자"];
const TEXT_ALIASES: &[&str] = &["Message", "메시지"];

/// Date-time templates tried before free-form parsing, in order.
const DATETIME_TEMPLATES: &[&str] = &[
    "%Y.%m.%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
];

const DATE_TEMPLATES: &[&str] = &["%Y-%m-%d", "%Y.%m.%d"];

/// Messages recovered from a delimited table plus bookkeeping.
#[derive(Debug, Clone)]
pub struct TabularRows {
    /// Rows that produced a message, in file order.
    pub messages: Vec<Message>,
    /// Delimiter that read the table.
    pub delimiter: u8,
    /// Encoding that decoded the table.
    pub encoding: &'static Encoding,
    /// Data records seen (excluding the header).
    pub rows_total: usize,
    /// Records the CSV reader rejected or that were too short.
    pub rows_malformed: usize,
    /// Records whose date cell matched no template.
    pub rows_bad_date: usize,
    /// Records with an empty author or text.
    pub rows_empty: usize,
}

impl TabularRows {
    /// Total records that did not become messages.
    pub fn rows_dropped(&self) -> usize {
        self.rows_malformed + self.rows_bad_date + self.rows_empty
    }
}

/// Positions of the canonical columns inside a header row.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    timestamp: usize,
    author: usize,
    text: usize,
}

impl ColumnMap {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |aliases: &[&str]| {
            headers
                .iter()
                .position(|h| aliases.contains(&h.trim()))
        };

        let timestamp = find(TIMESTAMP_ALIASES);
        let author = find(AUTHOR_ALIASES);
        let text = find(TEXT_ALIASES);

        match (timestamp, author, text) {
            (Some(timestamp), Some(author), Some(text)) => Ok(Self {
                timestamp,
                author,
                text,
            }),
            _ => {
                let missing = [
                    ("timestamp", timestamp),
                    ("author", author),
                    ("text", text),
                ]
                .into_iter()
                .filter(|(_, idx)| idx.is_none())
                .map(|(name, _)| name)
                .collect();
                Err(KakaopackError::missing_columns(missing))
            }
        }
    }
}

/// Encodings to try: the detected one first, then UTF-8 and EUC-KR.
fn candidate_encodings(detected: &'static Encoding) -> Vec<&'static Encoding> {
    let mut encodings = vec![detected];
    for encoding in [UTF_8, EUC_KR] {
        if !encodings.contains(&encoding) {
            encodings.push(encoding);
        }
    }
    encodings
}

fn reader(text: &str, delimiter: u8) -> csv::Reader<Cursor<&[u8]>> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(Cursor::new(text.as_bytes()))
}

/// Reads the header and up to `prefix_rows` records. Returns the header when
/// the layout looks like a table.
fn probe(text: &str, delimiter: u8, prefix_rows: usize) -> Option<StringRecord> {
    let mut rdr = reader(text, delimiter);
    let headers = rdr.headers().ok()?.clone();
    if headers.len() < MIN_COLUMNS {
        return None;
    }
    for record in rdr.records().take(prefix_rows) {
        record.ok()?;
    }
    Some(headers)
}

/// Parses a table cell into a timestamp.
///
/// Fixed templates first, then the general-purpose parser.
pub fn parse_row_date(cell: &str) -> Option<NaiveDateTime> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    DATETIME_TEMPLATES
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
        .or_else(|| {
            DATE_TEMPLATES
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(cell, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .or_else(|| parse_datetime(cell))
}

/// Interprets `bytes` as a delimited table.
///
/// `name` is only used in error messages and logs.
///
/// # Errors
///
/// - [`KakaopackError::UnsupportedFormat`] when no delimiter/encoding
///   combination yields a table
/// - [`KakaopackError::MissingColumns`] when the accepted table lacks a
///   required column
pub fn load_tabular(
    name: &str,
    bytes: &[u8],
    detected: &'static Encoding,
    config: &ParserConfig,
) -> Result<TabularRows> {
    for encoding in candidate_encodings(detected) {
        let Some(text) = decode_strict(bytes, encoding) else {
            tracing::debug!(file = name, encoding = encoding.name(), "strict decode failed");
            continue;
        };

        for &delimiter in &config.delimiters {
            let Some(headers) = probe(&text, delimiter, config.prefix_rows) else {
                continue;
            };

            tracing::debug!(
                file = name,
                encoding = encoding.name(),
                delimiter = %char::from(delimiter).escape_default(),
                columns = headers.len(),
                "tabular layout accepted"
            );
            let columns = ColumnMap::resolve(&headers)?;
            return Ok(read_rows(&text, delimiter, encoding, columns));
        }
    }

    Err(KakaopackError::unsupported_format(
        name,
        format!(
            "no delimiter/encoding combination produced a table with at least {MIN_COLUMNS} columns"
        ),
    ))
}

fn read_rows(
    text: &str,
    delimiter: u8,
    encoding: &'static Encoding,
    columns: ColumnMap,
) -> TabularRows {
    let mut rows = TabularRows {
        messages: Vec::new(),
        delimiter,
        encoding,
        rows_total: 0,
        rows_malformed: 0,
        rows_bad_date: 0,
        rows_empty: 0,
    };

    for record in reader(text, delimiter).records() {
        rows.rows_total += 1;
        let Ok(record) = record else {
            rows.rows_malformed += 1;
            continue;
        };
        let (Some(date), Some(author), Some(body)) = (
            record.get(columns.timestamp),
            record.get(columns.author),
            record.get(columns.text),
        ) else {
            rows.rows_malformed += 1;
            continue;
        };

        let author = author.trim();
        if author.is_empty() || body.trim().is_empty() {
            rows.rows_empty += 1;
            continue;
        }
        let Some(timestamp) = parse_row_date(date) else {
            rows.rows_bad_date += 1;
            continue;
        };
        rows.messages.push(Message::new(timestamp, author, body));
    }

    if rows.rows_dropped() > 0 {
        tracing::warn!(
            malformed = rows.rows_malformed,
            bad_date = rows.rows_bad_date,
            empty = rows.rows_empty,
            "dropped tabular rows"
        );
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(input: &[u8]) -> Result<TabularRows> {
        load_tabular("test.csv", input, UTF_8, &ParserConfig::default())
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_korean_header_comma() {
        let csv = "날짜,사용자,메시지\n2024.01.20 16:25,철수,안녕\n2024.01.20 16:26,영희,ㅇㅇ\n";
        let rows = load(csv.as_bytes()).unwrap();
        assert_eq!(rows.delimiter, b',');
        assert_eq!(rows.messages.len(), 2);
        assert_eq!(rows.messages[0].timestamp, dt("2024-01-20 16:25:00"));
        assert_eq!(rows.messages[1].author, "영희");
        assert_eq!(rows.rows_dropped(), 0);
    }

    #[test]
    fn test_english_header_tab() {
        let tsv = "Date\tUser\tMessage\n2024-01-20 16:25:00\tKim\thi, there\n";
        let rows = load(tsv.as_bytes()).unwrap();
        assert_eq!(rows.delimiter, b'\t');
        assert_eq!(rows.messages[0].text, "hi, there");
    }

    #[test]
    fn test_extra_columns_and_order() {
        let csv = "메시지;번호;사용자;날짜\n안녕;1;철수;2024/01/20 09:05\n";
        let rows = load(csv.as_bytes()).unwrap();
        assert_eq!(rows.delimiter, b';');
        assert_eq!(rows.messages[0].author, "철수");
        assert_eq!(rows.messages[0].timestamp, dt("2024-01-20 09:05:00"));
    }

    #[test]
    fn test_missing_columns() {
        let err = load("Date,Sender,Body\n2024-01-20,a,b\n".as_bytes()).unwrap_err();
        assert!(err.is_missing_columns());
        assert_eq!(err.to_string(), "Missing required column(s): author, text");
    }

    #[test]
    fn test_too_few_columns_is_unsupported() {
        let err = load("그냥 텍스트 한 줄\n또 한 줄\n".as_bytes()).unwrap_err();
        assert!(err.is_unsupported_format());
    }

    #[test]
    fn test_euc_kr_table() {
        let (bytes, _, _) = EUC_KR.encode("날짜,사용자,메시지\n2024.01.20 16:25,철수,안녕\n");
        let rows = load_tabular("euc.csv", &bytes, UTF_8, &ParserConfig::default()).unwrap();
        assert_eq!(rows.encoding, EUC_KR);
        assert_eq!(rows.messages[0].author, "철수");
    }

    #[test]
    fn test_bad_rows_are_counted() {
        let csv = "날짜,사용자,메시지\n\
                   2024.01.20 16:25,철수,안녕\n\
                   어제,영희,날짜가 이상함\n\
                   2024.01.20 16:27,,빈 작성자\n\
                   2024.01.20 16:28,민수\n";
        let rows = load(csv.as_bytes()).unwrap();
        assert_eq!(rows.messages.len(), 1);
        assert_eq!(rows.rows_total, 4);
        assert_eq!(rows.rows_bad_date, 1);
        assert_eq!(rows.rows_empty, 1);
        assert_eq!(rows.rows_malformed, 1);
    }

    #[test]
    fn test_parse_row_date_templates() {
        assert_eq!(parse_row_date("2024.01.20 16:25"), Some(dt("2024-01-20 16:25:00")));
        assert_eq!(parse_row_date("2024.01.20 16:25:07"), Some(dt("2024-01-20 16:25:07")));
        assert_eq!(parse_row_date("2024-01-20"), Some(dt("2024-01-20 00:00:00")));
        assert_eq!(parse_row_date("2024-01-20T16:25:00"), Some(dt("2024-01-20 16:25:00")));
        assert_eq!(
            parse_row_date("2024년 1월 20일 오후 4:25"),
            Some(dt("2024-01-20 16:25:00"))
        );
        assert_eq!(parse_row_date(""), None);
        assert_eq!(parse_row_date("not a date"), None);
    }

    #[test]
    fn test_candidate_encodings_dedup() {
        assert_eq!(candidate_encodings(UTF_8), vec![UTF_8, EUC_KR]);
        assert_eq!(candidate_encodings(EUC_KR), vec![EUC_KR, UTF_8]);
    }
}
