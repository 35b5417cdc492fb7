//! Output format writers.
//!
//! This module provides writers for a [`ChatTable`](crate::ChatTable):
//! - [`write_csv`] / [`to_csv`] - CSV with `timestamp,author,text` columns
//! - [`write_json`] / [`to_json`] - JSON array of messages - requires `json-output` feature
//! - [`write_jsonl`] / [`to_jsonl`] - JSON Lines, one message per line - requires `json-output` feature
//!
//! Every writer emits messages in table order (ascending timestamp).
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "json-output")]
//! # fn main() -> kakaopack::Result<()> {
//! use kakaopack::core::models::OutputConfig;
//! use kakaopack::core::output::{to_csv, write_json};
//! use kakaopack::parser::KakaoParser;
//!
//! let table = KakaoParser::new().parse_file("KakaoTalk_20240120.txt")?;
//!
//! write_json(&table, "chat.json", &OutputConfig::new())?;
//! let csv = to_csv(&table, &OutputConfig::new().with_bom())?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "json-output"))]
//! # fn main() {}
//! ```

mod csv_writer;
#[cfg(feature = "json-output")]
mod json_writer;
#[cfg(feature = "json-output")]
mod jsonl_writer;

pub use csv_writer::{to_csv, write_csv};
#[cfg(feature = "json-output")]
pub use json_writer::{to_json, write_json};
#[cfg(feature = "json-output")]
pub use jsonl_writer::{to_jsonl, write_jsonl};

#[cfg(feature = "json-output")]
use serde::Serialize;

#[cfg(feature = "json-output")]
use crate::core::models::OutputConfig;
#[cfg(feature = "json-output")]
use crate::message::Message;

/// Flat message record used by the JSON writers.
#[cfg(feature = "json-output")]
#[derive(Serialize)]
struct OutputRecord<'a> {
    timestamp: String,
    author: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    length: Option<usize>,
}

#[cfg(feature = "json-output")]
impl<'a> OutputRecord<'a> {
    fn new(msg: &'a Message, config: &OutputConfig) -> Self {
        Self {
            timestamp: msg.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            author: &msg.author,
            text: &msg.text,
            length: config.include_length.then(|| msg.length()),
        }
    }
}
