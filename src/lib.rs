//! # Kakaopack
//!
//! A Rust library for turning KakaoTalk chat exports into clean,
//! time-ordered message tables, and for merging repeated exports of the same
//! conversation into a de-duplicated SQLite history.
//!
//! ## Overview
//!
//! KakaoTalk exports are loosely structured text. Depending on platform and
//! app version they use one of several line layouts, may be UTF-8 or EUC-KR,
//! and sometimes arrive as a spreadsheet-style table instead. Kakaopack:
//!
//! - detects the encoding and decodes the bytes
//! - recognizes date headers and five message-line layouts, folding the
//!   current date through the file
//! - normalizes Korean 12-hour times (`오전`/`오후`) into full timestamps
//! - falls back to a delimited-table reading when too few lines match
//! - stores rooms, files and messages keyed by content hashes so repeated
//!   imports only add what is new
//!
//! ## Quick Start
//!
//! ```rust
//! use kakaopack::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let export = "\
//! 2024년 1월 20일 토요일
//! 오후 4:25, 철수 : 안녕
//! 오후 4:26, 영희 : ㅇㅇ
//! ";
//!
//! let table = KakaoParser::new().parse_str(export)?;
//! assert_eq!(table.len(), 2);
//!
//! let stats = ChatStats::compute(&table);
//! assert_eq!(stats.users.len(), 2);
//!
//! let csv = to_csv(&table, &OutputConfig::new())?;
//! assert!(csv.starts_with("timestamp,author,text"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Merging Exports
//!
//! ```rust
//! # #[cfg(feature = "store")]
//! # fn main() -> kakaopack::Result<()> {
//! use kakaopack::prelude::*;
//!
//! let parser = KakaoParser::new();
//! let mut store = Store::open_in_memory()?;
//!
//! let older = "2024년 1월 20일 토요일\n오후 4:25, 철수 : 안녕\n";
//! let newer = "2024년 1월 20일 토요일\n오후 4:25, 철수 : 안녕\n오후 4:26, 영희 : ㅇㅇ\n";
//!
//! let first = store.import_bytes(&parser, "older.txt", older.as_bytes())?;
//! let second = store.import_bytes(&parser, "newer.txt", newer.as_bytes())?;
//!
//! // Different participant sets make different rooms.
//! assert_ne!(first.room_id, second.room_id);
//! assert_eq!(store.room_messages(second.room_id)?.len(), 2);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "store"))]
//! # fn main() {}
//! ```
//!
//! ## Module Structure
//!
//! - [`parser`] - [`KakaoParser`](parser::KakaoParser), the parsing entry point
//! - [`parsing`] - the stages: encoding, line classification, timestamps, tabular fallback
//! - [`table`] - [`ChatTable`] and its [`ParseReport`](table::ParseReport)
//! - [`message`] - [`Message`]
//! - [`stats`] - per-author, time-bucket and thread statistics
//! - [`core`] - filtering and CSV / JSON / JSONL writers
//! - [`format`] - [`OutputFormat`](format::OutputFormat) dispatch
//! - [`store`] - the SQLite history (feature `store`)
//! - [`config`] - parser and store configuration
//! - [`error`] - [`KakaopackError`] and [`Result`]
//! - [`prelude`] - convenient re-exports
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|---------|
//! | `full` | Everything below | yes |
//! | `store` | SQLite history via `rusqlite` | yes |
//! | `json-output` | JSON and JSONL writers | yes |
//! | `cli` | The `kakaopack` binary | yes |

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod format;
pub mod hash;
pub mod message;
pub mod parser;
pub mod parsing;
pub mod stats;
#[cfg(feature = "store")]
pub mod store;
pub mod table;

// Re-export the main types at the crate root for convenience
pub use error::{KakaopackError, Result};
pub use message::Message;
pub use table::ChatTable;

/// Convenient re-exports for common usage.
///
/// ```rust
/// use kakaopack::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{ChatTable, Message};

    pub use crate::error::{KakaopackError, Result};

    pub use crate::parser::KakaoParser;
    pub use crate::table::{ParseReport, ParseSource};

    pub use crate::config::{ContinuationPolicy, DateFallback, ParserConfig, StoreConfig};

    pub use crate::core::filter::{FilterConfig, apply_filters};
    pub use crate::core::models::OutputConfig;
    pub use crate::core::output::{to_csv, write_csv};
    #[cfg(feature = "json-output")]
    pub use crate::core::output::{to_json, to_jsonl, write_json, write_jsonl};

    pub use crate::format::{OutputFormat, write_to_format};

    pub use crate::stats::ChatStats;

    #[cfg(feature = "store")]
    pub use crate::store::{ImportOutcome, Store};
}
