//! Content-addressed SQLite store.
//!
//! Imported exports are merged into a per-conversation history:
//!
//! - a **room** is identified by the hash of its sorted participant names, so
//!   successive exports of the same chat land in the same room
//! - a **file** is identified by the hash of its raw bytes, so importing the
//!   same file twice is a no-op
//! - a **message** is identified within its room by the hash of
//!   timestamp, author and text, so overlapping exports only add what is new
//!
//! Each import runs in a single transaction. The [`Store`] owns one
//! [`rusqlite::Connection`]; it is `Send` but not `Sync`, and mutating
//! operations take `&mut self`.
//!
//! # Example
//!
//! ```rust
//! use kakaopack::parser::KakaoParser;
//! use kakaopack::store::Store;
//!
//! # fn main() -> kakaopack::Result<()> {
//! let mut store = Store::open_in_memory()?;
//! let parser = KakaoParser::new();
//! let export = "2024년 1월 20일 토요일\n오후 4:25, 철수 : 안녕\n오후 4:26, 영희 : ㅇㅇ\n";
//!
//! let first = store.import_bytes(&parser, "chat.txt", export.as_bytes())?;
//! assert_eq!(first.new_messages, 2);
//!
//! let again = store.import_bytes(&parser, "chat.txt", export.as_bytes())?;
//! assert!(again.already_imported);
//! assert_eq!(again.room_id, first.room_id);
//! # Ok(())
//! # }
//! ```

mod import;
pub mod migrations;
pub mod models;
mod rooms;

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use rusqlite::Connection;
use rusqlite::types::Type;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::message::TIMESTAMP_FORMAT;

pub use models::{DeletedCounts, FileRecord, ImportOutcome, Room, RoomSummary, StoreInfo};

/// Handle to a chat history database.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Opens (or creates) a database file with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(&StoreConfig::new(path))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::open_with_config(&StoreConfig::in_memory())
    }

    /// Opens a database as described by `config` and applies pending migrations.
    pub fn open_with_config(config: &StoreConfig) -> Result<Self> {
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()?
        } else {
            tracing::info!(path = %config.path.display(), "opening database");
            let conn = Connection::open(&config.path)?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn
        };

        conn.busy_timeout(config.busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run_migrations(&conn)?;

        let path = (!config.is_in_memory()).then(|| config.path.clone());
        Ok(Self { conn, path })
    }

    /// Filesystem path of the database, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Current local wall-clock time, second precision.
fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

fn format_ts(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Reads a stored timestamp column.
fn parse_ts(idx: usize, value: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_opt_ts(idx: usize, value: Option<String>) -> rusqlite::Result<Option<NaiveDateTime>> {
    value.map(|v| parse_ts(idx, &v)).transpose()
}
