//! Records returned by the store.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A conversation, identified by its participant set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Row id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// SHA-256 of the sorted, de-duplicated participant names.
    pub identity_hash: String,
    /// Participants, sorted.
    pub participants: Vec<String>,
    /// When the room was created.
    pub created_at: NaiveDateTime,
}

/// One imported export file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Row id.
    pub id: i64,
    /// Owning room.
    pub room_id: i64,
    /// File name as given at import.
    pub name: String,
    /// SHA-256 of the raw bytes (or of name and import time for in-memory tables).
    pub content_hash: String,
    /// Size in bytes; 0 when imported from an in-memory table.
    pub size: u64,
    /// Messages the file parsed into, including ones already stored.
    pub message_count: usize,
    /// Earliest message timestamp.
    pub start_date: Option<NaiveDateTime>,
    /// Latest message timestamp.
    pub end_date: Option<NaiveDateTime>,
    /// When the file was imported.
    pub uploaded_at: NaiveDateTime,
}

/// A room with aggregate counts, as listed by [`Store::rooms`](super::Store::rooms).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    /// The room itself.
    #[serde(flatten)]
    pub room: Room,
    /// Stored messages.
    pub message_count: usize,
    /// Imported files.
    pub file_count: usize,
    /// Timestamp of the latest stored message.
    pub last_message: Option<NaiveDateTime>,
}

/// Result of importing one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// Room the file belongs to.
    pub room_id: i64,
    /// File row (the existing one for a re-import).
    pub file_id: i64,
    /// Messages inserted.
    pub new_messages: usize,
    /// Messages skipped because the room already had them.
    pub duplicate_messages: usize,
    /// Whether the import created the room.
    pub room_created: bool,
    /// Whether the exact file had been imported before (nothing was parsed).
    pub already_imported: bool,
}

/// Rows removed by a delete operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedCounts {
    /// Rooms removed.
    pub rooms: usize,
    /// Files removed.
    pub files: usize,
    /// Messages removed.
    pub messages: usize,
    /// Messages kept because another file of the room also carried them.
    pub reassigned: usize,
}

/// Store-wide totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    /// Database path, `None` for in-memory stores.
    pub path: Option<String>,
    /// Schema version.
    pub schema_version: u32,
    /// Rooms stored.
    pub rooms: usize,
    /// Files stored.
    pub files: usize,
    /// Messages stored.
    pub messages: usize,
    /// Database size in bytes (page count times page size).
    pub size_bytes: u64,
}
