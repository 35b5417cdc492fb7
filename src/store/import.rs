//! Import pipeline: file dedup, room resolution, message merge.

use chrono::Local;
use rusqlite::{OptionalExtension, Transaction, params};

use super::models::ImportOutcome;
use super::{Store, format_ts, now};
use crate::error::{KakaopackError, Result};
use crate::hash::{hash_bytes, hash_fields, hash_participants};
use crate::parser::KakaoParser;
use crate::table::ChatTable;

/// Identity and size of the file being imported.
struct FileSource<'a> {
    name: &'a str,
    content_hash: String,
    size: u64,
}

impl Store {
    /// Parses and imports raw export bytes.
    ///
    /// If a file with identical bytes was imported before, returns its ids
    /// with zero new messages and does not parse anything.
    ///
    /// # Errors
    ///
    /// Parse errors from [`KakaoParser::parse_bytes`], or a database error (in
    /// which case nothing was written).
    pub fn import_bytes(
        &mut self,
        parser: &KakaoParser,
        name: &str,
        bytes: &[u8],
    ) -> Result<ImportOutcome> {
        let content_hash = hash_bytes(bytes);

        if let Some(outcome) = self.find_imported(&content_hash)? {
            tracing::info!(
                file = name,
                room_id = outcome.room_id,
                file_id = outcome.file_id,
                "file already imported"
            );
            return Ok(outcome);
        }

        let table = parser.parse_bytes(name, bytes)?;
        self.import_parsed(
            FileSource {
                name,
                content_hash,
                size: bytes.len() as u64,
            },
            &table,
        )
    }

    /// Imports a table that was parsed elsewhere.
    ///
    /// Without the raw bytes the file is identified by its name and the
    /// import time, so the same table imported twice creates two file rows;
    /// messages are still de-duplicated per room.
    pub fn import_table(&mut self, name: &str, table: &ChatTable) -> Result<ImportOutcome> {
        let imported_at = Local::now().format("%Y-%m-%dT%H:%M:%S%.f").to_string();
        let content_hash = hash_fields([name, imported_at.as_str()]);
        self.import_parsed(
            FileSource {
                name,
                content_hash,
                size: 0,
            },
            table,
        )
    }

    fn find_imported(&self, content_hash: &str) -> Result<Option<ImportOutcome>> {
        let found = self
            .conn
            .query_row(
                "SELECT id, room_id FROM files WHERE content_hash = ?1",
                params![content_hash],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        Ok(found.map(|(file_id, room_id)| ImportOutcome {
            room_id,
            file_id,
            new_messages: 0,
            duplicate_messages: 0,
            room_created: false,
            already_imported: true,
        }))
    }

    fn import_parsed(&mut self, file: FileSource<'_>, table: &ChatTable) -> Result<ImportOutcome> {
        if table.is_empty() {
            return Err(KakaopackError::unsupported_format(
                file.name,
                "no messages to import",
            ));
        }

        let tx = self.conn.transaction()?;
        let (room_id, room_created) = resolve_room(&tx, file.name, table)?;
        let file_id = insert_file(&tx, room_id, &file, table)?;
        let new_messages = insert_messages(&tx, room_id, file_id, table)?;
        tx.commit()?;

        let outcome = ImportOutcome {
            room_id,
            file_id,
            new_messages,
            duplicate_messages: table.len() - new_messages,
            room_created,
            already_imported: false,
        };
        tracing::info!(
            file = file.name,
            room_id,
            file_id,
            new = outcome.new_messages,
            duplicate = outcome.duplicate_messages,
            room_created,
            "imported file"
        );
        Ok(outcome)
    }
}

/// Finds the room for the table's participant set, creating it if needed.
///
/// New rooms are named after the participants.
fn resolve_room(tx: &Transaction<'_>, file_name: &str, table: &ChatTable) -> Result<(i64, bool)> {
    let participants: Vec<&str> = table.participants().into_iter().collect();
    let identity_hash = hash_participants(participants.iter().copied());

    let existing = tx
        .query_row(
            "SELECT id FROM rooms WHERE identity_hash = ?1",
            params![identity_hash],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok((id, false));
    }

    let name = participants.join(", ");
    tx.execute(
        "INSERT INTO rooms (name, identity_hash, participants, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            name,
            identity_hash,
            serde_json::to_string(&participants)?,
            format_ts(now()),
        ],
    )?;
    let id = tx.last_insert_rowid();
    tracing::debug!(room_id = id, file = file_name, participants = participants.len(), "created room");
    Ok((id, true))
}

fn insert_file(
    tx: &Transaction<'_>,
    room_id: i64,
    file: &FileSource<'_>,
    table: &ChatTable,
) -> Result<i64> {
    let range = table.date_range();
    tx.execute(
        "INSERT INTO files
            (room_id, name, content_hash, size, message_count, start_date, end_date, uploaded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            room_id,
            file.name,
            file.content_hash,
            file.size as i64,
            table.len() as i64,
            range.map(|(start, _)| format_ts(start)),
            range.map(|(_, end)| format_ts(end)),
            format_ts(now()),
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

/// Inserts messages not yet present in the room and links every message of
/// the table to the file. Returns how many were new.
fn insert_messages(
    tx: &Transaction<'_>,
    room_id: i64,
    file_id: i64,
    table: &ChatTable,
) -> Result<usize> {
    let created_at = format_ts(now());
    let mut stmt = tx.prepare(
        "INSERT OR IGNORE INTO messages
            (room_id, file_id, timestamp, author, text, length, content_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;
    let mut link = tx.prepare(
        "INSERT OR IGNORE INTO file_messages (file_id, message_id)
         SELECT ?1, id FROM messages WHERE room_id = ?2 AND content_hash = ?3",
    )?;

    let mut inserted = 0;
    for msg in table {
        let content_hash = msg.content_hash();
        inserted += stmt.execute(params![
            room_id,
            file_id,
            format_ts(msg.timestamp),
            msg.author,
            msg.text,
            msg.length() as i64,
            content_hash,
            created_at,
        ])?;
        link.execute(params![file_id, room_id, content_hash])?;
    }
    Ok(inserted)
}
