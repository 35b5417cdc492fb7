//! Room and file queries, deletes and store totals.

use rusqlite::{OptionalExtension, Row, params};

use super::migrations::schema_version;
use super::models::{DeletedCounts, FileRecord, Room, RoomSummary, StoreInfo};
use super::{Store, parse_opt_ts, parse_ts};
use crate::error::{KakaopackError, Result};
use crate::message::Message;
use crate::table::{ChatTable, ParseReport, ParseSource};

const ROOM_COLUMNS: &str = "r.id, r.name, r.identity_hash, r.participants, r.created_at";

/// Reads the five [`ROOM_COLUMNS`] starting at column 0.
///
/// The participants column holds a JSON array; the JSON string is returned
/// alongside so the caller can decode it outside the row closure.
fn room_from_row(row: &Row<'_>) -> rusqlite::Result<(Room, String)> {
    let created_at: String = row.get(4)?;
    Ok((
        Room {
            id: row.get(0)?,
            name: row.get(1)?,
            identity_hash: row.get(2)?,
            participants: Vec::new(),
            created_at: parse_ts(4, &created_at)?,
        },
        row.get(3)?,
    ))
}

fn with_participants((mut room, json): (Room, String)) -> Result<Room> {
    room.participants = serde_json::from_str(&json)?;
    Ok(room)
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: row.get(0)?,
        room_id: row.get(1)?,
        name: row.get(2)?,
        content_hash: row.get(3)?,
        size: row.get::<_, i64>(4)? as u64,
        message_count: row.get::<_, i64>(5)? as usize,
        start_date: parse_opt_ts(6, row.get(6)?)?,
        end_date: parse_opt_ts(7, row.get(7)?)?,
        uploaded_at: parse_ts(8, &row.get::<_, String>(8)?)?,
    })
}

impl Store {
    /// Lists every room with its message and file counts, most recently
    /// active first.
    pub fn rooms(&self) -> Result<Vec<RoomSummary>> {
        let sql = format!(
            "SELECT {ROOM_COLUMNS},
                    (SELECT COUNT(*) FROM messages m WHERE m.room_id = r.id),
                    (SELECT COUNT(*) FROM files f WHERE f.room_id = r.id),
                    (SELECT MAX(m.timestamp) FROM messages m WHERE m.room_id = r.id)
             FROM rooms r"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                room_from_row(row)?,
                row.get::<_, i64>(5)? as usize,
                row.get::<_, i64>(6)? as usize,
                parse_opt_ts(7, row.get(7)?)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (room, message_count, file_count, last_message) = row?;
            summaries.push(RoomSummary {
                room: with_participants(room)?,
                message_count,
                file_count,
                last_message,
            });
        }

        summaries.sort_by(|a, b| {
            b.last_message
                .cmp(&a.last_message)
                .then_with(|| a.room.id.cmp(&b.room.id))
        });
        Ok(summaries)
    }

    /// Fetches one room.
    ///
    /// # Errors
    ///
    /// [`KakaopackError::NotFound`] if no room has this id.
    pub fn room(&self, id: i64) -> Result<Room> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms r WHERE r.id = ?1");
        let raw = self
            .conn
            .query_row(&sql, params![id], room_from_row)
            .optional()?
            .ok_or_else(|| KakaopackError::not_found("room", id))?;
        with_participants(raw)
    }

    /// Files imported into a room, oldest import first.
    pub fn files(&self, room_id: i64) -> Result<Vec<FileRecord>> {
        self.ensure_room(room_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT id, room_id, name, content_hash, size, message_count,
                    start_date, end_date, uploaded_at
             FROM files WHERE room_id = ?1 ORDER BY id",
        )?;
        let files = stmt
            .query_map(params![room_id], file_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(files)
    }

    /// Loads a room's full merged history as a table.
    pub fn room_messages(&self, room_id: i64) -> Result<ChatTable> {
        self.ensure_room(room_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, author, text FROM messages
             WHERE room_id = ?1 ORDER BY timestamp, id",
        )?;
        let messages = stmt
            .query_map(params![room_id], |row| {
                Ok(Message::new(
                    parse_ts(0, &row.get::<_, String>(0)?)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let report = ParseReport {
            source: ParseSource::Store,
            encoding: "UTF-8".to_string(),
            ..ParseReport::default()
        };
        Ok(ChatTable::with_report(messages, report))
    }

    /// Deletes a room with all its files and messages.
    pub fn delete_room(&mut self, id: i64) -> Result<DeletedCounts> {
        self.ensure_room(id)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM file_messages
             WHERE file_id IN (SELECT id FROM files WHERE room_id = ?1)",
            params![id],
        )?;
        let messages = tx.execute("DELETE FROM messages WHERE room_id = ?1", params![id])?;
        let files = tx.execute("DELETE FROM files WHERE room_id = ?1", params![id])?;
        let rooms = tx.execute("DELETE FROM rooms WHERE id = ?1", params![id])?;
        tx.commit()?;

        tracing::info!(room_id = id, files, messages, "deleted room");
        Ok(DeletedCounts {
            rooms,
            files,
            messages,
            reassigned: 0,
        })
    }

    /// Deletes one file and the messages only it carried.
    ///
    /// A message first stored by this file but also carried by a later file
    /// of the room is handed over to the earliest such file and kept. The
    /// room is kept even when it ends up empty.
    pub fn delete_file(&mut self, id: i64) -> Result<DeletedCounts> {
        let exists = self
            .conn
            .query_row("SELECT 1 FROM files WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?;
        if exists.is_none() {
            return Err(KakaopackError::not_found("file", id));
        }

        let tx = self.conn.transaction()?;
        let reassigned = tx.execute(
            "UPDATE messages SET file_id = (
                 SELECT MIN(fm.file_id) FROM file_messages fm
                 WHERE fm.message_id = messages.id AND fm.file_id <> ?1
             )
             WHERE file_id = ?1
               AND EXISTS (
                 SELECT 1 FROM file_messages fm
                 WHERE fm.message_id = messages.id AND fm.file_id <> ?1
             )",
            params![id],
        )?;
        tx.execute("DELETE FROM file_messages WHERE file_id = ?1", params![id])?;
        let messages = tx.execute("DELETE FROM messages WHERE file_id = ?1", params![id])?;
        let files = tx.execute("DELETE FROM files WHERE id = ?1", params![id])?;
        tx.commit()?;

        tracing::info!(file_id = id, messages, reassigned, "deleted file");
        Ok(DeletedCounts {
            rooms: 0,
            files,
            messages,
            reassigned,
        })
    }

    /// Store-wide totals.
    pub fn info(&self) -> Result<StoreInfo> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(n as usize)
        };
        let page_count: i64 = self
            .conn
            .pragma_query_value(None, "page_count", |row| row.get(0))?;
        let page_size: i64 = self
            .conn
            .pragma_query_value(None, "page_size", |row| row.get(0))?;

        Ok(StoreInfo {
            path: self.path().map(|p| p.display().to_string()),
            schema_version: schema_version(&self.conn)?,
            rooms: count("rooms")?,
            files: count("files")?,
            messages: count("messages")?,
            size_bytes: (page_count * page_size) as u64,
        })
    }

    fn ensure_room(&self, id: i64) -> Result<()> {
        self.conn
            .query_row("SELECT 1 FROM rooms WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?
            .ok_or_else(|| KakaopackError::not_found("room", id))
    }
}
