//! Schema migrations.
//!
//! Each migration is guarded by the `user_version` pragma so it runs exactly
//! once per database file.

use rusqlite::Connection;

use crate::error::Result;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 2;

/// Rooms, files and messages.
///
/// Message uniqueness is scoped to a room: the same text from the same author
/// at the same minute may exist once per room.
const V001_INITIAL: &str = r"
CREATE TABLE IF NOT EXISTS rooms (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    identity_hash TEXT NOT NULL UNIQUE,   -- SHA-256 of sorted participants
    participants  TEXT NOT NULL,          -- JSON array
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS files (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    room_id       INTEGER NOT NULL REFERENCES rooms(id),
    name          TEXT NOT NULL,
    content_hash  TEXT NOT NULL UNIQUE,
    size          INTEGER NOT NULL,
    message_count INTEGER NOT NULL,
    start_date    TEXT,
    end_date      TEXT,
    uploaded_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_files_room ON files(room_id);

CREATE TABLE IF NOT EXISTS messages (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    room_id      INTEGER NOT NULL REFERENCES rooms(id),
    file_id      INTEGER NOT NULL REFERENCES files(id),
    timestamp    TEXT NOT NULL,
    author       TEXT NOT NULL,
    text         TEXT NOT NULL,
    length       INTEGER NOT NULL,
    content_hash TEXT NOT NULL,
    created_at   TEXT NOT NULL,

    UNIQUE (room_id, content_hash)
);

CREATE INDEX IF NOT EXISTS idx_messages_room_ts ON messages(room_id, timestamp);
CREATE INDEX IF NOT EXISTS idx_messages_file ON messages(file_id);
";

/// Every file that carried a message, not only the one that stored it first.
///
/// Existing messages are linked to the file recorded on the message row.
const V002_FILE_MESSAGES: &str = r"
CREATE TABLE IF NOT EXISTS file_messages (
    file_id    INTEGER NOT NULL REFERENCES files(id),
    message_id INTEGER NOT NULL REFERENCES messages(id),

    PRIMARY KEY (file_id, message_id)
);

CREATE INDEX IF NOT EXISTS idx_file_messages_message ON file_messages(message_id);

INSERT OR IGNORE INTO file_messages (file_id, message_id)
    SELECT file_id, id FROM messages;
";

/// Runs all pending migrations against the open connection.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current = schema_version(conn)?;

    tracing::debug!(
        current_version = current,
        target_version = CURRENT_VERSION,
        "checking database migrations"
    );

    if current < 1 {
        tracing::info!("applying migration v001_initial");
        conn.execute_batch(V001_INITIAL)?;
        conn.pragma_update(None, "user_version", 1)?;
    }

    if current < 2 {
        tracing::info!("applying migration v002_file_messages");
        conn.execute_batch(V002_FILE_MESSAGES)?;
        conn.pragma_update(None, "user_version", 2)?;
    }

    Ok(())
}

/// Reads the schema version recorded in the database.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('rooms', 'files', 'messages', 'file_messages')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }

    #[test]
    fn test_v2_links_existing_messages() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(V001_INITIAL).unwrap();
        conn.pragma_update(None, "user_version", 1).unwrap();
        conn.execute_batch(
            "INSERT INTO rooms (name, identity_hash, participants, created_at)
                 VALUES ('a', 'h', '[\"a\"]', '2024-01-20 00:00:00');
             INSERT INTO files (room_id, name, content_hash, size, message_count, uploaded_at)
                 VALUES (1, 'a.txt', 'f', 1, 1, '2024-01-20 00:00:00');
             INSERT INTO messages (room_id, file_id, timestamp, author, text, length, content_hash, created_at)
                 VALUES (1, 1, '2024-01-20 16:25:00', 'a', 'x', 1, 'm', '2024-01-20 00:00:00');",
        )
        .unwrap();

        run_migrations(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 2);
        let link: (i64, i64) = conn
            .query_row("SELECT file_id, message_id FROM file_messages", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(link, (1, 1));
    }
}
