//! Schema for the notes table.
//!
//! Applied on every open; each statement is idempotent. The version is
//! recorded in `_tagnotes_meta` so a later schema can tell what it is
//! looking at.

pub const SCHEMA_VERSION: i64 = 1;

/// Statements creating the notes table and its `updated_at` trigger.
///
/// Timestamps are UTC text with millisecond precision so that ordering by
/// `updated_at` separates writes made within the same second.
pub const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS _tagnotes_meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        tags TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
        updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
    )",
    // Recursive triggers are off by default, so the inner UPDATE does not refire.
    "CREATE TRIGGER IF NOT EXISTS notes_touch_updated_at
     AFTER UPDATE OF title, content, tags ON notes
     BEGIN
         UPDATE notes SET updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
         WHERE id = NEW.id;
     END",
];
