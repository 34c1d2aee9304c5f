//! SQLite implementation of the tagnotes database trait.
//!
//! [`SqliteStore`] knows where the database lives and hands out
//! [`SqliteSession`]s, each wrapping its own connection. A session is meant
//! to live for one request; dropping it closes the connection.

use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tagnotes_core::{
    join_tags, split_tags, Database, Error, NewNote, Note, NoteChanges, SCHEMA, SCHEMA_VERSION,
};
use tracing::{debug, error, info};

/// How long a connection waits on another writer's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const SELECT_NOTE: &str = "SELECT id, title, content, tags, created_at, updated_at FROM notes";

/// Handle on a SQLite database file with the notes schema applied.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let started_at = Instant::now();
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };

        let conn = store.connect()?;
        let journal_mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(Error::database)?;

        if let Err(err) = Self::apply_schema(&conn) {
            error!(path = %store.path.display(), error = %err, "schema bootstrap failed");
            return Err(err);
        }

        info!(
            path = %store.path.display(),
            journal_mode = %journal_mode,
            schema_version = SCHEMA_VERSION,
            duration_ms = started_at.elapsed().as_millis() as u64,
            "database ready"
        );
        Ok(store)
    }

    /// Open a connection for the duration of one request.
    pub fn session(&self) -> Result<SqliteSession, Error> {
        let conn = self.connect()?;
        debug!(path = %self.path.display(), "session opened");
        Ok(SqliteSession {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn connect(&self) -> Result<Connection, Error> {
        let conn = Connection::open(&self.path).map_err(Error::database)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(Error::database)?;
        Ok(conn)
    }

    fn apply_schema(conn: &Connection) -> Result<(), Error> {
        for statement in SCHEMA {
            conn.execute_batch(statement)
                .map_err(|e| Error::Database(format!("schema statement failed: {}", e)))?;
        }

        conn.execute(
            "INSERT OR REPLACE INTO _tagnotes_meta (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )
        .map_err(Error::database)?;

        Ok(())
    }
}

/// One connection to the store. Implements [`Database`].
///
/// The connection sits behind a mutex only so that it can be moved onto the
/// blocking thread pool for each statement; a session is never shared
/// between requests.
pub struct SqliteSession {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSession {
    /// Run `f` against the connection on tokio's blocking pool.
    async fn run<T, F>(&self, f: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| Error::Internal("connection lock poisoned".into()))?;
            f(&*conn).map_err(Error::database)
        })
        .await
        .map_err(Error::internal)?
    }

    fn query_notes(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> rusqlite::Result<Vec<Note>> {
        let mut stmt = conn.prepare(sql)?;
        let notes = stmt
            .query_map(params, Self::note_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
        let tags: Option<String> = row.get(3)?;
        Ok(Note {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            tags: tags.as_deref().map(split_tags).unwrap_or_default(),
            created_at: Self::parse_timestamp(row, 4)?,
            updated_at: Self::parse_timestamp(row, 5)?,
        })
    }

    fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
        let raw: String = row.get(idx)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }
}

#[async_trait::async_trait]
impl Database for SqliteSession {
    async fn create_note(&self, note: NewNote) -> Result<i64, Error> {
        let tags = join_tags(&note.tags);
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO notes (title, content, tags) VALUES (?1, ?2, ?3)",
                params![note.title, note.content, tags],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn get_note(&self, id: i64) -> Result<Option<Note>, Error> {
        self.run(move |conn| {
            conn.query_row(
                &format!("{SELECT_NOTE} WHERE id = ?1"),
                params![id],
                Self::note_from_row,
            )
            .optional()
        })
        .await
    }

    async fn list_notes(&self) -> Result<Vec<Note>, Error> {
        self.run(|conn| {
            Self::query_notes(
                conn,
                &format!("{SELECT_NOTE} ORDER BY updated_at DESC, id DESC"),
                [],
            )
        })
        .await
    }

    async fn update_note(&self, id: i64, changes: NoteChanges) -> Result<bool, Error> {
        let tags = join_tags(&changes.tags);
        // updated_at is refreshed by the notes_touch_updated_at trigger.
        let rows = self
            .run(move |conn| {
                conn.execute(
                    "UPDATE notes SET title = ?1, content = ?2, tags = ?3 WHERE id = ?4",
                    params![changes.title, changes.content, tags, id],
                )
            })
            .await?;
        Ok(rows > 0)
    }

    async fn delete_note(&self, id: i64) -> Result<bool, Error> {
        let rows = self
            .run(move |conn| conn.execute("DELETE FROM notes WHERE id = ?1", params![id]))
            .await?;
        Ok(rows > 0)
    }

    async fn search_by_tag(&self, tag: &str) -> Result<Vec<Note>, Error> {
        let tag = tag.to_string();
        // instr() is case-sensitive and treats % and _ literally, unlike LIKE.
        self.run(move |conn| {
            Self::query_notes(
                conn,
                &format!("{SELECT_NOTE} WHERE instr(tags, ?1) > 0 ORDER BY updated_at DESC, id DESC"),
                params![tag],
            )
        })
        .await
    }

    async fn ping(&self) -> Result<(), Error> {
        self.run(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SqliteStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::open(temp_dir.path().join("notes.db")).unwrap();
        (temp_dir, store)
    }

    fn new_note(title: &str, tags: &[&str]) -> NewNote {
        NewNote {
            title: title.to_string(),
            content: format!("{} content", title),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn ids(notes: &[Note]) -> Vec<i64> {
        notes.iter().map(|n| n.id).collect()
    }

    /// Timestamps have millisecond resolution; keep writes in distinct ticks.
    fn tick() {
        thread::sleep(Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_create_and_get_note() {
        let (_temp, store) = setup();
        let db = store.session().unwrap();

        let id = db.create_note(new_note("Test note", &["tag1", "tag2"])).await.unwrap();
        assert_eq!(id, 1);

        let note = db.get_note(id).await.unwrap().unwrap();
        assert_eq!(note.title, "Test note");
        assert_eq!(note.content, "Test note content");
        assert_eq!(note.tags, vec!["tag1", "tag2"]);
        assert_eq!(note.created_at, note.updated_at);
    }

    #[tokio::test]
    async fn test_empty_tags_round_trip() {
        let (_temp, store) = setup();
        let db = store.session().unwrap();

        let id = db.create_note(new_note("Bare", &[])).await.unwrap();
        let note = db.get_note(id).await.unwrap().unwrap();
        assert!(note.tags.is_empty());
    }

    #[tokio::test]
    async fn test_title_and_tags_stored_verbatim() {
        let (_temp, store) = setup();
        let db = store.session().unwrap();

        let id = db
            .create_note(NewNote {
                title: "  A  ".into(),
                content: "B".into(),
                tags: vec![" x ".into(), "".into(), "y".into()],
            })
            .await
            .unwrap();

        let note = db.get_note(id).await.unwrap().unwrap();
        assert_eq!(note.title, "  A  ");
        assert_eq!(note.tags, vec![" x ", "", "y"]);
        assert_eq!(join_tags(&note.tags), " x ,,y");
    }

    #[tokio::test]
    async fn test_row_with_empty_tag_pieces_keeps_stored_form() {
        let (temp, store) = setup();

        let conn = Connection::open(temp.path().join("notes.db")).unwrap();
        conn.execute(
            "INSERT INTO notes (title, content, tags) VALUES ('Raw', 'x', ',x')",
            [],
        )
        .unwrap();
        let id = conn.last_insert_rowid();
        drop(conn);

        let note = store.session().unwrap().get_note(id).await.unwrap().unwrap();
        assert_eq!(note.tags, vec!["", "x"]);
        assert_eq!(join_tags(&note.tags), ",x");
    }

    #[tokio::test]
    async fn test_get_missing_note_is_none() {
        let (_temp, store) = setup();
        let db = store.session().unwrap();
        assert!(db.get_note(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_empty_store() {
        let (_temp, store) = setup();
        let db = store.session().unwrap();
        assert!(db.list_notes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_orders_by_updated_at_desc() {
        let (_temp, store) = setup();
        let db = store.session().unwrap();

        let first = db.create_note(new_note("First", &[])).await.unwrap();
        tick();
        let second = db.create_note(new_note("Second", &[])).await.unwrap();
        tick();
        let third = db.create_note(new_note("Third", &[])).await.unwrap();

        assert_eq!(ids(&db.list_notes().await.unwrap()), vec![third, second, first]);

        tick();
        db.update_note(
            first,
            NoteChanges {
                title: "First again".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(ids(&db.list_notes().await.unwrap()), vec![first, third, second]);
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_touches_updated_at() {
        let (_temp, store) = setup();
        let db = store.session().unwrap();

        let id = db.create_note(new_note("Original", &["a", "b"])).await.unwrap();
        let before = db.get_note(id).await.unwrap().unwrap();

        tick();
        let updated = db
            .update_note(
                id,
                NoteChanges {
                    title: "Changed".into(),
                    content: "new body".into(),
                    tags: vec!["c".into()],
                },
            )
            .await
            .unwrap();
        assert!(updated);

        let after = db.get_note(id).await.unwrap().unwrap();
        assert_eq!(after.title, "Changed");
        assert_eq!(after.content, "new body");
        assert_eq!(after.tags, vec!["c"]);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_note_is_a_no_op() {
        let (_temp, store) = setup();
        let db = store.session().unwrap();

        let id = db.create_note(new_note("Only", &[])).await.unwrap();
        let updated = db
            .update_note(
                999_999,
                NoteChanges {
                    title: "Z".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated);

        let notes = db.list_notes().await.unwrap();
        assert_eq!(ids(&notes), vec![id]);
        assert_eq!(notes[0].title, "Only");
    }

    #[tokio::test]
    async fn test_delete_note() {
        let (_temp, store) = setup();
        let db = store.session().unwrap();

        let id = db.create_note(new_note("Doomed", &[])).await.unwrap();
        assert!(db.delete_note(id).await.unwrap());
        assert!(db.get_note(id).await.unwrap().is_none());

        // Deleting again is not an error
        assert!(!db.delete_note(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let (_temp, store) = setup();
        let db = store.session().unwrap();

        db.create_note(new_note("One", &[])).await.unwrap();
        let last = db.create_note(new_note("Two", &[])).await.unwrap();
        db.delete_note(last).await.unwrap();

        let next = db.create_note(new_note("Three", &[])).await.unwrap();
        assert!(next > last);
    }

    #[tokio::test]
    async fn test_search_by_tag_is_substring_match() {
        let (_temp, store) = setup();
        let db = store.session().unwrap();

        let work = db.create_note(new_note("Work", &["important", "work"])).await.unwrap();
        tick();
        let home = db.create_note(new_note("Home", &["home"])).await.unwrap();
        tick();
        let network = db.create_note(new_note("Net", &["network"])).await.unwrap();

        assert_eq!(ids(&db.search_by_tag("work").await.unwrap()), vec![network, work]);
        assert_eq!(ids(&db.search_by_tag("wo").await.unwrap()), vec![network, work]);
        assert_eq!(ids(&db.search_by_tag("home").await.unwrap()), vec![home]);
        assert!(db.search_by_tag("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_by_tag_is_case_sensitive_and_literal() {
        let (_temp, store) = setup();
        let db = store.session().unwrap();

        db.create_note(new_note("Work", &["work"])).await.unwrap();
        let pct = db.create_note(new_note("Percent", &["100%"])).await.unwrap();

        assert!(db.search_by_tag("WORK").await.unwrap().is_empty());
        assert_eq!(ids(&db.search_by_tag("%").await.unwrap()), vec![pct]);
        assert!(db.search_by_tag("_").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ping() {
        let (_temp, store) = setup();
        store.session().unwrap().ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_reopen_keeps_notes() {
        let (temp, store) = setup();
        let id = store
            .session()
            .unwrap()
            .create_note(new_note("Durable", &["x"]))
            .await
            .unwrap();

        let reopened = SqliteStore::open(temp.path().join("notes.db")).unwrap();
        let note = reopened.session().unwrap().get_note(id).await.unwrap().unwrap();
        assert_eq!(note.title, "Durable");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sessions_write() {
        let (_temp, store) = setup();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let db = store.session().unwrap();
                db.create_note(new_note(&format!("Note {}", i), &["batch"]))
                    .await
                    .unwrap()
            }));
        }

        let mut created = Vec::new();
        for handle in handles {
            created.push(handle.await.unwrap());
        }
        created.sort();
        created.dedup();
        assert_eq!(created.len(), 8);

        let db = store.session().unwrap();
        assert_eq!(db.search_by_tag("batch").await.unwrap().len(), 8);
    }
}
