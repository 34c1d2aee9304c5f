use crate::error::Result;
use crate::{NewNote, Note, NoteChanges};

/// Storage abstraction for notes.
///
/// One implementor value is one session against the store: handlers acquire
/// it per request and drop it when the response is built. Every method is a
/// single statement that has committed by the time it returns.
#[async_trait::async_trait]
pub trait Database: Send + Sync {
    /// Insert a new note and return its ID.
    async fn create_note(&self, note: NewNote) -> Result<i64>;

    /// Get a note by ID. `None` when no row matches.
    async fn get_note(&self, id: i64) -> Result<Option<Note>>;

    /// All notes, most recently updated first.
    async fn list_notes(&self) -> Result<Vec<Note>>;

    /// Replace title, content and tags. Returns false when the ID matched
    /// nothing; that is not an error.
    async fn update_note(&self, id: i64, changes: NoteChanges) -> Result<bool>;

    /// Delete a note by ID. Returns true if deleted, false if not found.
    async fn delete_note(&self, id: i64) -> Result<bool>;

    /// Notes whose stored tag string contains `tag` (case-sensitive substring),
    /// most recently updated first.
    async fn search_by_tag(&self, tag: &str) -> Result<Vec<Note>>;

    /// Run a trivial query to prove the store answers.
    async fn ping(&self) -> Result<()>;
}
