use tracing::warn;

use crate::error::Result;
use crate::{Database, Error, NewNote, Note, NoteChanges, TAG_DELIMITER};

/// The service that holds the note rules on top of a [`Database`] session.
pub struct NotesService<D: Database> {
    db: D,
}

impl<D: Database> NotesService<D> {
    pub fn new(db: D) -> Self {
        Self { db }
    }

    /// Create a note. The title must not be blank; it is stored as given.
    pub async fn create_note(
        &self,
        title: String,
        content: String,
        tags: Vec<String>,
    ) -> Result<i64> {
        if title.trim().is_empty() {
            return Err(Error::Validation("title cannot be empty".into()));
        }
        warn_on_delimiter(&tags);

        self.db
            .create_note(NewNote {
                title,
                content,
                tags,
            })
            .await
    }

    pub async fn get_note(&self, id: i64) -> Result<Option<Note>> {
        self.db.get_note(id).await
    }

    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        self.db.list_notes().await
    }

    /// Replace every mutable field of a note.
    ///
    /// Fields the caller left out arrive here as empty values and overwrite
    /// what was stored. Returns false when no note has this ID.
    pub async fn update_note(
        &self,
        id: i64,
        title: String,
        content: String,
        tags: Vec<String>,
    ) -> Result<bool> {
        warn_on_delimiter(&tags);
        let changes = NoteChanges {
            title,
            content,
            tags,
        };

        let updated = self.db.update_note(id, changes).await?;
        if !updated {
            warn!(note_id = id, "update matched no note");
        }
        Ok(updated)
    }

    pub async fn delete_note(&self, id: i64) -> Result<bool> {
        self.db.delete_note(id).await
    }

    pub async fn search_by_tag(&self, tag: &str) -> Result<Vec<Note>> {
        self.db.search_by_tag(tag).await
    }

    pub async fn ping(&self) -> Result<()> {
        self.db.ping().await
    }
}

fn warn_on_delimiter(tags: &[String]) {
    for tag in tags.iter().filter(|t| t.contains(TAG_DELIMITER)) {
        warn!(tag = %tag, "tag contains the delimiter and will be split on read");
    }
}
