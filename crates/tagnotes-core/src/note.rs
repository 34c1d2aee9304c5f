use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Separator used to pack a tag list into the single `tags` column.
///
/// A tag that itself contains the delimiter is split apart on read.
pub const TAG_DELIMITER: &str = ",";

/// A full note with all fields.
///
/// On the wire `tags` is the comma-joined string exactly as stored, which is
/// what existing clients split on their side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(with = "joined")]
    pub tags: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Parameters for creating a new note.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Replacement values for the mutable fields of a note.
///
/// Updates are full replaces: every field is written, there is no merge.
#[derive(Debug, Default, Clone)]
pub struct NoteChanges {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

/// Pack tags into their stored form. An empty list becomes an empty string.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(TAG_DELIMITER)
}

/// Rebuild the tag list from its stored form.
///
/// Empty pieces are kept so that re-joining gives back the stored string.
/// The only lossy case is a list holding one empty tag, which reads back empty.
pub fn split_tags(stored: &str) -> Vec<String> {
    if stored.is_empty() {
        return Vec::new();
    }
    stored.split(TAG_DELIMITER).map(String::from).collect()
}

mod joined {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(tags: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::join_tags(tags))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let stored = String::deserialize(deserializer)?;
        Ok(super::split_tags(&stored))
    }
}
