//! tagnotes core library - shared types, traits, and business logic.
//!
//! This crate contains no I/O; storage backends implement [`Database`].

mod db;
mod error;
mod note;
mod schema;
mod service;

pub use db::Database;
pub use error::Error;
pub use note::{join_tags, split_tags, NewNote, Note, NoteChanges, TAG_DELIMITER};
pub use schema::{SCHEMA, SCHEMA_VERSION};
pub use service::NotesService;
