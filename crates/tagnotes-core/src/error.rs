use std::fmt::Display;

use thiserror::Error;

/// Failures surfaced by the store and the notes service.
#[derive(Error, Debug)]
pub enum Error {
    /// The caller supplied an unusable note (e.g. a blank title).
    #[error("validation error: {0}")]
    Validation(String),

    /// The storage engine failed: I/O, constraint, or a malformed row.
    #[error("database error: {0}")]
    Database(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Infrastructure around the engine failed (poisoned lock, cancelled task).
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn database(err: impl Display) -> Self {
        Error::Database(err.to_string())
    }

    pub fn internal(err: impl Display) -> Self {
        Error::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
