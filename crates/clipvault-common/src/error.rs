//! Store-level errors.
//!
//! Only the video store produces these. The delivery pipeline wraps them in
//! its own taxonomy before anything reaches HTTP.

/// Failure reported by the video store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Pool checkout, migration or query failure.
    #[error("Database error: {0}")]
    Database(String),

    /// A record was rejected before it reached SQLite.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
