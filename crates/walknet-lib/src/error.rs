use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the walknet library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// No snapshot has been published yet, or the published one is empty.
    #[error("walking network graph is not loaded yet")]
    GraphNotReady,

    /// No connected node exists for the named point.
    #[error("no nearby walkable network for {point}")]
    NodeResolutionFailed { point: String },

    /// The search frontier was exhausted without reaching the goal.
    #[error("no path found from {start} to {goal}")]
    PathNotFound { start: String, goal: String },

    /// A caller-supplied parameter is outside its accepted range.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Another rebuild currently owns the rebuild slot.
    #[error("a graph rebuild is already in progress")]
    RebuildInProgress,

    /// Network catalog could not be located at the resolved path.
    #[error("network database not found at {path}")]
    DatabaseNotFound { path: PathBuf },

    /// The catalog does not expose the expected node/link tables.
    #[error("unsupported network schema; missing table {missing}")]
    UnsupportedSchema { missing: String },

    /// Store-specific failure that is not an I/O or SQLite error.
    #[error("network store failure: {message}")]
    Store { message: String },

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput {
            message: message.into(),
        }
    }

    /// Whether the error is an expected query outcome rather than a storage failure.
    ///
    /// Storage failures only happen while rebuilding; everything else is a
    /// normal answer that callers should surface as a structured result.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Error::DatabaseNotFound { .. }
                | Error::UnsupportedSchema { .. }
                | Error::Store { .. }
                | Error::Sqlite(_)
                | Error::Io(_)
        )
    }
}
