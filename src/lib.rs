//! # Survey Server
//!
//! Minimal survey backend: accepts survey submissions over HTTP, persists
//! them to a local SQLite file and serves them back as JSON.
//!
//! Survey Server provides:
//! - A SQLite-backed store for `survey_responses` (insert, list, stats, CSV export)
//! - Wire types and the comma-delimited codec for multi-choice answers
//! - An axum router with CORS and static file fallback
//! - Configuration loading and terminal output helpers for the CLI

pub mod survey;
pub mod storage;
pub mod server;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use survey::{SurveyRecord, SurveySubmission};
pub use storage::SqliteStore;

/// Result type alias for survey operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for survey operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Coarse classification used for internal diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The database could not be opened or its handle could not be acquired
    StorageUnavailable,
    /// A statement failed to prepare, execute or step
    StorageOperation,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Unavailable(_) => ErrorKind::StorageUnavailable,
            Error::Storage(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::CannotOpen =>
            {
                ErrorKind::StorageUnavailable
            }
            Error::Storage(_) => ErrorKind::StorageOperation,
            _ => ErrorKind::Other,
        }
    }
}
