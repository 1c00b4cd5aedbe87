//! Common error types for the nursery back check service

use thiserror::Error;

/// Common result type for nursery operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the workspace
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Uniqueness constraint violated (e.g. duplicate woreda name)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Credential or session failure
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Attachment upload to object storage failed
    #[error("Upload error: {0}")]
    Upload(String),

    /// Schema migration failed for a reason other than an already-present column
    #[error("Migration v{version} failed: {message}")]
    Migration { version: i64, message: String },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map a sqlx error from an INSERT into `Conflict` when it is a unique
    /// constraint violation, leaving every other error untouched.
    pub fn from_insert(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Error::Conflict(format!("{} already exists", what));
            }
        }
        Error::Database(err)
    }
}
