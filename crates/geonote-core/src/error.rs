//! Error types for geonote-core

use thiserror::Error;

/// Result type alias using geonote-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to the document store
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport failure
    #[error("Backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the operation
    #[error("Backend error: {0}")]
    Backend(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Document payload did not match the note schema
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
