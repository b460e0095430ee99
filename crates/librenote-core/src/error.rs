//! Error types for librenote-core

use thiserror::Error;

/// Result type alias using librenote-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the notebook model and the local store
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// IO error tied to a specific file
    #[error("IO error at {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A notebook file on disk could not be decoded
    #[error("Invalid notebook file {path}: {source}")]
    CorruptNotebook {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Notebook, section or page not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn file(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::File {
            path: path.display().to_string(),
            source,
        }
    }
}
