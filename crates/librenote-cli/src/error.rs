use std::io;

use librenote_core::auth::AuthError;
use librenote_core::remote::RemoteError;
use librenote_core::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] librenote_core::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Name cannot be empty")]
    EmptyName,
    #[error("Search query cannot be empty")]
    EmptySearchQuery,
    #[error("Notebook ID cannot be empty")]
    EmptyNotebookId,
    #[error("Notebook not found for id/prefix: {0}")]
    NotebookNotFound(String),
    #[error("Section not found: {0}")]
    SectionNotFound(String),
    #[error("Page not found: {0}")]
    PageNotFound(String),
    #[error("{0}")]
    Ambiguous(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Drive returned no link for file {0}")]
    NoLink(String),
}

impl CliError {
    /// Whether signing in again would fix this error
    pub const fn requires_login(&self) -> bool {
        match self {
            Self::Sync(error) => error.requires_reauthentication(),
            Self::Auth(error) => matches!(error, AuthError::NotAuthenticated),
            Self::Remote(error) => {
                matches!(error, RemoteError::NotAuthenticated | RemoteError::Unauthorized)
            }
            _ => false,
        }
    }
}
