//! Remote blob store: folder/blob operations and the Google Drive client.

mod drive;
mod retry;
mod wire;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AuthError;

pub use drive::{DriveClient, DriveFile, DEFAULT_API_BASE};
pub use retry::with_auth_retry;
pub use wire::{escape_query_literal, mime_for_path};

/// MIME type of notebook blobs
pub const JSON_MIME: &str = "application/json";
/// MIME type Drive uses for folders
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Not authenticated with Google Drive")]
    NotAuthenticated,
    #[error("Access token was rejected")]
    Unauthorized,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Drive API error: {message} ({status})")]
    Api { status: u16, message: String },
    #[error("Unexpected Drive response: {0}")]
    InvalidResponse(String),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AuthError> for RemoteError {
    fn from(error: AuthError) -> Self {
        tracing::debug!("Credential unavailable: {}", error);
        Self::NotAuthenticated
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

macro_rules! remote_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

remote_id!(
    /// Opaque id of the application folder
    FolderId
);
remote_id!(
    /// Opaque id of a stored blob
    BlobId
);

/// Listing entry for a stored blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobInfo {
    pub id: BlobId,
    pub name: String,
}

/// Named JSON blobs inside a single application folder.
///
/// Implementations handle credential refresh themselves; callers only see
/// `RemoteError::NotAuthenticated` once a refreshed credential was also
/// rejected.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Folder id for `name`, creating the folder if absent.
    ///
    /// With several same-named folders, the first match wins.
    async fn find_or_create_folder(&self, name: &str) -> RemoteResult<FolderId>;

    /// Blobs directly inside `folder`, optionally restricted to one MIME type
    async fn list_blobs(
        &self,
        folder: &FolderId,
        mime_filter: Option<&str>,
    ) -> RemoteResult<Vec<BlobInfo>>;

    /// First blob named `name` inside `folder`
    async fn find_blob(&self, folder: &FolderId, name: &str) -> RemoteResult<Option<BlobInfo>>;

    /// Raw content of a blob
    async fn get_blob(&self, id: &BlobId) -> RemoteResult<Vec<u8>>;

    /// Create a JSON blob
    async fn put_blob(&self, folder: &FolderId, name: &str, content: &[u8])
        -> RemoteResult<BlobInfo>;

    /// Overwrite an existing JSON blob
    async fn update_blob(&self, id: &BlobId, name: &str, content: &[u8]) -> RemoteResult<()>;

    async fn delete_blob(&self, id: &BlobId) -> RemoteResult<()>;
}
