//! Push/pull reconciliation between the local store and a `RemoteStore`.

mod engine;
mod merge;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Notebook;
use crate::remote::RemoteError;

pub use engine::{PullReport, PushReport, SkippedBlob, SyncEngine, DEFAULT_REMOTE_FOLDER};
pub use merge::{apply_merge, merge_remote, MergeReport};

/// Which way a sync moves data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    Push,
    Pull,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push => f.write_str("push"),
            Self::Pull => f.write_str("pull"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Not authenticated with Google Drive. Sign in again to continue syncing.")]
    NotAuthenticated,
    #[error("Remote sync failed: {0}")]
    Transport(#[source] RemoteError),
    #[error("Local storage error: {0}")]
    LocalIo(#[from] crate::Error),
    #[error("A {0} is already in progress")]
    InProgress(SyncDirection),
}

impl SyncError {
    /// True when the front end should restart the OAuth flow
    pub const fn requires_reauthentication(&self) -> bool {
        matches!(self, Self::NotAuthenticated)
    }
}

impl From<RemoteError> for SyncError {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::NotAuthenticated | RemoteError::Unauthorized => Self::NotAuthenticated,
            other => Self::Transport(other),
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Serializable result of a sync command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub reauthenticate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebooks: Option<Vec<Notebook>>,
}

impl SyncOutcome {
    pub fn pushed(report: &PushReport) -> Self {
        Self {
            success: true,
            error: None,
            reauthenticate: false,
            count: Some(report.pushed),
            notebooks: None,
        }
    }

    pub fn pulled(notebooks: Vec<Notebook>) -> Self {
        Self {
            success: true,
            error: None,
            reauthenticate: false,
            count: Some(notebooks.len()),
            notebooks: Some(notebooks),
        }
    }

    pub fn failed(error: &SyncError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            reauthenticate: error.requires_reauthentication(),
            count: None,
            notebooks: None,
        }
    }
}
