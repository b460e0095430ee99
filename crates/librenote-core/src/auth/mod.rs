//! Identity provider abstraction and OAuth session persistence.

mod callback;
mod google;

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::unix_timestamp_now;

pub use callback::CallbackListener;
pub use google::{GoogleIdentity, OAuthClientConfig, DEFAULT_REDIRECT_URI, DRIVE_FILE_SCOPE};

const EXPIRY_SKEW_SECONDS: i64 = 60;
const TOKEN_FILE_NAME: &str = "gdrive-token.json";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Google OAuth client is not configured. Provide client_secret.json or set LIBRENOTE_CLIENT_ID and LIBRENOTE_CLIENT_SECRET.")]
    NotConfigured,
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Token storage error: {0}")]
    Storage(String),
    #[error("Authorization callback failed: {0}")]
    Callback(String),
    #[error("Timed out after {0}s waiting for browser authorization")]
    Timeout(u64),
    #[error("Not authenticated")]
    NotAuthenticated,
}

pub type AuthResult<T> = Result<T, AuthError>;

/// OAuth token pair for the remote store
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl Session {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Supplies live credentials to remote calls.
///
/// The sync core only asks for a token and, after an authorization failure,
/// for a refreshed one. Everything else is driven by the front end.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the interactive authorization flow and store the resulting session
    async fn authenticate(&self) -> AuthResult<()>;

    /// Current access token
    async fn access_token(&self) -> AuthResult<String>;

    /// Exchange the refresh credential for a new access token and return it
    async fn refresh_token(&self) -> AuthResult<String>;

    async fn is_authenticated(&self) -> bool;

    /// Forget the session, in memory and on disk
    async fn logout(&self) -> AuthResult<()>;
}

pub trait SessionPersistence: Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<Session>>;
    fn save_session(&self, session: &Session) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// Plain JSON token file. Not encrypted at rest.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Token file inside the given config directory
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(TOKEN_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for FileSessionStore {
    fn load_session(&self) -> AuthResult<Option<Session>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(AuthError::Storage(format!(
                "Failed to read {}: {error}",
                self.path.display()
            ))),
        }
    }

    fn save_session(&self, session: &Session) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                AuthError::Storage(format!(
                    "Failed to create token directory {}: {error}",
                    parent.display()
                ))
            })?;
        }
        let serialized = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, serialized).map_err(|error| {
            AuthError::Storage(format!("Failed to write {}: {error}", self.path.display()))
        })
    }

    fn clear_session(&self) -> AuthResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AuthError::Storage(format!(
                "Failed to remove {}: {error}",
                self.path.display()
            ))),
        }
    }
}
