//! Google OAuth2 installed-app flow: code exchange, refresh, logout.

use std::fs;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

use super::callback::CallbackListener;
use super::{AuthError, AuthResult, IdentityProvider, Session, SessionPersistence};
use crate::util::{compact_text, normalize_text_option, unix_timestamp_now};

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8234";
pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

const AUTHORIZATION_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const ENV_CLIENT_ID: &str = "LIBRENOTE_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "LIBRENOTE_CLIENT_SECRET";
const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 300;
const TOKEN_HTTP_TIMEOUT_SECS: u64 = 30;

/// Client registration and endpoints for the OAuth flow
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub authorization_url: String,
    pub token_url: String,
    pub callback_timeout: Duration,
}

impl std::fmt::Debug for OAuthClientConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecretEntry>,
    web: Option<ClientSecretEntry>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretEntry {
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl OAuthClientConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: vec![DRIVE_FILE_SCOPE.to_string()],
            authorization_url: AUTHORIZATION_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            callback_timeout: Duration::from_secs(DEFAULT_CALLBACK_TIMEOUT_SECS),
        }
    }

    /// Parse a Google `client_secret.json` (`installed` or `web` application)
    pub fn from_client_secret_json(raw: &str) -> AuthResult<Self> {
        let file: ClientSecretFile = serde_json::from_str(raw)?;
        let entry = file
            .installed
            .or(file.web)
            .ok_or(AuthError::NotConfigured)?;
        let client_id = normalize_text_option(entry.client_id).ok_or(AuthError::NotConfigured)?;
        let client_secret = normalize_text_option(entry.client_secret).unwrap_or_default();
        Ok(Self::new(client_id, client_secret))
    }

    /// Resolve the client registration from a secret file and environment overrides.
    ///
    /// Returns `Ok(None)` when neither source provides a client id.
    pub fn resolve(
        client_secret_path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> AuthResult<Option<Self>> {
        let mut config = match client_secret_path.filter(|path| path.exists()) {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|error| {
                    AuthError::InvalidConfiguration(format!(
                        "failed to read {}: {error}",
                        path.display()
                    ))
                })?;
                tracing::debug!("Loaded OAuth client from {}", path.display());
                Some(Self::from_client_secret_json(&raw)?)
            }
            None => None,
        };

        if let Some(client_id) = normalize_text_option(lookup(ENV_CLIENT_ID)) {
            match config.as_mut() {
                Some(existing) => existing.client_id = client_id,
                None => config = Some(Self::new(client_id, String::new())),
            }
        }
        if let Some(secret) = normalize_text_option(lookup(ENV_CLIENT_SECRET)) {
            if let Some(existing) = config.as_mut() {
                existing.client_secret = secret;
            }
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Consent page URL requesting offline access
    pub fn authorization_url(&self) -> AuthResult<Url> {
        let mut url = Url::parse(&self.authorization_url)
            .map_err(|error| AuthError::InvalidConfiguration(error.to_string()))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");
        Ok(url)
    }

    /// Local address the redirect URI points at
    pub fn redirect_addr(&self) -> AuthResult<SocketAddr> {
        let url = Url::parse(&self.redirect_uri)
            .map_err(|error| AuthError::InvalidConfiguration(error.to_string()))?;
        let host = url.host_str().ok_or_else(|| {
            AuthError::InvalidConfiguration("redirect URI must include a host".to_string())
        })?;
        let port = url.port_or_known_default().ok_or_else(|| {
            AuthError::InvalidConfiguration("redirect URI must include a port".to_string())
        })?;
        (host, port)
            .to_socket_addrs()
            .map_err(|error| AuthError::InvalidConfiguration(error.to_string()))?
            .next()
            .ok_or_else(|| {
                AuthError::InvalidConfiguration(format!("cannot resolve redirect host {host}"))
            })
    }
}

/// Google account identity backed by a persisted `Session`
pub struct GoogleIdentity<S: SessionPersistence> {
    config: OAuthClientConfig,
    client: Client,
    store: S,
    session: Mutex<Option<Session>>,
}

impl<S: SessionPersistence> GoogleIdentity<S> {
    /// Create the identity and load any stored session.
    ///
    /// An unreadable token file is treated as signed out.
    pub fn new(config: OAuthClientConfig, store: S) -> AuthResult<Self> {
        let session = match store.load_session() {
            Ok(session) => session,
            Err(error) => {
                tracing::warn!("Ignoring unreadable stored session: {}", error);
                None
            }
        };
        Ok(Self {
            config,
            client: Client::builder()
                .timeout(Duration::from_secs(TOKEN_HTTP_TIMEOUT_SECS))
                .build()?,
            store,
            session: Mutex::new(session),
        })
    }

    pub const fn config(&self) -> &OAuthClientConfig {
        &self.config
    }

    /// Snapshot of the current session
    pub async fn session(&self) -> Option<Session> {
        self.session.lock().await.clone()
    }

    /// Exchange a one-time authorization code for a token pair and store it
    pub async fn exchange_code(&self, code: &str) -> AuthResult<Session> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::Callback(
                "authorization code must not be empty".to_string(),
            ));
        }
        let form = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let response = self.post_token_request(&form).await?;
        let session = response.into_session(None)?;

        self.store.save_session(&session)?;
        *self.session.lock().await = Some(session.clone());
        tracing::info!("Stored new Google Drive session");
        Ok(session)
    }

    async fn post_token_request(&self, form: &[(&str, &str)]) -> AuthResult<TokenResponse> {
        let response = self
            .client
            .post(&self.config.token_url)
            .header("Accept", "application/json")
            .form(form)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }
        Ok(response.json::<TokenResponse>().await?)
    }
}

#[async_trait]
impl<S: SessionPersistence> IdentityProvider for GoogleIdentity<S> {
    async fn authenticate(&self) -> AuthResult<()> {
        if self.config.client_id.trim().is_empty() {
            return Err(AuthError::NotConfigured);
        }
        let listener = CallbackListener::bind(self.config.redirect_addr()?).await?;
        let url = self.config.authorization_url()?;

        tracing::info!("Opening browser for Google authorization");
        if let Err(error) = open::that(url.as_str()) {
            tracing::warn!(
                "Could not open a browser ({}); visit this URL to continue: {}",
                error,
                url
            );
        }

        let code = listener.wait_for_code(self.config.callback_timeout).await?;
        self.exchange_code(&code).await?;
        Ok(())
    }

    async fn access_token(&self) -> AuthResult<String> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|session| session.access_token.clone())
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::NotAuthenticated)
    }

    async fn refresh_token(&self) -> AuthResult<String> {
        let mut guard = self.session.lock().await;
        let current = guard.as_ref().ok_or(AuthError::NotAuthenticated)?;
        let refresh_token = current
            .refresh_token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .ok_or(AuthError::NotAuthenticated)?;

        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let response = match self.post_token_request(&form).await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!("Failed to refresh access token: {}", error);
                return Err(error);
            }
        };
        let refreshed = response.into_session(Some(refresh_token))?;

        self.store.save_session(&refreshed)?;
        let token = refreshed.access_token.clone();
        *guard = Some(refreshed);
        tracing::debug!("Refreshed Google Drive access token");
        Ok(token)
    }

    async fn is_authenticated(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .is_some_and(|session| !session.access_token.is_empty())
    }

    async fn logout(&self) -> AuthResult<()> {
        *self.session.lock().await = None;
        self.store.clear_session()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    scope: Option<String>,
    token_type: Option<String>,
    error_description: Option<String>,
}

impl TokenResponse {
    /// Build a session, keeping `previous_refresh` when the response omits one
    fn into_session(self, previous_refresh: Option<String>) -> AuthResult<Session> {
        let access_token = normalize_text_option(self.access_token).ok_or_else(|| {
            AuthError::Api(
                self.error_description
                    .unwrap_or_else(|| "Token exchange failed".to_string()),
            )
        })?;
        Ok(Session {
            access_token,
            refresh_token: normalize_text_option(self.refresh_token).or(previous_refresh),
            expires_at: self
                .expires_in
                .map(|expires_in| unix_timestamp_now().saturating_add(expires_in)),
            scope: self.scope,
            token_type: self.token_type,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<OAuthErrorResponse>(body) {
        if let Some(message) = payload.error_description.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
