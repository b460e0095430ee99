//! Application configuration stored at `<config_dir>/librenote/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::default_data_dir;
use crate::sync::DEFAULT_REMOTE_FOLDER;
use crate::util::normalize_text_option;

const APP_DIR_NAME: &str = "librenote";
const CONFIG_FILE_NAME: &str = "config.json";
const CLIENT_SECRET_FILE_NAME: &str = "client_secret.json";

/// Overrides the notebook directory from the environment
pub const ENV_DATA_DIR: &str = "LIBRENOTE_DATA_DIR";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Notebook directory; `~/LibreNoteData/notebooks` when unset
    pub data_dir: Option<PathBuf>,
    /// Google OAuth `client_secret.json`; looked up next to this file when unset
    pub client_secret_path: Option<PathBuf>,
    /// Remote folder holding notebook blobs
    pub remote_folder: String,
    pub request_timeout_secs: u64,
    pub auth_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            client_secret_path: None,
            remote_folder: DEFAULT_REMOTE_FOLDER.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            auth_timeout_secs: DEFAULT_AUTH_TIMEOUT_SECS,
        }
    }
}

/// `<config_dir>/librenote`, also home of the token file
pub fn app_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| Error::Config("Failed to resolve config directory".to_string()))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(app_config_dir()?.join(CONFIG_FILE_NAME))
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_from_path(&default_config_path()?)
    }

    /// Read and normalize the config; a missing file yields the defaults
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|error| {
            Error::Config(format!(
                "Failed to read config at {}: {error}",
                path.display()
            ))
        })?;
        let mut config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::Config(format!(
                "Failed to parse config at {}: {error}",
                path.display()
            ))
        })?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| Error::file(parent, error))?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)?;
        std::fs::write(path, serialized).map_err(|error| Error::file(path, error))
    }

    /// Notebook directory: explicit flag, then `LIBRENOTE_DATA_DIR`, then this
    /// config, then the default location
    pub fn resolve_data_dir(
        &self,
        explicit: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<PathBuf> {
        if let Some(path) = normalize_path(explicit.map(Path::to_path_buf)) {
            return Ok(path);
        }
        if let Some(path) = normalize_text_option(lookup(ENV_DATA_DIR)) {
            return Ok(PathBuf::from(path));
        }
        if let Some(path) = &self.data_dir {
            return Ok(path.clone());
        }
        default_data_dir()
    }

    /// Configured client secret path, or `client_secret.json` in `config_dir`
    pub fn client_secret_path_in(&self, config_dir: &Path) -> PathBuf {
        self.client_secret_path
            .clone()
            .unwrap_or_else(|| config_dir.join(CLIENT_SECRET_FILE_NAME))
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub const fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }

    fn normalize(&mut self) {
        self.data_dir = normalize_path(self.data_dir.take());
        self.client_secret_path = normalize_path(self.client_secret_path.take());
        self.remote_folder = normalize_text_option(Some(std::mem::take(&mut self.remote_folder)))
            .unwrap_or_else(|| DEFAULT_REMOTE_FOLDER.to_string());
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
        if self.auth_timeout_secs == 0 {
            self.auth_timeout_secs = DEFAULT_AUTH_TIMEOUT_SECS;
        }
    }
}

fn normalize_path(value: Option<PathBuf>) -> Option<PathBuf> {
    let value = value?;
    match value.to_str() {
        Some(text) => normalize_text_option(Some(text.to_string())).map(PathBuf::from),
        None => Some(value),
    }
}
