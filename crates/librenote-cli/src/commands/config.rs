use std::env;
use std::path::PathBuf;

use librenote_core::config::{app_config_dir, default_config_path, AppConfig};

use crate::cli::ConfigCommands;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => run_config_show(),
        ConfigCommands::Init {
            data_dir,
            client_secret,
            remote_folder,
            timeout_secs,
        } => run_config_init(data_dir, client_secret, remote_folder, timeout_secs),
    }
}

fn run_config_show() -> Result<(), CliError> {
    let config = AppConfig::load()?;
    let config_dir = app_config_dir()?;
    let data_dir = config.resolve_data_dir(None, |key| env::var(key).ok())?;

    println!("Config file: {}", default_config_path()?.display());
    println!("Notebook directory: {}", data_dir.display());
    println!(
        "Client secret: {}",
        config.client_secret_path_in(&config_dir).display()
    );
    println!("Drive folder: {}", config.remote_folder);
    println!("Request timeout: {}s", config.request_timeout_secs);
    println!("Sign-in timeout: {}s", config.auth_timeout_secs);
    Ok(())
}

/// Merge the given values over the existing config and save it
pub fn apply_config_init(
    mut config: AppConfig,
    data_dir: Option<PathBuf>,
    client_secret: Option<PathBuf>,
    remote_folder: Option<String>,
    timeout_secs: Option<u64>,
) -> AppConfig {
    if data_dir.is_some() {
        config.data_dir = data_dir;
    }
    if client_secret.is_some() {
        config.client_secret_path = client_secret;
    }
    if let Some(remote_folder) = remote_folder {
        config.remote_folder = remote_folder;
    }
    if let Some(timeout_secs) = timeout_secs {
        config.request_timeout_secs = timeout_secs;
    }
    config
}

fn run_config_init(
    data_dir: Option<PathBuf>,
    client_secret: Option<PathBuf>,
    remote_folder: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<(), CliError> {
    let existing = AppConfig::load()?;
    let config = apply_config_init(existing, data_dir, client_secret, remote_folder, timeout_secs);
    let path = config.save()?;
    println!("Saved config to {}", path.display());
    Ok(())
}
