use chrono::{DateTime, Utc};
use librenote_core::auth::{IdentityProvider, SessionPersistence};

use crate::cli::AuthCommands;
use crate::commands::common::Context;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, context: &Context) -> Result<(), CliError> {
    match command {
        AuthCommands::Login => {
            let identity = context.identity()?;
            println!("Waiting for Google authorization in your browser...");
            identity.authenticate().await?;
            println!("Signed in to Google Drive");
            Ok(())
        }
        AuthCommands::Status => {
            let session_store = context.session_store();
            match session_store.load_session()? {
                Some(session) => {
                    let expiry = session
                        .expires_at
                        .and_then(|seconds| DateTime::<Utc>::from_timestamp(seconds, 0))
                        .map_or_else(|| "unknown".to_string(), |at| at.to_rfc3339());
                    let state = if session.is_expired() {
                        "expired, will refresh on next use"
                    } else {
                        "active"
                    };
                    println!("Signed in to Google Drive ({state}; expires_at={expiry})");
                    if session.refresh_token.is_none() {
                        println!("No refresh token stored; sign in again when the session expires.");
                    }
                }
                None => println!("Not signed in. Run `librenote auth login`."),
            }
            println!("Token file: {}", session_store.path().display());
            Ok(())
        }
        AuthCommands::Logout => {
            let session_store = context.session_store();
            if session_store.load_session()?.is_none() {
                println!("Not signed in.");
                return Ok(());
            }
            session_store.clear_session()?;
            println!("Signed out of Google Drive");
            Ok(())
        }
    }
}
