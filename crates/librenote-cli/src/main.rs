//! LibreNote CLI - notebooks, sections and pages with Google Drive sync

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, PageCommands, SectionCommands, SyncCommands};
use crate::commands::add::{run_new, run_page_add, run_section_add};
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::Context;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::drive::run_drive;
use crate::commands::edit::{run_page_edit, run_rename};
use crate::commands::list::run_list;
use crate::commands::search::run_search;
use crate::commands::show::run_show;
use crate::commands::sync::{run_sync_pull, run_sync_push};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        if error.requires_login() {
            eprintln!("Run `librenote auth login` to sign in to Google Drive.");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::from_default_env();
    let filter = match "librenote=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Commands::Config { command } = cli.command {
        return run_config(command);
    }

    let context = Context::load(cli.data_dir.as_deref())?;
    let store = &context.store;

    match cli.command {
        Commands::List { json } => run_list(json, store)?,
        Commands::New { name } => {
            run_new(&name, store)?;
        }
        Commands::Rename { notebook, name } => run_rename(&notebook, &name, store)?,
        Commands::Delete { notebook, remote } => run_delete(&notebook, remote, &context).await?,
        Commands::Show { notebook, json } => run_show(&notebook, json, store)?,
        Commands::Search { query, json } => run_search(&query, json, store)?,
        Commands::Section {
            command: SectionCommands::Add { notebook, name },
        } => {
            run_section_add(&notebook, &name, store)?;
        }
        Commands::Page { command } => match command {
            PageCommands::Add {
                notebook,
                section,
                title,
                content,
            } => {
                run_page_add(&notebook, &section, &title, &content, store)?;
            }
            PageCommands::Edit {
                notebook,
                section,
                page,
            } => run_page_edit(&notebook, &section, &page, store)?,
        },
        Commands::Sync { command } => match command {
            SyncCommands::Push { json } => run_sync_push(json, &context).await?,
            SyncCommands::Pull { json } => run_sync_pull(json, &context).await?,
        },
        Commands::Auth { command } => run_auth(command, &context).await?,
        Commands::Drive { command } => run_drive(command, &context).await?,
        Commands::Config { .. } => {}
    }

    Ok(())
}
