use librenote_core::remote::DriveFile;

use crate::cli::DriveCommands;
use crate::commands::common::{normalize_search_query, truncate, Context};
use crate::error::CliError;

pub fn format_file_lines(files: &[DriveFile]) -> Vec<String> {
    files
        .iter()
        .map(|file| {
            let name = truncate(&file.name, 40);
            let modified = file.modified_time.as_deref().unwrap_or("");
            format!("{:<34}  {name:<40}  {modified}", file.id)
        })
        .collect()
}

pub async fn run_drive(command: DriveCommands, context: &Context) -> Result<(), CliError> {
    let drive = context.drive()?;
    match command {
        DriveCommands::Upload { path } => {
            let file = drive
                .upload_file(&context.config.remote_folder, &path)
                .await?;
            println!("{}", file.id);
            if let Some(link) = file.link() {
                println!("{link}");
            }
        }
        DriveCommands::Download { file_id, dest } => {
            let written = drive.download_file(&file_id, &dest).await?;
            println!("Downloaded {written} bytes to {}", dest.display());
        }
        DriveCommands::Search { query, json } => {
            let query = normalize_search_query(&query)?;
            let files = drive.search_files(&query).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else if files.is_empty() {
                println!("No Drive files match '{query}'.");
            } else {
                for line in format_file_lines(&files) {
                    println!("{line}");
                }
            }
        }
        DriveCommands::Link { file_id } => {
            let file = drive.file_link(&file_id).await?;
            let link = file.link().ok_or(CliError::NoLink(file_id))?;
            println!("{link}");
        }
    }
    Ok(())
}
