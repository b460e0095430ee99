use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "librenote")]
#[command(about = "Notebooks, sections and pages with Google Drive sync")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Notebook directory (overrides LIBRENOTE_DATA_DIR and the config file)
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List notebooks
    #[command(alias = "ls")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a notebook
    New {
        /// Notebook name
        name: Vec<String>,
    },
    /// Rename a notebook
    Rename {
        /// Notebook ID or unique ID prefix
        notebook: String,
        /// New name
        name: Vec<String>,
    },
    /// Delete a notebook
    #[command(alias = "rm")]
    Delete {
        /// Notebook ID or unique ID prefix
        notebook: String,
        /// Also delete the notebook from Google Drive
        #[arg(long)]
        remote: bool,
    },
    /// Show a notebook's sections and pages
    Show {
        /// Notebook ID or unique ID prefix
        notebook: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search page titles and content
    Search {
        /// Search query
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage sections
    Section {
        #[command(subcommand)]
        command: SectionCommands,
    },
    /// Manage pages
    Page {
        #[command(subcommand)]
        command: PageCommands,
    },
    /// Synchronize notebooks with Google Drive
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Manage the Google Drive session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Upload, download and find files in Google Drive
    Drive {
        #[command(subcommand)]
        command: DriveCommands,
    },
    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum SectionCommands {
    /// Add a section to a notebook
    Add {
        /// Notebook ID or unique ID prefix
        notebook: String,
        /// Section name
        name: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum PageCommands {
    /// Add a page to a section
    Add {
        /// Notebook ID or unique ID prefix
        notebook: String,
        /// Section ID, unique ID prefix or name
        section: String,
        /// Page title
        title: String,
        /// Page content; read from piped stdin when omitted
        content: Vec<String>,
    },
    /// Edit a page's content in $VISUAL or $EDITOR
    Edit {
        /// Notebook ID or unique ID prefix
        notebook: String,
        /// Section ID, unique ID prefix or name
        section: String,
        /// Page ID, unique ID prefix or title
        page: String,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Upload every local notebook and remove remote notebooks deleted locally
    Push {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download remote notebooks and merge newer copies into the local store
    Pull {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in to Google Drive in the browser
    Login,
    /// Show whether a Google Drive session is stored
    Status,
    /// Forget the stored Google Drive session
    Logout,
}

#[derive(Subcommand)]
pub enum DriveCommands {
    /// Upload a file into the LibreNote Drive folder
    Upload {
        /// Local file to upload
        path: PathBuf,
    },
    /// Download a Drive file
    Download {
        /// Drive file ID
        file_id: String,
        /// Destination path
        dest: PathBuf,
    },
    /// Find Drive files by name
    Search {
        /// Text contained in the file name
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a shareable link for a Drive file
    Link {
        /// Drive file ID
        file_id: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the active configuration
    Show,
    /// Create or update the config file
    Init {
        /// Notebook directory
        #[arg(long, value_name = "PATH")]
        data_dir: Option<PathBuf>,
        /// Google OAuth client_secret.json
        #[arg(long, value_name = "PATH")]
        client_secret: Option<PathBuf>,
        /// Drive folder holding notebooks
        #[arg(long, value_name = "NAME")]
        remote_folder: Option<String>,
        /// Per-request timeout for Drive calls
        #[arg(long, value_name = "SECONDS")]
        timeout_secs: Option<u64>,
    },
}
