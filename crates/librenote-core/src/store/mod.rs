//! Local notebook persistence: one pretty-printed JSON file per notebook

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::{Notebook, NotebookId};

const NOTEBOOK_EXTENSION: &str = "json";

/// Trait for notebook storage operations
pub trait NotebookStore {
    /// Parsed contents of every stored notebook
    fn list(&self) -> Result<Vec<Notebook>>;

    /// Write or overwrite the notebook's document
    fn save(&self, notebook: &Notebook) -> Result<()>;

    /// Remove a notebook; returns whether it existed
    fn delete(&self, id: &NotebookId) -> Result<bool>;
}

/// Directory-backed implementation of `NotebookStore`
///
/// The directory is created lazily on first access. There is no file
/// locking; callers must not write the same notebook concurrently.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

/// Default notebook directory: `~/LibreNoteData/notebooks`
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join("LibreNoteData").join("notebooks"))
        .ok_or_else(|| Error::Config("Failed to resolve home directory".to_string()))
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load every notebook, creating the default notebook on first run.
    ///
    /// Sections without a color get a palette color by position.
    pub fn load_or_init(&self) -> Result<Vec<Notebook>> {
        let mut notebooks = self.list()?;
        if notebooks.is_empty() {
            let notebook = Notebook::default_notebook();
            self.save(&notebook)?;
            tracing::info!("Created default notebook {}", notebook.id);
            notebooks.push(notebook);
        }
        for notebook in &mut notebooks {
            notebook.backfill_section_colors();
        }
        Ok(notebooks)
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|error| Error::file(&self.dir, error))
    }

    fn path_for(&self, id: &NotebookId) -> Result<PathBuf> {
        if !id.is_safe() {
            return Err(Error::InvalidInput(format!(
                "Notebook id cannot be used as a file name: {id:?}"
            )));
        }
        Ok(self.dir.join(format!("{id}.{NOTEBOOK_EXTENSION}")))
    }
}

impl NotebookStore for LocalStore {
    fn list(&self) -> Result<Vec<Notebook>> {
        self.ensure_dir()?;

        let entries = fs::read_dir(&self.dir).map_err(|error| Error::file(&self.dir, error))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|error| Error::file(&self.dir, error))?.path();
            let is_notebook = path.is_file()
                && path
                    .extension()
                    .is_some_and(|extension| extension == NOTEBOOK_EXTENSION);
            if is_notebook {
                paths.push(path);
            }
        }
        paths.sort();

        paths
            .iter()
            .map(|path| {
                let raw = fs::read_to_string(path).map_err(|error| Error::file(path, error))?;
                serde_json::from_str(&raw).map_err(|source| Error::CorruptNotebook {
                    path: path.display().to_string(),
                    source,
                })
            })
            .collect()
    }

    fn save(&self, notebook: &Notebook) -> Result<()> {
        let path = self.path_for(&notebook.id)?;
        self.ensure_dir()?;
        let serialized = serde_json::to_string_pretty(notebook)?;
        fs::write(&path, serialized).map_err(|error| Error::file(&path, error))?;
        tracing::debug!("Saved notebook {} to {}", notebook.id, path.display());
        Ok(())
    }

    fn delete(&self, id: &NotebookId) -> Result<bool> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
            Err(error) => Err(Error::file(&path, error)),
        }
    }
}
