use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use librenote_core::auth::{AuthError, FileSessionStore, GoogleIdentity, OAuthClientConfig};
use librenote_core::config::{app_config_dir, AppConfig};
use librenote_core::remote::DriveClient;
use librenote_core::{LocalStore, Notebook, NotebookStore, PageId, Section, SectionId};
use serde::Serialize;

use crate::error::CliError;

pub type Identity = GoogleIdentity<FileSessionStore>;

const SHORT_ID_LEN: usize = 13;

/// Resolved configuration shared by every command
pub struct Context {
    pub config: AppConfig,
    pub config_dir: PathBuf,
    pub store: LocalStore,
}

impl Context {
    pub fn load(data_dir: Option<&Path>) -> Result<Self, CliError> {
        let config_dir = app_config_dir()?;
        let config = AppConfig::load()?;
        let data_dir = config.resolve_data_dir(data_dir, |key| env::var(key).ok())?;
        tracing::debug!("Using notebook directory {}", data_dir.display());
        Ok(Self {
            config,
            config_dir,
            store: LocalStore::new(data_dir),
        })
    }

    pub fn session_store(&self) -> FileSessionStore {
        FileSessionStore::in_dir(&self.config_dir)
    }

    /// Google identity from the configured client secret and stored session
    pub fn identity(&self) -> Result<Arc<Identity>, CliError> {
        let secret_path = self.config.client_secret_path_in(&self.config_dir);
        let client = OAuthClientConfig::resolve(Some(&secret_path), |key| env::var(key).ok())?
            .ok_or(AuthError::NotConfigured)?
            .with_callback_timeout(self.config.auth_timeout());
        Ok(Arc::new(GoogleIdentity::new(client, self.session_store())?))
    }

    pub fn drive(&self) -> Result<DriveClient<Identity>, CliError> {
        Ok(DriveClient::new(
            self.identity()?,
            self.config.request_timeout(),
        )?)
    }
}

#[derive(Debug, Serialize)]
pub struct NotebookListItem {
    pub id: String,
    pub name: String,
    pub color: String,
    pub sections: usize,
    pub pages: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub relative_time: String,
}

pub fn notebook_to_list_item(notebook: &Notebook) -> NotebookListItem {
    NotebookListItem {
        id: notebook.id.to_string(),
        name: notebook.name.clone(),
        color: notebook.color.clone(),
        sections: notebook.sections.len(),
        pages: notebook.page_count(),
        created_at: notebook.created_at,
        updated_at: notebook.updated_at,
        relative_time: format_relative_time(notebook.updated_at, Utc::now()),
    }
}

pub fn format_notebook_lines(notebooks: &[Notebook]) -> Vec<String> {
    let now = Utc::now();
    notebooks
        .iter()
        .map(|notebook| {
            let short_id = short_id(notebook.id.as_str());
            let name = truncate(&notebook.name, 32);
            let counts = format!(
                "{} sections, {} pages",
                notebook.sections.len(),
                notebook.page_count()
            );
            let relative_time = format_relative_time(notebook.updated_at, now);
            format!("{short_id:<13}  {name:<32}  {counts:<24}  {relative_time}")
        })
        .collect()
}

pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now
        .signed_duration_since(timestamp)
        .num_milliseconds()
        .max(0);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_name(parts: &[String]) -> Result<String, CliError> {
    let joined = parts.join(" ");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyName)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_search_query(query: &str) -> Result<String, CliError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptySearchQuery)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Index of the notebook whose id equals or uniquely starts with `query`
pub fn resolve_notebook(notebooks: &[Notebook], query: &str) -> Result<usize, CliError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CliError::EmptyNotebookId);
    }
    if let Some(index) = notebooks
        .iter()
        .position(|notebook| notebook.id.as_str() == query)
    {
        return Ok(index);
    }

    let matches: Vec<usize> = notebooks
        .iter()
        .enumerate()
        .filter(|(_, notebook)| notebook.id.as_str().starts_with(query))
        .map(|(index, _)| index)
        .collect();
    match matches.as_slice() {
        [] => Err(CliError::NotebookNotFound(query.to_string())),
        [index] => Ok(*index),
        _ => {
            let options = matches
                .iter()
                .take(3)
                .map(|index| short_id(notebooks[*index].id.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::Ambiguous(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

/// Match by exact id, then by exact name (case-insensitive), then by unique id prefix
fn resolve_by<'a, T>(
    items: &'a [T],
    query: &str,
    id: impl Fn(&T) -> &str,
    label: impl Fn(&T) -> &str,
    not_found: impl FnOnce(String) -> CliError,
) -> Result<&'a T, CliError> {
    let query = query.trim();
    if let Some(item) = items.iter().find(|&item| id(item) == query) {
        return Ok(item);
    }
    let by_label: Vec<&T> = items
        .iter()
        .filter(|&item| label(item).eq_ignore_ascii_case(query))
        .collect();
    if let [item] = by_label.as_slice() {
        return Ok(*item);
    }
    let by_prefix: Vec<&T> = items
        .iter()
        .filter(|&item| !query.is_empty() && id(item).starts_with(query))
        .collect();
    match (by_label.len(), by_prefix.as_slice()) {
        (0, []) => Err(not_found(query.to_string())),
        (0, [item]) => Ok(*item),
        _ => Err(CliError::Ambiguous(format!(
            "'{query}' matches more than one item; use a longer ID"
        ))),
    }
}

pub fn resolve_section(notebook: &Notebook, query: &str) -> Result<SectionId, CliError> {
    resolve_by(
        &notebook.sections,
        query,
        |section| section.id.as_str(),
        |section| section.name.as_str(),
        CliError::SectionNotFound,
    )
    .map(|section| section.id.clone())
}

pub fn resolve_page(section: &Section, query: &str) -> Result<PageId, CliError> {
    resolve_by(
        &section.pages,
        query,
        |page| page.id.as_str(),
        |page| page.title.as_str(),
        CliError::PageNotFound,
    )
    .map(|page| page.id.clone())
}

/// Load notebooks, apply `mutate` to the one matching `query`, and save it
pub fn update_notebook<T>(
    store: &LocalStore,
    query: &str,
    mutate: impl FnOnce(&mut Notebook) -> Result<T, CliError>,
) -> Result<(Notebook, T), CliError> {
    let mut notebooks = store.load_or_init()?;
    let index = resolve_notebook(&notebooks, query)?;
    let value = mutate(&mut notebooks[index])?;
    store.save(&notebooks[index])?;
    Ok((notebooks.swap_remove(index), value))
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_page_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let status = Command::new(program).args(parts).arg(file_path).status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

fn create_temp_page_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("librenote-page-{}-{now}.html", std::process::id()))
}
