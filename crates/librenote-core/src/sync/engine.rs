//! Sync engine with per-direction in-flight guards.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde_json::Value;

use super::{SyncDirection, SyncError, SyncResult};
use crate::models::{Notebook, NotebookId};
use crate::remote::{BlobId, FolderId, RemoteStore, JSON_MIME};

/// Folder name shared with existing NoteFlow installs
pub const DEFAULT_REMOTE_FOLDER: &str = "NoteFlow";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    /// Notebooks written, created or updated
    pub pushed: usize,
    pub created: usize,
    pub updated: usize,
    /// Orphan remote notebooks removed
    pub deleted: usize,
}

/// Remote blob left out of a pull
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedBlob {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PullReport {
    pub notebooks: Vec<Notebook>,
    pub skipped: Vec<SkippedBlob>,
}

/// Held while a sync runs in one direction; cleared on every exit path
struct InFlight<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, direction: SyncDirection) -> SyncResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyncError::InProgress(direction))?;
        Ok(Self { flag })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Reconciles local notebooks with one remote folder.
///
/// Holds no notebook state between calls. A second push (or pull) started
/// while one is running fails with `SyncError::InProgress`.
pub struct SyncEngine<R: RemoteStore> {
    remote: R,
    folder_name: String,
    push_in_flight: AtomicBool,
    pull_in_flight: AtomicBool,
}

impl<R: RemoteStore> SyncEngine<R> {
    pub fn new(remote: R) -> Self {
        Self::with_folder(remote, DEFAULT_REMOTE_FOLDER)
    }

    pub fn with_folder(remote: R, folder_name: impl Into<String>) -> Self {
        Self {
            remote,
            folder_name: folder_name.into(),
            push_in_flight: AtomicBool::new(false),
            pull_in_flight: AtomicBool::new(false),
        }
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    pub fn folder_name(&self) -> &str {
        &self.folder_name
    }

    async fn folder(&self) -> SyncResult<FolderId> {
        Ok(self.remote.find_or_create_folder(&self.folder_name).await?)
    }

    /// Make the remote folder mirror `notebooks`.
    ///
    /// Each notebook overwrites its blob unconditionally. Every other JSON blob
    /// is deleted afterwards, including stale blobs sharing a notebook's name;
    /// other files are left alone.
    /// The first failure aborts the push without rolling back.
    pub async fn push_all(&self, notebooks: &[Notebook]) -> SyncResult<PushReport> {
        let _guard = InFlight::acquire(&self.push_in_flight, SyncDirection::Push)?;
        tracing::info!(
            "Pushing {} notebooks to '{}'",
            notebooks.len(),
            self.folder_name
        );

        let folder = self.folder().await?;
        let mut report = PushReport::default();
        let mut written: HashSet<BlobId> = HashSet::new();

        for notebook in notebooks {
            let name = notebook.file_name();
            let content = serde_json::to_vec(notebook).map_err(crate::Error::from)?;
            match self.remote.find_blob(&folder, &name).await? {
                Some(blob) => {
                    self.remote.update_blob(&blob.id, &name, &content).await?;
                    written.insert(blob.id);
                    report.updated += 1;
                }
                None => {
                    let blob = self.remote.put_blob(&folder, &name, &content).await?;
                    written.insert(blob.id);
                    report.created += 1;
                }
            }
            report.pushed += 1;
            tracing::debug!("Pushed notebook {}", notebook.id);
        }

        // Same-named duplicates count as orphans; only the blob just written survives
        for blob in self.remote.list_blobs(&folder, Some(JSON_MIME)).await? {
            if written.contains(&blob.id) {
                continue;
            }
            self.remote.delete_blob(&blob.id).await?;
            report.deleted += 1;
            tracing::debug!("Removed orphan remote notebook {}", blob.name);
        }

        tracing::info!(
            "Push complete: {} created, {} updated, {} removed",
            report.created,
            report.updated,
            report.deleted
        );
        Ok(report)
    }

    /// Fetch every notebook blob in listing order.
    ///
    /// Blobs that do not decode as a notebook are skipped with a warning.
    pub async fn pull_all(&self) -> SyncResult<PullReport> {
        let _guard = InFlight::acquire(&self.pull_in_flight, SyncDirection::Pull)?;
        tracing::info!("Pulling notebooks from '{}'", self.folder_name);

        let folder = self.folder().await?;
        let blobs = self.remote.list_blobs(&folder, Some(JSON_MIME)).await?;
        let mut report = PullReport::default();

        for blob in blobs {
            let content = self.remote.get_blob(&blob.id).await?;
            match decode_notebook(&content) {
                Ok(notebook) => {
                    tracing::debug!("Pulled notebook {}", notebook.id);
                    report.notebooks.push(notebook);
                }
                Err(reason) => {
                    tracing::warn!("Skipping remote blob {}: {}", blob.name, reason);
                    report.skipped.push(SkippedBlob {
                        name: blob.name,
                        reason,
                    });
                }
            }
        }

        tracing::info!(
            "Pull complete: {} notebooks, {} skipped",
            report.notebooks.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Delete the notebook's remote blob; returns whether one existed
    pub async fn delete_remote(&self, id: &NotebookId) -> SyncResult<bool> {
        let _guard = InFlight::acquire(&self.push_in_flight, SyncDirection::Push)?;
        let folder = self.folder().await?;
        let name = format!("{id}.json");
        match self.remote.find_blob(&folder, &name).await? {
            Some(blob) => {
                self.remote.delete_blob(&blob.id).await?;
                tracing::info!("Deleted remote notebook {}", id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Accept only JSON objects with a non-empty string `id` that decode as a notebook
pub(super) fn decode_notebook(content: &[u8]) -> Result<Notebook, String> {
    let value: Value =
        serde_json::from_slice(content).map_err(|error| format!("invalid JSON: {error}"))?;
    let has_id = value
        .as_object()
        .and_then(|object| object.get("id"))
        .and_then(Value::as_str)
        .is_some_and(|id| !id.is_empty());
    if !has_id {
        return Err("missing notebook id".to_string());
    }
    let notebook: Notebook =
        serde_json::from_value(value).map_err(|error| format!("not a notebook: {error}"))?;
    if !notebook.id.is_safe() {
        return Err(format!("unusable notebook id {:?}", notebook.id.as_str()));
    }
    Ok(notebook)
}
