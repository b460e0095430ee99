//! Last-writer-wins merge of pulled notebooks into the local set.

use serde::Serialize;

use crate::error::Result;
use crate::models::{Notebook, NotebookId};
use crate::store::NotebookStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Remote notebooks with no local counterpart
    pub adopted: Vec<NotebookId>,
    /// Local notebooks replaced by a strictly newer remote copy
    pub replaced: Vec<NotebookId>,
    /// Local notebooks kept because the remote copy was not newer
    pub kept_local: Vec<NotebookId>,
    /// Adopted and replaced notebooks, in remote order
    pub changed: Vec<NotebookId>,
}

impl MergeReport {
    /// Notebooks whose local copy changed
    pub fn is_unchanged(&self) -> bool {
        self.adopted.is_empty() && self.replaced.is_empty()
    }
}

/// Merge `remote` into `local` in memory.
///
/// A remote notebook replaces the local one only when its `updated_at` is
/// strictly later; ties keep the local copy. Local notebooks missing from
/// `remote` are never removed.
pub fn merge_remote(local: &mut Vec<Notebook>, remote: Vec<Notebook>) -> MergeReport {
    let mut report = MergeReport::default();
    for incoming in remote {
        match local.iter_mut().find(|existing| existing.id == incoming.id) {
            None => {
                report.adopted.push(incoming.id.clone());
                report.changed.push(incoming.id.clone());
                local.push(incoming);
            }
            Some(existing) if incoming.updated_at > existing.updated_at => {
                report.replaced.push(incoming.id.clone());
                report.changed.push(incoming.id.clone());
                *existing = incoming;
            }
            Some(_) => report.kept_local.push(incoming.id),
        }
    }
    report
}

/// Merge and write every adopted or replaced notebook to `store`
pub fn apply_merge<S: NotebookStore + ?Sized>(
    store: &S,
    local: &mut Vec<Notebook>,
    remote: Vec<Notebook>,
) -> Result<MergeReport> {
    let report = merge_remote(local, remote);
    for id in &report.changed {
        if let Some(notebook) = local.iter().find(|notebook| &notebook.id == id) {
            store.save(notebook)?;
        }
    }
    tracing::info!(
        "Merged remote notebooks: {} adopted, {} replaced, {} kept local",
        report.adopted.len(),
        report.replaced.len(),
        report.kept_local.len()
    );
    Ok(report)
}
