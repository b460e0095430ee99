//! Case-insensitive page search over an in-memory notebook collection

use serde::Serialize;

use super::ids::{NotebookId, PageId, SectionId};
use super::notebook::Notebook;
use crate::util::{strip_markup, text_preview};

const PREVIEW_LEN: usize = 60;

/// A page matching a search query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub notebook_id: NotebookId,
    pub section_id: SectionId,
    pub page_id: PageId,
    pub notebook_name: String,
    pub section_name: String,
    pub title: String,
    pub preview: String,
}

/// Find pages whose title or visible text contains `query`.
///
/// Hits are returned in notebook, section, page order. Blank queries match nothing.
#[must_use]
pub fn search(notebooks: &[Notebook], query: &str) -> Vec<SearchHit> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut hits = Vec::new();
    for notebook in notebooks {
        for section in &notebook.sections {
            for page in &section.pages {
                let title_match = page.title.to_lowercase().contains(&needle);
                let content_match = !title_match
                    && strip_markup(&page.content)
                        .to_lowercase()
                        .contains(&needle);
                if title_match || content_match {
                    hits.push(SearchHit {
                        notebook_id: notebook.id.clone(),
                        section_id: section.id.clone(),
                        page_id: page.id.clone(),
                        notebook_name: notebook.name.clone(),
                        section_name: section.name.clone(),
                        title: page.title.clone(),
                        preview: text_preview(&page.content, PREVIEW_LEN)
                            .unwrap_or_else(|| "Empty page".to_string()),
                    });
                }
            }
        }
    }
    hits
}
