//! Notebook, section and page models

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::{NotebookId, PageId, SectionId};
use crate::error::{Error, Result};

/// Palette cycled through when new notebooks are created
pub const NOTEBOOK_COLORS: [&str; 6] = [
    "#7719AA", "#D13438", "#107C10", "#0078D4", "#CA5010", "#038387",
];

/// Palette cycled through when sections are created or back-filled
pub const SECTION_COLORS: [&str; 8] = [
    "#7719AA", "#0078D4", "#038387", "#107C10", "#CA5010", "#D13438", "#E3008C", "#69797E",
];

const UNTITLED_PAGE: &str = "Untitled page";

const WELCOME_CONTENT: &str = "<h1>Welcome to LibreNote</h1>\
<p>Your space to capture ideas, organize thoughts and write.</p>\
<h2>Features</h2><ul>\
<li>Notebooks organized into sections and pages</li>\
<li>Google Drive synchronization</li></ul>\
<h2>Getting started</h2><p>Create a new page or notebook from the sidebar.</p>";

/// Color for the `index`-th notebook
#[must_use]
pub fn notebook_color(index: usize) -> &'static str {
    NOTEBOOK_COLORS[index % NOTEBOOK_COLORS.len()]
}

/// Color for the `index`-th section of a notebook
#[must_use]
pub fn section_color(index: usize) -> &'static str {
    SECTION_COLORS[index % SECTION_COLORS.len()]
}

/// Next modification timestamp: now, or 1ms past `previous` if the clock lags
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

/// Root aggregate, persisted as one JSON document
///
/// Unknown fields are kept in `extra` so that a full-document overwrite never
/// drops data written by another client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notebook {
    pub id: NotebookId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// Sole conflict-resolution signal; advanced by every mutation below
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Ordered group of pages inside a notebook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: SectionId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single page; `content` is editor markup and opaque to sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Page {
    /// Create an empty page with the given title
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: PageId::new(),
            title: title.into(),
            content: String::new(),
            created_at: now,
            updated_at: now,
            extra: Map::new(),
        }
    }
}

impl Section {
    /// Create a section holding one untitled page
    #[must_use]
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: SectionId::new(),
            name: name.into(),
            color: color.into(),
            pages: vec![Page::new(UNTITLED_PAGE)],
            extra: Map::new(),
        }
    }

    pub fn page(&self, id: &PageId) -> Option<&Page> {
        self.pages.iter().find(|page| &page.id == id)
    }

    fn page_mut(&mut self, id: &PageId) -> Result<&mut Page> {
        self.pages
            .iter_mut()
            .find(|page| &page.id == id)
            .ok_or_else(|| Error::NotFound(format!("page {id}")))
    }
}

impl Notebook {
    /// Create a notebook with a single section and an untitled page
    #[must_use]
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: NotebookId::new(),
            name: name.into(),
            color: color.into(),
            created_at: now,
            updated_at: now,
            sections: vec![Section::new("Section 1", section_color(0))],
            extra: Map::new(),
        }
    }

    /// The notebook created on first run when the local store is empty
    #[must_use]
    pub fn default_notebook() -> Self {
        let mut notebook = Self::new("My Notebook", notebook_color(0));
        let mut page = Page::new("Welcome to LibreNote");
        page.content = WELCOME_CONTENT.to_string();
        notebook.sections = vec![Section {
            id: SectionId::new(),
            name: "General".to_string(),
            color: section_color(0).to_string(),
            pages: vec![page],
            extra: Map::new(),
        }];
        notebook
    }

    /// Remote blob name and local file name for this notebook
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.json", self.id)
    }

    /// Record a mutation, keeping `updated_at` strictly increasing
    pub fn touch(&mut self) {
        self.updated_at = next_timestamp(self.updated_at);
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|section| &section.id == id)
    }

    fn section_mut(&mut self, id: &SectionId) -> Result<&mut Section> {
        self.sections
            .iter_mut()
            .find(|section| &section.id == id)
            .ok_or_else(|| Error::NotFound(format!("section {id}")))
    }

    /// Append a section (with one untitled page) and return its id
    pub fn add_section(&mut self, name: impl Into<String>) -> SectionId {
        let section = Section::new(name, section_color(self.sections.len()));
        let id = section.id.clone();
        self.sections.push(section);
        self.touch();
        id
    }

    pub fn remove_section(&mut self, id: &SectionId) -> Result<Section> {
        let index = self
            .sections
            .iter()
            .position(|section| &section.id == id)
            .ok_or_else(|| Error::NotFound(format!("section {id}")))?;
        let removed = self.sections.remove(index);
        self.touch();
        Ok(removed)
    }

    pub fn rename_section(&mut self, id: &SectionId, name: impl Into<String>) -> Result<()> {
        self.section_mut(id)?.name = name.into();
        self.touch();
        Ok(())
    }

    /// Append an empty page to a section and return its id
    pub fn add_page(&mut self, section_id: &SectionId, title: impl Into<String>) -> Result<PageId> {
        let page = Page::new(title);
        let id = page.id.clone();
        self.section_mut(section_id)?.pages.push(page);
        self.touch();
        Ok(id)
    }

    pub fn remove_page(&mut self, section_id: &SectionId, page_id: &PageId) -> Result<Page> {
        let section = self.section_mut(section_id)?;
        let index = section
            .pages
            .iter()
            .position(|page| &page.id == page_id)
            .ok_or_else(|| Error::NotFound(format!("page {page_id}")))?;
        let removed = section.pages.remove(index);
        self.touch();
        Ok(removed)
    }

    pub fn set_page_title(
        &mut self,
        section_id: &SectionId,
        page_id: &PageId,
        title: impl Into<String>,
    ) -> Result<()> {
        let page = self.section_mut(section_id)?.page_mut(page_id)?;
        page.title = title.into();
        page.updated_at = next_timestamp(page.updated_at);
        self.touch();
        Ok(())
    }

    pub fn set_page_content(
        &mut self,
        section_id: &SectionId,
        page_id: &PageId,
        content: impl Into<String>,
    ) -> Result<()> {
        let page = self.section_mut(section_id)?.page_mut(page_id)?;
        page.content = content.into();
        page.updated_at = next_timestamp(page.updated_at);
        self.touch();
        Ok(())
    }

    /// Give colorless sections a palette color by position.
    ///
    /// Display-only normalization applied on load; does not touch `updated_at`.
    pub fn backfill_section_colors(&mut self) -> bool {
        let mut changed = false;
        for (index, section) in self.sections.iter_mut().enumerate() {
            if section.color.trim().is_empty() {
                section.color = section_color(index).to_string();
                changed = true;
            }
        }
        changed
    }

    /// Total number of pages across all sections
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.sections.iter().map(|section| section.pages.len()).sum()
    }
}
