//! Data models for LibreNote

mod ids;
mod notebook;
mod search;

pub use ids::{NotebookId, PageId, SectionId};
pub use notebook::{
    notebook_color, section_color, Notebook, Page, Section, NOTEBOOK_COLORS, SECTION_COLORS,
};
pub use search::{search, SearchHit};
