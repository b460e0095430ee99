//! librenote-core - Core library for LibreNote
//!
//! This crate contains the notebook model, the local JSON store, Google
//! identity handling and the Drive sync engine used by the LibreNote CLI.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod store;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Notebook, NotebookId, Page, PageId, Section, SectionId};
pub use store::{LocalStore, NotebookStore};
pub use sync::{SyncEngine, SyncError, SyncOutcome};
