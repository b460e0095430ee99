use librenote_core::models::notebook_color;
use librenote_core::{LocalStore, Notebook, NotebookId, NotebookStore, PageId, SectionId};

use crate::commands::common::{
    normalize_content, normalize_name, read_piped_stdin, resolve_section, update_notebook,
};
use crate::error::CliError;

pub fn run_new(name_parts: &[String], store: &LocalStore) -> Result<NotebookId, CliError> {
    let name = normalize_name(name_parts)?;
    let existing = store.load_or_init()?;
    let notebook = Notebook::new(name, notebook_color(existing.len()));
    store.save(&notebook)?;

    println!("{}", notebook.id);
    Ok(notebook.id)
}

pub fn run_section_add(
    notebook: &str,
    name_parts: &[String],
    store: &LocalStore,
) -> Result<SectionId, CliError> {
    let name = normalize_name(name_parts)?;
    let (_, section_id) = update_notebook(store, notebook, |notebook| {
        Ok(notebook.add_section(name))
    })?;

    println!("{section_id}");
    Ok(section_id)
}

/// Add a page; content comes from the arguments, else from piped stdin
pub fn run_page_add(
    notebook: &str,
    section: &str,
    title: &str,
    content_parts: &[String],
    store: &LocalStore,
) -> Result<PageId, CliError> {
    let title = normalize_name(&[title.to_string()])?;
    let content = match normalize_content(&content_parts.join(" ")) {
        Some(content) => Some(content),
        None => read_piped_stdin()?,
    };
    add_page(store, notebook, section, &title, content)
}

pub fn add_page(
    store: &LocalStore,
    notebook: &str,
    section: &str,
    title: &str,
    content: Option<String>,
) -> Result<PageId, CliError> {
    let (_, page_id) = update_notebook(store, notebook, |notebook| {
        let section_id = resolve_section(notebook, section)?;
        let page_id = notebook.add_page(&section_id, title)?;
        if let Some(content) = content {
            notebook.set_page_content(&section_id, &page_id, content)?;
        }
        Ok(page_id)
    })?;

    println!("{page_id}");
    Ok(page_id)
}
