use librenote_core::LocalStore;

use crate::commands::common::{
    capture_editor_input_with_initial, normalize_name, resolve_page, resolve_section,
    update_notebook,
};
use crate::error::CliError;

pub fn run_rename(
    notebook: &str,
    name_parts: &[String],
    store: &LocalStore,
) -> Result<(), CliError> {
    let name = normalize_name(name_parts)?;
    let (notebook, ()) = update_notebook(store, notebook, |notebook| {
        notebook.rename(name);
        Ok(())
    })?;

    println!("{}", notebook.id);
    Ok(())
}

/// Open the page content in an editor and save it if it changed
pub fn run_page_edit(
    notebook: &str,
    section: &str,
    page: &str,
    store: &LocalStore,
) -> Result<(), CliError> {
    let (notebook, ()) = update_notebook(store, notebook, |notebook| {
        let section_id = resolve_section(notebook, section)?;
        let section = notebook
            .section(&section_id)
            .ok_or_else(|| CliError::SectionNotFound(section.to_string()))?;
        let page_id = resolve_page(section, page)?;
        let current = section
            .page(&page_id)
            .map(|page| page.content.clone())
            .unwrap_or_default();

        let edited = capture_editor_input_with_initial(&current)?.unwrap_or_default();
        if edited != current {
            notebook.set_page_content(&section_id, &page_id, edited)?;
        }
        Ok(())
    })?;

    println!("{}", notebook.id);
    Ok(())
}
