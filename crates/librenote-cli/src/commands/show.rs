use librenote_core::util::text_preview;
use librenote_core::{LocalStore, Notebook};

use crate::commands::common::{resolve_notebook, short_id};
use crate::error::CliError;

pub fn format_notebook_tree(notebook: &Notebook) -> Vec<String> {
    let mut lines = vec![format!("{}  {}", notebook.id, notebook.name)];
    for section in &notebook.sections {
        lines.push(format!(
            "  {:<13}  {}",
            short_id(section.id.as_str()),
            section.name
        ));
        for page in &section.pages {
            let preview = text_preview(&page.content, 40).unwrap_or_default();
            if preview.is_empty() {
                lines.push(format!("    {:<13}  {}", short_id(page.id.as_str()), page.title));
            } else {
                lines.push(format!(
                    "    {:<13}  {:<30}  {preview}",
                    short_id(page.id.as_str()),
                    page.title
                ));
            }
        }
    }
    lines
}

pub fn run_show(notebook: &str, as_json: bool, store: &LocalStore) -> Result<(), CliError> {
    let notebooks = store.load_or_init()?;
    let notebook = &notebooks[resolve_notebook(&notebooks, notebook)?];

    if as_json {
        println!("{}", serde_json::to_string_pretty(notebook)?);
    } else {
        for line in format_notebook_tree(notebook) {
            println!("{line}");
        }
    }
    Ok(())
}
