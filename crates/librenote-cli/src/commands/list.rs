use librenote_core::LocalStore;

use crate::commands::common::{format_notebook_lines, notebook_to_list_item, NotebookListItem};
use crate::error::CliError;

pub fn run_list(as_json: bool, store: &LocalStore) -> Result<(), CliError> {
    let notebooks = store.load_or_init()?;

    if as_json {
        let json_items = notebooks
            .iter()
            .map(notebook_to_list_item)
            .collect::<Vec<NotebookListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_notebook_lines(&notebooks) {
            println!("{line}");
        }
    }

    Ok(())
}
