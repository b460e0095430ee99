use librenote_core::{LocalStore, Notebook, NotebookStore, SyncEngine};

use crate::commands::common::{resolve_notebook, Context};
use crate::error::CliError;

/// Remove a notebook from the local store and return it
pub fn delete_local(notebook: &str, store: &LocalStore) -> Result<Notebook, CliError> {
    let mut notebooks = store.load_or_init()?;
    let index = resolve_notebook(&notebooks, notebook)?;
    let notebook = notebooks.swap_remove(index);
    store.delete(&notebook.id)?;
    Ok(notebook)
}

pub async fn run_delete(notebook: &str, remote: bool, context: &Context) -> Result<(), CliError> {
    let notebook = delete_local(notebook, &context.store)?;
    println!("{}", notebook.id);

    if remote {
        let engine = SyncEngine::with_folder(context.drive()?, &context.config.remote_folder);
        if engine.delete_remote(&notebook.id).await? {
            println!("Deleted from Google Drive");
        } else {
            println!("Not found in Google Drive");
        }
    }
    Ok(())
}
