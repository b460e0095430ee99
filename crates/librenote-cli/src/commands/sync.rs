use librenote_core::remote::RemoteStore;
use librenote_core::sync::{apply_merge, MergeReport, PullReport, PushReport, SyncResult};
use librenote_core::{LocalStore, SyncEngine, SyncError, SyncOutcome};

use crate::commands::common::Context;
use crate::error::CliError;

pub async fn push_local<R: RemoteStore>(
    engine: &SyncEngine<R>,
    store: &LocalStore,
) -> SyncResult<PushReport> {
    let notebooks = store.load_or_init()?;
    engine.push_all(&notebooks).await
}

/// Pull every remote notebook and merge newer copies into `store`
pub async fn pull_into<R: RemoteStore>(
    engine: &SyncEngine<R>,
    store: &LocalStore,
) -> SyncResult<(PullReport, MergeReport)> {
    let pulled = engine.pull_all().await?;
    let mut local = store.load_or_init()?;
    let merged = apply_merge(store, &mut local, pulled.notebooks.clone())?;
    Ok((pulled, merged))
}

fn print_failure(error: &SyncError, as_json: bool) -> Result<(), CliError> {
    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&SyncOutcome::failed(error))?
        );
    }
    Ok(())
}

pub async fn run_sync_push(as_json: bool, context: &Context) -> Result<(), CliError> {
    let engine = SyncEngine::with_folder(context.drive()?, &context.config.remote_folder);
    let report = match push_local(&engine, &context.store).await {
        Ok(report) => report,
        Err(error) => {
            print_failure(&error, as_json)?;
            return Err(error.into());
        }
    };

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&SyncOutcome::pushed(&report))?
        );
    } else {
        println!(
            "Pushed {} notebooks ({} created, {} updated, {} removed from Google Drive)",
            report.pushed, report.created, report.updated, report.deleted
        );
    }
    Ok(())
}

pub async fn run_sync_pull(as_json: bool, context: &Context) -> Result<(), CliError> {
    let engine = SyncEngine::with_folder(context.drive()?, &context.config.remote_folder);
    let (pulled, merged) = match pull_into(&engine, &context.store).await {
        Ok(result) => result,
        Err(error) => {
            print_failure(&error, as_json)?;
            return Err(error.into());
        }
    };

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&SyncOutcome::pulled(pulled.notebooks))?
        );
        return Ok(());
    }

    for skipped in &pulled.skipped {
        eprintln!("Skipped {}: {}", skipped.name, skipped.reason);
    }
    if merged.is_unchanged() {
        println!("Pulled {} notebooks; already up to date", pulled.notebooks.len());
    } else {
        println!(
            "Pulled {} notebooks ({} new, {} updated, {} kept local)",
            pulled.notebooks.len(),
            merged.adopted.len(),
            merged.replaced.len(),
            merged.kept_local.len()
        );
    }
    Ok(())
}
