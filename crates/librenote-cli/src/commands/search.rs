use librenote_core::models::{search, SearchHit};
use librenote_core::LocalStore;

use crate::commands::common::{normalize_search_query, truncate};
use crate::error::CliError;

pub fn format_hit_lines(hits: &[SearchHit]) -> Vec<String> {
    hits.iter()
        .map(|hit| {
            let location = truncate(&format!("{} / {}", hit.notebook_name, hit.section_name), 32);
            let title = truncate(&hit.title, 30);
            format!("{location:<32}  {title:<30}  {}", hit.preview)
        })
        .collect()
}

pub fn run_search(query: &str, as_json: bool, store: &LocalStore) -> Result<(), CliError> {
    let normalized_query = normalize_search_query(query)?;
    let notebooks = store.load_or_init()?;
    let hits = search(&notebooks, &normalized_query);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else if hits.is_empty() {
        println!("No pages match '{normalized_query}'.");
    } else {
        for line in format_hit_lines(&hits) {
            println!("{line}");
        }
    }

    Ok(())
}
