use std::path::PathBuf;

use chrono::{Duration, TimeZone, Utc};
use librenote_core::config::AppConfig;
use librenote_core::models::{notebook_color, search};
use librenote_core::{LocalStore, Notebook, NotebookId, NotebookStore};
use pretty_assertions::assert_eq;

use crate::commands::add::{add_page, run_new, run_section_add};
use crate::commands::common::{
    default_editor, format_notebook_lines, format_relative_time, normalize_content,
    normalize_name, normalize_search_query, resolve_notebook, resolve_page, resolve_section,
    short_id, truncate, update_notebook,
};
use crate::commands::config::apply_config_init;
use crate::commands::delete::delete_local;
use crate::commands::edit::run_rename;
use crate::commands::search::format_hit_lines;
use crate::commands::show::format_notebook_tree;
use crate::error::CliError;

fn store() -> (tempfile::TempDir, LocalStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path().join("notebooks"));
    (dir, store)
}

fn notebook_with_id(id: &str, name: &str) -> Notebook {
    let mut notebook = Notebook::new(name, notebook_color(0));
    notebook.id = NotebookId::parse(id).unwrap();
    notebook
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn normalize_content_keeps_multiline_text() {
    assert_eq!(
        normalize_content("line 1\nline 2\n"),
        Some("line 1\nline 2".to_string())
    );
}

#[test]
fn normalize_name_joins_words_and_rejects_blank() {
    let parts = vec!["  Work".to_string(), "notes ".to_string()];
    assert_eq!(normalize_name(&parts).unwrap(), "Work notes");
    assert!(matches!(
        normalize_name(&[" ".to_string()]),
        Err(CliError::EmptyName)
    ));
    assert!(matches!(normalize_name(&[]), Err(CliError::EmptyName)));
}

#[test]
fn normalize_search_query_rejects_empty() {
    assert!(normalize_search_query(" \n\t ").is_err());
    assert_eq!(
        normalize_search_query("  exact phrase  ").unwrap(),
        "exact phrase"
    );
}

#[test]
fn default_editor_is_defined() {
    assert!(!default_editor().is_empty());
}

#[test]
fn format_relative_time_units() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    assert_eq!(format_relative_time(now - Duration::seconds(30), now), "just now");
    assert_eq!(format_relative_time(now - Duration::minutes(2), now), "2m ago");
    assert_eq!(format_relative_time(now - Duration::hours(2), now), "2h ago");
    assert_eq!(format_relative_time(now - Duration::days(3), now), "3d ago");
    assert_eq!(format_relative_time(now + Duration::minutes(5), now), "just now");
}

#[test]
fn truncate_collapses_whitespace_and_adds_ellipsis() {
    assert_eq!(truncate("a  b\n c", 10), "a b c");
    assert_eq!(truncate("This is a very long sentence", 10), "This is...");
}

#[test]
fn short_id_keeps_prefix() {
    assert_eq!(short_id("0192f0c1-aaaa-7bbb-8ccc-dddddddddddd"), "0192f0c1-aaaa");
    assert_eq!(short_id("abc"), "abc");
}

#[test]
fn resolve_notebook_supports_exact_and_prefix_id() {
    let notebooks = vec![
        notebook_with_id("11111111-1111-7111-8111-111111111111", "A"),
        notebook_with_id("11111111-1111-7111-8111-222222222222", "B"),
        notebook_with_id("33333333-1111-7111-8111-111111111111", "C"),
    ];

    assert_eq!(
        resolve_notebook(&notebooks, "11111111-1111-7111-8111-222222222222").unwrap(),
        1
    );
    assert_eq!(resolve_notebook(&notebooks, "3333").unwrap(), 2);
    assert!(matches!(
        resolve_notebook(&notebooks, "11111111"),
        Err(CliError::Ambiguous(_))
    ));
    assert!(matches!(
        resolve_notebook(&notebooks, "9999"),
        Err(CliError::NotebookNotFound(_))
    ));
    assert!(matches!(
        resolve_notebook(&notebooks, "  "),
        Err(CliError::EmptyNotebookId)
    ));
}

#[test]
fn resolve_section_and_page_by_name_or_id() {
    let mut notebook = Notebook::new("Work", notebook_color(0));
    let meetings = notebook.add_section("Meetings");
    let page = notebook.add_page(&meetings, "Standup").unwrap();

    assert_eq!(resolve_section(&notebook, "meetings").unwrap(), meetings);
    assert_eq!(
        resolve_section(&notebook, meetings.as_str()).unwrap(),
        meetings
    );
    assert!(matches!(
        resolve_section(&notebook, "Archive"),
        Err(CliError::SectionNotFound(_))
    ));

    let section = notebook.section(&meetings).unwrap();
    assert_eq!(resolve_page(section, "STANDUP").unwrap(), page);
}

#[test]
fn resolve_section_rejects_duplicate_names() {
    let mut notebook = Notebook::new("Work", notebook_color(0));
    notebook.add_section("Ideas");
    notebook.add_section("ideas");

    assert!(matches!(
        resolve_section(&notebook, "Ideas"),
        Err(CliError::Ambiguous(_))
    ));
}

#[test]
fn new_notebook_is_saved_next_to_default() {
    let (_dir, store) = store();

    let id = run_new(&["Research".to_string()], &store).unwrap();

    let notebooks = store.list().unwrap();
    assert_eq!(notebooks.len(), 2);
    let created = notebooks.iter().find(|notebook| notebook.id == id).unwrap();
    assert_eq!(created.name, "Research");
    assert_eq!(created.color, notebook_color(1));
}

#[test]
fn section_and_page_add_persist_content() {
    let (_dir, store) = store();
    let id = run_new(&["Research".to_string()], &store).unwrap();

    let section_id = run_section_add(id.as_str(), &["Papers".to_string()], &store).unwrap();
    let page_id = add_page(
        &store,
        id.as_str(),
        "papers",
        "Reading list",
        Some("<p>Dynamo</p>".to_string()),
    )
    .unwrap();

    let notebook = store
        .list()
        .unwrap()
        .into_iter()
        .find(|notebook| notebook.id == id)
        .unwrap();
    let section = notebook.section(&section_id).unwrap();
    let page = section.page(&page_id).unwrap();
    assert_eq!(page.title, "Reading list");
    assert_eq!(page.content, "<p>Dynamo</p>");

    let hits = search(&[notebook], "dynamo");
    assert_eq!(hits.len(), 1);
    assert!(format_hit_lines(&hits)[0].contains("Reading list"));
}

#[test]
fn add_page_to_unknown_section_leaves_notebook_untouched() {
    let (_dir, store) = store();
    let id = run_new(&["Research".to_string()], &store).unwrap();
    let before = store.list().unwrap();

    let result = add_page(&store, id.as_str(), "missing", "Title", None);

    assert!(matches!(result, Err(CliError::SectionNotFound(_))));
    assert_eq!(store.list().unwrap(), before);
}

#[test]
fn rename_advances_updated_at() {
    let (_dir, store) = store();
    let id = run_new(&["Draft".to_string()], &store).unwrap();
    let before = store
        .list()
        .unwrap()
        .into_iter()
        .find(|notebook| notebook.id == id)
        .unwrap();

    run_rename(id.as_str(), &["Final".to_string()], &store).unwrap();

    let after = store
        .list()
        .unwrap()
        .into_iter()
        .find(|notebook| notebook.id == id)
        .unwrap();
    assert_eq!(after.name, "Final");
    assert!(after.updated_at > before.updated_at);
}

#[test]
fn update_notebook_does_not_save_on_error() {
    let (_dir, store) = store();
    let id = run_new(&["Draft".to_string()], &store).unwrap();
    let before = store.list().unwrap();

    let result = update_notebook(&store, id.as_str(), |notebook| {
        notebook.rename("Changed");
        Err::<(), _>(CliError::EmptyName)
    });

    assert!(result.is_err());
    assert_eq!(store.list().unwrap(), before);
}

#[test]
fn delete_local_removes_file() {
    let (_dir, store) = store();
    let id = run_new(&["Scratch".to_string()], &store).unwrap();

    let deleted = delete_local(id.as_str(), &store).unwrap();

    assert_eq!(deleted.id, id);
    let remaining = store.list().unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining.iter().all(|notebook| notebook.id != id));
}

#[test]
fn notebook_lines_and_tree_include_names() {
    let mut notebook = notebook_with_id("11111111-1111-7111-8111-111111111111", "Work");
    let section = notebook.add_section("Meetings");
    let page = notebook.add_page(&section, "Standup").unwrap();
    notebook
        .set_page_content(&section, &page, "<p>Ship the release</p>")
        .unwrap();

    let lines = format_notebook_lines(std::slice::from_ref(&notebook));
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("11111111-1111"));
    assert!(lines[0].contains("2 sections, 3 pages"));

    let tree = format_notebook_tree(&notebook);
    assert_eq!(tree[0], "11111111-1111-7111-8111-111111111111  Work");
    assert!(tree.iter().any(|line| line.contains("Meetings")));
    assert!(tree
        .iter()
        .any(|line| line.contains("Standup") && line.contains("Ship the release")));
}

#[test]
fn config_init_overrides_only_given_values() {
    let existing = AppConfig {
        remote_folder: "Archive".to_string(),
        ..AppConfig::default()
    };

    let updated = apply_config_init(
        existing,
        Some(PathBuf::from("/tmp/notebooks")),
        None,
        None,
        Some(60),
    );

    assert_eq!(updated.data_dir, Some(PathBuf::from("/tmp/notebooks")));
    assert_eq!(updated.client_secret_path, None);
    assert_eq!(updated.remote_folder, "Archive");
    assert_eq!(updated.request_timeout_secs, 60);
}
