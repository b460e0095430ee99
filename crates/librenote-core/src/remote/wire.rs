//! Drive v3 query strings and `multipart/related` upload bodies.

use std::path::Path;

use base64::Engine;
use serde_json::Value;

use super::{FolderId, FOLDER_MIME};

const OCTET_STREAM: &str = "application/octet-stream";

const MIME_BY_EXTENSION: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("zip", "application/zip"),
];

/// Escape a value for use inside a single-quoted Drive query literal
#[must_use]
pub fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// MIME type inferred from the file extension, case-insensitively
#[must_use]
pub fn mime_for_path(path: &Path) -> &'static str {
    let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
        return OCTET_STREAM;
    };
    let extension = extension.to_ascii_lowercase();
    MIME_BY_EXTENSION
        .iter()
        .find(|(known, _)| *known == extension)
        .map_or(OCTET_STREAM, |(_, mime)| mime)
}

pub(crate) fn folder_query(name: &str) -> String {
    format!(
        "name='{}' and mimeType='{FOLDER_MIME}' and trashed=false",
        escape_query_literal(name)
    )
}

pub(crate) fn children_query(folder: &FolderId, mime_filter: Option<&str>) -> String {
    let mut query = format!(
        "'{}' in parents and trashed=false",
        escape_query_literal(folder.as_str())
    );
    if let Some(mime) = mime_filter {
        query.push_str(&format!(" and mimeType='{}'", escape_query_literal(mime)));
    }
    query
}

pub(crate) fn named_child_query(folder: &FolderId, name: &str) -> String {
    format!(
        "name='{}' and '{}' in parents and trashed=false",
        escape_query_literal(name),
        escape_query_literal(folder.as_str())
    )
}

pub(crate) fn name_contains_query(text: &str) -> String {
    format!(
        "name contains '{}' and trashed=false",
        escape_query_literal(text)
    )
}

pub(crate) fn new_boundary() -> String {
    format!("librenote-{}", uuid::Uuid::now_v7().simple())
}

/// How the payload part is written into the body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PartEncoding {
    Raw,
    Base64,
}

/// Two-part `multipart/related` body: JSON metadata, then the payload
pub(crate) fn multipart_related(
    boundary: &str,
    metadata: &Value,
    content_type: &str,
    payload: &[u8],
    encoding: PartEncoding,
) -> Vec<u8> {
    let mut body = Vec::with_capacity(payload.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {content_type}\r\n").as_bytes());
    match encoding {
        PartEncoding::Raw => {
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(payload);
        }
        PartEncoding::Base64 => {
            body.extend_from_slice(b"Content-Transfer-Encoding: base64\r\n\r\n");
            body.extend_from_slice(
                base64::engine::general_purpose::STANDARD
                    .encode(payload)
                    .as_bytes(),
            );
        }
    }
    body.extend_from_slice(format!("\r\n--{boundary}--").as_bytes());
    body
}

pub(crate) fn multipart_content_type(boundary: &str) -> String {
    format!("multipart/related; boundary={boundary}")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(escape_query_literal("plain"), "plain");
        assert_eq!(escape_query_literal("it's"), "it\\'s");
        assert_eq!(escape_query_literal("a\\b"), "a\\\\b");
        assert_eq!(escape_query_literal("\\'"), "\\\\\\'");
    }

    #[test]
    fn builds_folder_and_listing_queries() {
        assert_eq!(
            folder_query("Note'Flow"),
            "name='Note\\'Flow' and mimeType='application/vnd.google-apps.folder' and trashed=false"
        );
        let folder = FolderId::new("f1");
        assert_eq!(
            children_query(&folder, Some("application/json")),
            "'f1' in parents and trashed=false and mimeType='application/json'"
        );
        assert_eq!(children_query(&folder, None), "'f1' in parents and trashed=false");
        assert_eq!(
            named_child_query(&folder, "nb.json"),
            "name='nb.json' and 'f1' in parents and trashed=false"
        );
        assert_eq!(
            name_contains_query("q'x"),
            "name contains 'q\\'x' and trashed=false"
        );
    }

    #[test]
    fn infers_mime_types() {
        assert_eq!(mime_for_path(Path::new("report.PDF")), "application/pdf");
        assert_eq!(mime_for_path(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a/b/data.csv")), "text/csv");
        assert_eq!(mime_for_path(Path::new("archive.tar.gz")), OCTET_STREAM);
        assert_eq!(mime_for_path(Path::new("Makefile")), OCTET_STREAM);
    }

    #[test]
    fn raw_multipart_body_layout() {
        let body = multipart_related(
            "B",
            &json!({"name": "nb.json"}),
            "application/json",
            br#"{"id":"nb"}"#,
            PartEncoding::Raw,
        );
        assert_eq!(
            String::from_utf8(body).unwrap(),
            "--B\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{\"name\":\"nb.json\"}\r\n\
             --B\r\nContent-Type: application/json\r\n\r\n{\"id\":\"nb\"}\r\n--B--"
        );
    }

    #[test]
    fn base64_multipart_body_encodes_payload() {
        let body = multipart_related(
            "B",
            &json!({"name": "x.bin"}),
            OCTET_STREAM,
            &[0, 1, 2, 255],
            PartEncoding::Base64,
        );
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("Content-Transfer-Encoding: base64\r\n\r\nAAEC/w==\r\n--B--"));
        assert_eq!(multipart_content_type("B"), "multipart/related; boundary=B");
    }

    #[test]
    fn boundaries_are_unique() {
        assert_ne!(new_boundary(), new_boundary());
    }
}
