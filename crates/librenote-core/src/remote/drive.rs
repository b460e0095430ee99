//! Google Drive v3 client.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;

use super::wire::{
    children_query, folder_query, multipart_content_type, multipart_related, name_contains_query,
    named_child_query, new_boundary, PartEncoding,
};
use super::{
    mime_for_path, with_auth_retry, BlobId, BlobInfo, FolderId, RemoteError, RemoteResult,
    RemoteStore, FOLDER_MIME, JSON_MIME,
};
use crate::auth::IdentityProvider;
use crate::util::compact_text;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

const BLOB_FIELDS: &str = "id,name";
const LINK_FIELDS: &str = "id,name,webViewLink,webContentLink";
const SEARCH_FIELDS: &str = "id,name,mimeType,webViewLink,iconLink,modifiedTime";
const LIST_PAGE_SIZE: u32 = 100;
const SEARCH_PAGE_SIZE: u32 = 20;

/// File metadata as returned by Drive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_content_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
}

impl DriveFile {
    /// Browser link, falling back to the direct download link
    pub fn link(&self) -> Option<&str> {
        self.web_view_link
            .as_deref()
            .or(self.web_content_link.as_deref())
    }
}

impl From<DriveFile> for BlobInfo {
    fn from(file: DriveFile) -> Self {
        Self {
            id: BlobId::new(file.id),
            name: file.name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveErrorResponse {
    error: DriveErrorBody,
}

#[derive(Debug, Deserialize)]
struct DriveErrorBody {
    message: Option<String>,
}

struct Upload<'a> {
    method: Method,
    url: String,
    metadata: Value,
    content_type: &'a str,
    payload: &'a [u8],
    encoding: PartEncoding,
    fields: &'a str,
}

/// Drive client authorizing every request through an `IdentityProvider`
pub struct DriveClient<I: IdentityProvider + ?Sized> {
    client: Client,
    api_base: String,
    identity: Arc<I>,
}

impl<I: IdentityProvider + ?Sized> DriveClient<I> {
    pub fn new(identity: Arc<I>, request_timeout: Duration) -> RemoteResult<Self> {
        Ok(Self {
            client: Client::builder().timeout(request_timeout).build()?,
            api_base: DEFAULT_API_BASE.to_string(),
            identity,
        })
    }

    /// Point the client at another Drive-compatible endpoint
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }

    /// Upload a local file into the named folder.
    ///
    /// The MIME type is inferred from the extension and the payload is sent
    /// base64 transfer-encoded. The returned metadata carries sharing links.
    pub async fn upload_file(&self, folder_name: &str, path: &Path) -> RemoteResult<DriveFile> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no usable file name", path.display()),
                )
            })?
            .to_string();
        let payload = tokio::fs::read(path).await?;
        let folder = self.find_or_create_folder(folder_name).await?;
        let mime = mime_for_path(path);

        let file = self
            .upload(Upload {
                method: Method::POST,
                url: format!("{}/upload/drive/v3/files", self.api_base),
                metadata: json!({"name": name, "parents": [folder.as_str()], "mimeType": mime}),
                content_type: mime,
                payload: &payload,
                encoding: PartEncoding::Base64,
                fields: LINK_FIELDS,
            })
            .await?;
        tracing::info!("Uploaded {} ({} bytes) as {}", name, payload.len(), file.id);
        Ok(file)
    }

    /// Download a file's content to `dest`, returning the byte count
    ///
    /// The body is streamed to disk chunk by chunk.
    pub async fn download_file(&self, file_id: &str, dest: &Path) -> RemoteResult<usize> {
        let mut response = self.media(file_id).await?;
        if let Some(parent) = dest.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;
        tracing::info!("Downloaded {} to {}", file_id, dest.display());
        Ok(written)
    }

    /// Files whose name contains `text`, first page only
    pub async fn search_files(&self, text: &str) -> RemoteResult<Vec<DriveFile>> {
        self.list_files(
            &name_contains_query(text),
            SEARCH_FIELDS,
            SEARCH_PAGE_SIZE,
            false,
        )
        .await
    }

    /// Metadata including sharing links; see `DriveFile::link`
    pub async fn file_link(&self, file_id: &str) -> RemoteResult<DriveFile> {
        let url = self.file_url(file_id);
        let response = self
            .execute(|client, token| {
                client
                    .get(&url)
                    .bearer_auth(token)
                    .query(&[("fields", LINK_FIELDS)])
            })
            .await?;
        read_json(response).await
    }

    async fn media(&self, file_id: &str) -> RemoteResult<Response> {
        let url = self.file_url(file_id);
        self.execute(|client, token| {
            client
                .get(&url)
                .bearer_auth(token)
                .query(&[("alt", "media")])
        })
        .await
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/drive/v3/files/{file_id}", self.api_base)
    }

    /// Send a request built fresh for each attempt and map error statuses
    async fn execute<F>(&self, build: F) -> RemoteResult<Response>
    where
        F: Fn(&Client, &str) -> RequestBuilder + Send + Sync,
    {
        with_auth_retry(self.identity.as_ref(), |token| {
            let request = build(&self.client, &token);
            async move { check_status(request.send().await?).await }
        })
        .await
    }

    async fn list_files(
        &self,
        query: &str,
        fields: &str,
        page_size: u32,
        all_pages: bool,
    ) -> RemoteResult<Vec<DriveFile>> {
        let url = format!("{}/drive/v3/files", self.api_base);
        let fields = format!("nextPageToken,files({fields})");
        let page_size = page_size.to_string();
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let response = self
                .execute(|client, token| {
                    let request = client.get(&url).bearer_auth(token).query(&[
                        ("q", query),
                        ("fields", fields.as_str()),
                        ("pageSize", page_size.as_str()),
                    ]);
                    match &page_token {
                        Some(page_token) => request.query(&[("pageToken", page_token.as_str())]),
                        None => request,
                    }
                })
                .await?;
            let page: FileList = read_json(response).await?;
            files.extend(page.files);

            match page.next_page_token.filter(|_| all_pages) {
                Some(next) => page_token = Some(next),
                None => return Ok(files),
            }
        }
    }

    async fn upload(&self, upload: Upload<'_>) -> RemoteResult<DriveFile> {
        let boundary = new_boundary();
        let body = multipart_related(
            &boundary,
            &upload.metadata,
            upload.content_type,
            upload.payload,
            upload.encoding,
        );
        let content_type = multipart_content_type(&boundary);

        let response = self
            .execute(|client, token| {
                client
                    .request(upload.method.clone(), &upload.url)
                    .bearer_auth(token)
                    .query(&[("uploadType", "multipart"), ("fields", upload.fields)])
                    .header(CONTENT_TYPE, content_type.as_str())
                    .body(body.clone())
            })
            .await?;
        read_json(response).await
    }
}

#[async_trait]
impl<I: IdentityProvider + ?Sized> RemoteStore for DriveClient<I> {
    async fn find_or_create_folder(&self, name: &str) -> RemoteResult<FolderId> {
        let existing = self
            .list_files(&folder_query(name), BLOB_FIELDS, LIST_PAGE_SIZE, false)
            .await?;
        if let Some(folder) = existing.into_iter().next() {
            return Ok(FolderId::new(folder.id));
        }

        let url = format!("{}/drive/v3/files", self.api_base);
        let metadata = json!({"name": name, "mimeType": FOLDER_MIME});
        let response = self
            .execute(|client, token| {
                client
                    .post(&url)
                    .bearer_auth(token)
                    .query(&[("fields", BLOB_FIELDS)])
                    .json(&metadata)
            })
            .await?;
        let created: DriveFile = read_json(response).await?;
        if created.id.is_empty() {
            return Err(RemoteError::InvalidResponse(
                "folder creation returned no id".to_string(),
            ));
        }
        tracing::info!("Created remote folder '{}'", name);
        Ok(FolderId::new(created.id))
    }

    async fn list_blobs(
        &self,
        folder: &FolderId,
        mime_filter: Option<&str>,
    ) -> RemoteResult<Vec<BlobInfo>> {
        let files = self
            .list_files(
                &children_query(folder, mime_filter),
                BLOB_FIELDS,
                LIST_PAGE_SIZE,
                true,
            )
            .await?;
        Ok(files.into_iter().map(BlobInfo::from).collect())
    }

    async fn find_blob(&self, folder: &FolderId, name: &str) -> RemoteResult<Option<BlobInfo>> {
        let files = self
            .list_files(&named_child_query(folder, name), BLOB_FIELDS, 1, false)
            .await?;
        Ok(files.into_iter().next().map(BlobInfo::from))
    }

    async fn get_blob(&self, id: &BlobId) -> RemoteResult<Vec<u8>> {
        let response = self.media(id.as_str()).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn put_blob(
        &self,
        folder: &FolderId,
        name: &str,
        content: &[u8],
    ) -> RemoteResult<BlobInfo> {
        let file = self
            .upload(Upload {
                method: Method::POST,
                url: format!("{}/upload/drive/v3/files", self.api_base),
                metadata: json!({"name": name, "parents": [folder.as_str()], "mimeType": JSON_MIME}),
                content_type: JSON_MIME,
                payload: content,
                encoding: PartEncoding::Raw,
                fields: BLOB_FIELDS,
            })
            .await?;
        tracing::debug!("Created blob {} ({})", name, file.id);
        Ok(file.into())
    }

    async fn update_blob(&self, id: &BlobId, name: &str, content: &[u8]) -> RemoteResult<()> {
        self.upload(Upload {
            method: Method::PATCH,
            url: format!("{}/upload/drive/v3/files/{id}", self.api_base),
            metadata: json!({"name": name}),
            content_type: JSON_MIME,
            payload: content,
            encoding: PartEncoding::Raw,
            fields: BLOB_FIELDS,
        })
        .await?;
        tracing::debug!("Updated blob {} ({})", name, id);
        Ok(())
    }

    async fn delete_blob(&self, id: &BlobId) -> RemoteResult<()> {
        let url = self.file_url(id.as_str());
        match self
            .execute(|client, token| client.delete(&url).bearer_auth(token))
            .await
        {
            Ok(_) => {
                tracing::debug!("Deleted blob {}", id);
                Ok(())
            }
            Err(RemoteError::Api { status: 404, .. }) => {
                tracing::debug!("Blob {} was already gone", id);
                Ok(())
            }
            Err(error) => Err(error),
        }
    }
}

async fn check_status(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(RemoteError::Unauthorized);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RemoteError::Api {
            status: status.as_u16(),
            message: parse_drive_error(status, &body),
        });
    }
    Ok(response)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> RemoteResult<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn parse_drive_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<DriveErrorResponse>(body) {
        if let Some(message) = payload.error.message {
            return message.trim().to_string();
        }
    }
    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use axum::body::Bytes;
    use axum::extract::{Path as UrlPath, Query, State};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::response::{IntoResponse, Response as AxumResponse};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use base64::Engine;
    use pretty_assertions::assert_eq;
    use regex::Regex;

    use super::*;
    use crate::auth::{AuthError, AuthResult};

    const GOOD_TOKEN: &str = "fresh";

    /// Starts with a stale token; refresh yields the one the fake server accepts
    struct RefreshingIdentity {
        token: Mutex<String>,
        refreshes: AtomicUsize,
    }

    impl RefreshingIdentity {
        fn new(token: &str) -> Arc<Self> {
            Arc::new(Self {
                token: Mutex::new(token.to_string()),
                refreshes: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl IdentityProvider for RefreshingIdentity {
        async fn authenticate(&self) -> AuthResult<()> {
            Ok(())
        }

        async fn access_token(&self) -> AuthResult<String> {
            Ok(self.token.lock().unwrap().clone())
        }

        async fn refresh_token(&self) -> AuthResult<String> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            *self.token.lock().unwrap() = GOOD_TOKEN.to_string();
            Ok(GOOD_TOKEN.to_string())
        }

        async fn is_authenticated(&self) -> bool {
            true
        }

        async fn logout(&self) -> AuthResult<()> {
            Err(AuthError::NotAuthenticated)
        }
    }

    #[derive(Debug, Clone)]
    struct StoredFile {
        id: String,
        name: String,
        mime: String,
        parent: Option<String>,
        content: Vec<u8>,
    }

    #[derive(Default)]
    struct FakeDrive {
        files: Vec<StoredFile>,
        next_id: usize,
        queries: Vec<String>,
        /// Server-side page limit below the requested `pageSize`
        page_cap: Option<usize>,
        page_tokens: Vec<Option<String>>,
    }

    type Shared = Arc<Mutex<FakeDrive>>;

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            == Some("Bearer fresh")
    }

    fn unauthorized() -> AxumResponse {
        (
            AxumStatus::UNAUTHORIZED,
            Json(json!({"error": {"code": 401, "message": "Invalid Credentials"}})),
        )
            .into_response()
    }

    fn capture(pattern: &str, query: &str) -> Option<String> {
        Regex::new(pattern)
            .unwrap()
            .captures(query)
            .map(|captures| captures[1].replace("\\'", "'"))
    }

    fn metadata(file: &StoredFile) -> Value {
        json!({
            "id": file.id,
            "name": file.name,
            "mimeType": file.mime,
            "webViewLink": format!("https://drive.test/view/{}", file.id),
        })
    }

    async fn list(
        State(state): State<Shared>,
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> AxumResponse {
        if !authorized(&headers) {
            return unauthorized();
        }
        let query = params.get("q").cloned().unwrap_or_default();
        let name = capture(r"^name='((?:[^'\\]|\\.)*)'", &query);
        let contains = capture(r"name contains '((?:[^'\\]|\\.)*)'", &query);
        let parent = capture(r"'([^']*)' in parents", &query);
        let mime = capture(r"mimeType='([^']*)'", &query);

        let page_token = params.get("pageToken").cloned();
        let offset = page_token
            .as_deref()
            .map_or(0, |token| token.parse::<usize>().unwrap());
        let mut page_size = params
            .get("pageSize")
            .map_or(100, |size| size.parse::<usize>().unwrap());

        let mut drive = state.lock().unwrap();
        drive.queries.push(query);
        drive.page_tokens.push(page_token);
        if let Some(cap) = drive.page_cap {
            page_size = page_size.min(cap);
        }
        let matching: Vec<Value> = drive
            .files
            .iter()
            .filter(|file| name.as_ref().is_none_or(|name| &file.name == name))
            .filter(|file| contains.as_ref().is_none_or(|text| file.name.contains(text.as_str())))
            .filter(|file| parent.is_none() || file.parent == parent)
            .filter(|file| mime.as_ref().is_none_or(|mime| &file.mime == mime))
            .map(metadata)
            .collect();
        let end = (offset + page_size).min(matching.len());
        let files = &matching[offset.min(end)..end];
        if end < matching.len() {
            Json(json!({ "files": files, "nextPageToken": end.to_string() })).into_response()
        } else {
            Json(json!({ "files": files })).into_response()
        }
    }

    async fn create_folder(
        State(state): State<Shared>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> AxumResponse {
        if !authorized(&headers) {
            return unauthorized();
        }
        let mut drive = state.lock().unwrap();
        drive.next_id += 1;
        let file = StoredFile {
            id: format!("folder-{}", drive.next_id),
            name: body["name"].as_str().unwrap_or_default().to_string(),
            mime: body["mimeType"].as_str().unwrap_or_default().to_string(),
            parent: None,
            content: Vec::new(),
        };
        let response = metadata(&file);
        drive.files.push(file);
        Json(response).into_response()
    }

    /// Split a two-part multipart body into metadata and decoded payload
    fn parse_multipart(headers: &HeaderMap, body: &[u8]) -> (Value, Vec<u8>) {
        let content_type = headers["content-type"].to_str().unwrap();
        let boundary = content_type.split("boundary=").nth(1).unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        let parts: Vec<&str> = text.split(&format!("--{boundary}")).collect();
        let (_, meta) = parts[1].split_once("\r\n\r\n").unwrap();
        let (payload_headers, payload) = parts[2].split_once("\r\n\r\n").unwrap();
        let payload = payload.strip_suffix("\r\n").unwrap_or(payload);
        let payload = if payload_headers.contains("Content-Transfer-Encoding: base64") {
            base64::engine::general_purpose::STANDARD
                .decode(payload)
                .unwrap()
        } else {
            payload.as_bytes().to_vec()
        };
        (serde_json::from_str(meta.trim()).unwrap(), payload)
    }

    async fn upload_new(
        State(state): State<Shared>,
        headers: HeaderMap,
        body: Bytes,
    ) -> AxumResponse {
        if !authorized(&headers) {
            return unauthorized();
        }
        let (meta, payload) = parse_multipart(&headers, &body);
        let mut drive = state.lock().unwrap();
        drive.next_id += 1;
        let file = StoredFile {
            id: format!("file-{}", drive.next_id),
            name: meta["name"].as_str().unwrap_or_default().to_string(),
            mime: meta["mimeType"].as_str().unwrap_or_default().to_string(),
            parent: meta["parents"][0].as_str().map(ToString::to_string),
            content: payload,
        };
        let response = metadata(&file);
        drive.files.push(file);
        Json(response).into_response()
    }

    async fn upload_existing(
        State(state): State<Shared>,
        UrlPath(id): UrlPath<String>,
        headers: HeaderMap,
        body: Bytes,
    ) -> AxumResponse {
        if !authorized(&headers) {
            return unauthorized();
        }
        let (meta, payload) = parse_multipart(&headers, &body);
        let mut drive = state.lock().unwrap();
        let Some(file) = drive.files.iter_mut().find(|file| file.id == id) else {
            return AxumStatus::NOT_FOUND.into_response();
        };
        if let Some(name) = meta["name"].as_str() {
            file.name = name.to_string();
        }
        file.content = payload;
        Json(metadata(file)).into_response()
    }

    async fn get_file(
        State(state): State<Shared>,
        UrlPath(id): UrlPath<String>,
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> AxumResponse {
        if !authorized(&headers) {
            return unauthorized();
        }
        let drive = state.lock().unwrap();
        let Some(file) = drive.files.iter().find(|file| file.id == id) else {
            return (
                AxumStatus::NOT_FOUND,
                Json(json!({"error": {"code": 404, "message": format!("File not found: {id}.")}})),
            )
                .into_response();
        };
        if params.get("alt").map(String::as_str) == Some("media") {
            file.content.clone().into_response()
        } else {
            Json(metadata(file)).into_response()
        }
    }

    async fn delete_file(
        State(state): State<Shared>,
        UrlPath(id): UrlPath<String>,
        headers: HeaderMap,
    ) -> AxumResponse {
        if !authorized(&headers) {
            return unauthorized();
        }
        let mut drive = state.lock().unwrap();
        let before = drive.files.len();
        drive.files.retain(|file| file.id != id);
        if drive.files.len() == before {
            AxumStatus::NOT_FOUND.into_response()
        } else {
            AxumStatus::NO_CONTENT.into_response()
        }
    }

    async fn fake_drive() -> (String, Shared) {
        let state = Shared::default();
        let router = Router::new()
            .route("/drive/v3/files", get(list).post(create_folder))
            .route(
                "/drive/v3/files/{id}",
                get(get_file).delete(delete_file),
            )
            .route("/upload/drive/v3/files", post(upload_new))
            .route(
                "/upload/drive/v3/files/{id}",
                axum::routing::patch(upload_existing),
            )
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{addr}"), state)
    }

    fn client(base: &str, identity: Arc<RefreshingIdentity>) -> DriveClient<RefreshingIdentity> {
        DriveClient::new(identity, Duration::from_secs(10))
            .unwrap()
            .with_api_base(base)
    }

    #[tokio::test]
    async fn blob_lifecycle_against_fake_drive() {
        let (base, state) = fake_drive().await;
        let drive = client(&base, RefreshingIdentity::new(GOOD_TOKEN));

        let folder = drive.find_or_create_folder("NoteFlow").await.unwrap();
        let again = drive.find_or_create_folder("NoteFlow").await.unwrap();
        assert_eq!(folder, again);

        let created = drive
            .put_blob(&folder, "nb-1.json", br#"{"id":"nb-1"}"#)
            .await
            .unwrap();
        assert_eq!(created.name, "nb-1.json");

        let found = drive.find_blob(&folder, "nb-1.json").await.unwrap();
        assert_eq!(found, Some(created.clone()));
        assert_eq!(drive.find_blob(&folder, "missing.json").await.unwrap(), None);

        drive
            .update_blob(&created.id, "nb-1.json", br#"{"id":"nb-1","name":"v2"}"#)
            .await
            .unwrap();
        assert_eq!(
            drive.get_blob(&created.id).await.unwrap(),
            br#"{"id":"nb-1","name":"v2"}"#.to_vec()
        );

        let listed = drive.list_blobs(&folder, Some(JSON_MIME)).await.unwrap();
        assert_eq!(listed, vec![created.clone()]);

        drive.delete_blob(&created.id).await.unwrap();
        drive.delete_blob(&created.id).await.unwrap();
        assert!(drive.list_blobs(&folder, None).await.unwrap().is_empty());

        let drive_state = state.lock().unwrap();
        assert!(drive_state
            .queries
            .iter()
            .any(|query| query.contains("mimeType='application/vnd.google-apps.folder'")));
    }

    #[tokio::test]
    async fn list_blobs_follows_every_page() {
        let (base, state) = fake_drive().await;
        let drive = client(&base, RefreshingIdentity::new(GOOD_TOKEN));
        let folder = drive.find_or_create_folder("NoteFlow").await.unwrap();
        let mut created = Vec::new();
        for index in 0..5 {
            let name = format!("nb-{index}.json");
            created.push(drive.put_blob(&folder, &name, b"{}").await.unwrap());
        }
        {
            let mut drive_state = state.lock().unwrap();
            drive_state.page_cap = Some(2);
            drive_state.page_tokens.clear();
        }

        let listed = drive.list_blobs(&folder, Some(JSON_MIME)).await.unwrap();

        assert_eq!(listed, created);
        assert_eq!(
            state.lock().unwrap().page_tokens,
            vec![None, Some("2".to_string()), Some("4".to_string())]
        );
    }

    #[tokio::test]
    async fn search_stops_after_first_page() {
        let (base, state) = fake_drive().await;
        let drive = client(&base, RefreshingIdentity::new(GOOD_TOKEN));
        let folder = drive.find_or_create_folder("NoteFlow").await.unwrap();
        for index in 0..3 {
            let name = format!("report-{index}.json");
            drive.put_blob(&folder, &name, b"{}").await.unwrap();
        }
        state.lock().unwrap().page_cap = Some(2);

        let hits = drive.search_files("report").await.unwrap();

        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn stale_token_is_refreshed_once() {
        let (base, _state) = fake_drive().await;
        let identity = RefreshingIdentity::new("stale");
        let drive = client(&base, identity.clone());

        drive.find_or_create_folder("NoteFlow").await.unwrap();
        drive.find_or_create_folder("NoteFlow").await.unwrap();
        assert_eq!(identity.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_file_maps_to_api_error() {
        let (base, _state) = fake_drive().await;
        let drive = client(&base, RefreshingIdentity::new(GOOD_TOKEN));
        let error = drive.get_blob(&BlobId::new("nope")).await.unwrap_err();
        match error {
            RemoteError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "File not found: nope.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn binary_upload_download_search_and_link() {
        let (base, state) = fake_drive().await;
        let drive = client(&base, RefreshingIdentity::new(GOOD_TOKEN));
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan's.png");
        std::fs::write(&source, [0x89, b'P', b'N', b'G', 0, 255]).unwrap();

        let uploaded = drive.upload_file("NoteFlow", &source).await.unwrap();
        assert_eq!(uploaded.name, "scan's.png");
        assert_eq!(uploaded.mime_type.as_deref(), Some("image/png"));
        {
            let drive_state = state.lock().unwrap();
            let stored = drive_state
                .files
                .iter()
                .find(|file| file.id == uploaded.id)
                .unwrap();
            assert_eq!(stored.content, vec![0x89, b'P', b'N', b'G', 0, 255]);
            assert!(stored.parent.as_deref().unwrap().starts_with("folder-"));
        }

        let dest = dir.path().join("out").join("copy.png");
        let written = drive.download_file(&uploaded.id, &dest).await.unwrap();
        assert_eq!(written, 6);
        assert_eq!(std::fs::read(&dest).unwrap(), vec![0x89, b'P', b'N', b'G', 0, 255]);

        let hits = drive.search_files("scan's").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, uploaded.id);

        let linked = drive.file_link(&uploaded.id).await.unwrap();
        assert_eq!(
            linked.link(),
            Some(format!("https://drive.test/view/{}", uploaded.id).as_str())
        );
    }

    #[tokio::test]
    async fn large_download_is_written_in_full() {
        let (base, state) = fake_drive().await;
        let drive = client(&base, RefreshingIdentity::new(GOOD_TOKEN));
        let content: Vec<u8> = (0..300_000_u32)
            .map(|index| u8::try_from(index % 251).unwrap())
            .collect();
        state.lock().unwrap().files.push(StoredFile {
            id: "big".to_string(),
            name: "big.bin".to_string(),
            mime: "application/octet-stream".to_string(),
            parent: None,
            content: content.clone(),
        });
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("big.bin");

        let written = drive.download_file("big", &dest).await.unwrap();

        assert_eq!(written, content.len());
        assert_eq!(std::fs::read(&dest).unwrap(), content);
    }

    #[tokio::test]
    async fn failed_download_creates_no_file() {
        let (base, _state) = fake_drive().await;
        let drive = client(&base, RefreshingIdentity::new(GOOD_TOKEN));
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing.bin");

        let error = drive.download_file("nope", &dest).await.unwrap_err();

        assert!(matches!(error, RemoteError::Api { status: 404, .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn drive_error_message_extraction() {
        assert_eq!(
            parse_drive_error(
                StatusCode::FORBIDDEN,
                r#"{"error":{"code":403,"message":"Rate limit exceeded"}}"#
            ),
            "Rate limit exceeded"
        );
        assert_eq!(
            parse_drive_error(StatusCode::BAD_GATEWAY, "  upstream\n down "),
            "upstream down"
        );
        assert_eq!(
            parse_drive_error(StatusCode::SERVICE_UNAVAILABLE, ""),
            "Service Unavailable"
        );
    }

    #[test]
    fn link_falls_back_to_content_link() {
        let file = DriveFile {
            id: "x".to_string(),
            web_content_link: Some("https://download".to_string()),
            ..DriveFile::default()
        };
        assert_eq!(file.link(), Some("https://download"));
        assert_eq!(DriveFile::default().link(), None);
    }
}
