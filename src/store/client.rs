//! File store contract and its HTTP implementation.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::entry::{FileEntry, UploadFile, url_for};
use super::permissions::PermissionSet;
use crate::error::Result;
use crate::http::HttpClient;
use crate::progress::{ProgressCallback, TransferProgress};

/// Default size of the body chunks streamed during an upload.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Operations on the remote file store.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// List every file in the store.
    async fn list(&self) -> Result<Vec<FileEntry>>;

    /// Create or overwrite a file, reporting byte-level progress.
    async fn upload(&self, file: &UploadFile, progress: ProgressCallback) -> Result<FileEntry>;

    /// Fetch a file's content.
    async fn download(&self, name: &str) -> Result<Bytes>;

    /// Delete a file.
    async fn remove(&self, name: &str) -> Result<()>;

    /// Capabilities granted to this session.
    fn permissions(&self) -> &PermissionSet;

    fn can_read(&self) -> bool {
        self.permissions().can_read()
    }

    fn can_write(&self) -> bool {
        self.permissions().can_write()
    }

    fn can_delete(&self) -> bool {
        self.permissions().can_delete()
    }
}

#[derive(Deserialize)]
struct Listing {
    #[serde(default)]
    entries: Option<Vec<Map<String, Value>>>,
}

/// File store reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFileStore {
    http: HttpClient,
    base_url: String,
    permissions: PermissionSet,
    chunk_size: usize,
}

impl HttpFileStore {
    /// Create a store client for `base_url` (e.g. `http://host:8080/file`).
    pub fn new(base_url: impl Into<String>, permissions: PermissionSet) -> Self {
        Self::with_client(HttpClient::new(), base_url, permissions)
    }

    /// Create a store client using an existing HTTP client.
    pub fn with_client(
        http: HttpClient,
        base_url: impl Into<String>,
        permissions: PermissionSet,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            permissions,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the size of the body chunks streamed during uploads.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// The store's base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a named file.
    pub fn url_for(&self, name: &str) -> String {
        url_for(&self.base_url, name)
    }
}

#[async_trait]
impl FileStore for HttpFileStore {
    async fn list(&self) -> Result<Vec<FileEntry>> {
        let body = self.http.get_text(&format!("{}/", self.base_url)).await?;
        let listing: Listing = serde_json::from_str(&body)?;
        let entries = listing
            .entries
            .unwrap_or_default()
            .into_iter()
            .map(|raw| FileEntry::from_listing(&self.base_url, raw))
            .collect::<Result<Vec<_>>>()?;
        debug!(count = entries.len(), "listed files");
        Ok(entries)
    }

    async fn upload(&self, file: &UploadFile, progress: ProgressCallback) -> Result<FileEntry> {
        let url = self.url_for(&file.name);
        let total = file.len();
        let name = file.name.clone();

        let content = file.content.clone();
        let chunks: Vec<Bytes> = (0..content.len())
            .step_by(self.chunk_size)
            .map(|start| content.slice(start..(start + self.chunk_size).min(content.len())))
            .collect();

        progress(&TransferProgress::new(0, Some(total), name.as_str()));
        let mut done = 0u64;
        let body = stream::iter(chunks).map(move |chunk| {
            done += chunk.len() as u64;
            progress(&TransferProgress::new(done, Some(total), name.as_str()));
            Ok::<Bytes, std::io::Error>(chunk)
        });

        self.http
            .put(&url, reqwest::Body::wrap_stream(body))
            .await?;
        debug!(name = %file.name, bytes = total, "uploaded file");

        Ok(FileEntry {
            name: file.name.clone(),
            url,
            metadata: Value::Null,
        })
    }

    async fn download(&self, name: &str) -> Result<Bytes> {
        self.http.get_bytes(&self.url_for(name)).await
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.http.delete(&self.url_for(name)).await?;
        debug!(name, "deleted file");
        Ok(())
    }

    fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }
}
