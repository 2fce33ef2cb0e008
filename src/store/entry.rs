//! File entries and upload payloads.

use std::path::Path;

use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FileDropError, Result};

/// Everything but RFC 3986 unreserved characters is encoded, so a name is
/// always a single path segment.
const NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Build the URL of a file from the store's base URL.
pub fn url_for(base: &str, name: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        utf8_percent_encode(name, NAME_ENCODE_SET)
    )
}

/// A file known to the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// File name, unique within a listing
    pub name: String,
    /// URL of the file content
    pub url: String,
    /// Listing fields other than the name, passed through untouched
    #[serde(default)]
    pub metadata: Value,
}

impl FileEntry {
    /// Create an entry for `name` under the store's base URL.
    pub fn new(base: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            url: url_for(base, &name),
            name,
            metadata: Value::Null,
        }
    }

    /// Build an entry from one object of a listing response.
    pub(crate) fn from_listing(base: &str, mut raw: Map<String, Value>) -> Result<Self> {
        let name = match raw.remove("name") {
            Some(Value::String(name)) => name,
            _ => return Err(FileDropError::InvalidResponse),
        };
        let mut entry = Self::new(base, name);
        if !raw.is_empty() {
            entry.metadata = Value::Object(raw);
        }
        Ok(entry)
    }
}

/// Local file content queued for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Remote file name
    pub name: String,
    /// Raw file content
    pub content: Bytes,
}

impl UploadFile {
    /// Create an upload from in-memory content.
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a local file; the remote name is the file's base name.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .ok_or_else(|| FileDropError::Custom(format!("Invalid file path: {}", path.display())))?
            .to_string_lossy()
            .to_string();
        let content = tokio::fs::read(path).await?;
        Ok(Self::new(name, content))
    }

    /// Size of the content in bytes.
    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    /// Whether the content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
