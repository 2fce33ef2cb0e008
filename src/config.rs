//! Client configuration loaded from TOML.
//!
//! ```toml
//! base_url = "http://localhost:8080/file"
//! permissions = "read,write"   # or ["read", "write"]
//! proxy = "http://proxy:3128"
//! notice_timeout_secs = 8
//! chunk_size = 65536
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{FileDropError, Result};
use crate::http::HttpClient;
use crate::store::{HttpFileStore, PermissionSet};

/// Default file store location.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/file";
/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "filedrop.toml";

const DEFAULT_NOTICE_TIMEOUT_SECS: u64 = 8;

/// Permissions as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum PermissionsValue {
    /// `"read,write"`, as carried by the session's permissions header
    Joined(String),
    List(Vec<String>),
}

impl PermissionsValue {
    fn to_set(&self) -> PermissionSet {
        match self {
            PermissionsValue::Joined(list) => PermissionSet::parse_list(list),
            PermissionsValue::List(items) => PermissionSet::from_strings(items),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    base_url: Option<String>,
    permissions: Option<PermissionsValue>,
    proxy: Option<String>,
    notice_timeout_secs: Option<u64>,
    chunk_size: Option<usize>,
}

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub permissions: PermissionSet,
    pub proxy: Option<String>,
    /// How long a notice waits for an answer before it counts as dismissed
    pub notice_timeout: Duration,
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            permissions: PermissionSet::all(),
            proxy: None,
            notice_timeout: Duration::from_secs(DEFAULT_NOTICE_TIMEOUT_SECS),
            chunk_size: crate::store::DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        let raw: RawConfig =
            toml::from_str(text).map_err(|e| FileDropError::Config(e.to_string()))?;
        let defaults = Config::default();

        if raw.chunk_size == Some(0) {
            return Err(FileDropError::Config("chunk_size must be positive".into()));
        }

        Ok(Self {
            base_url: raw.base_url.unwrap_or(defaults.base_url),
            permissions: raw
                .permissions
                .map(|p| p.to_set())
                .unwrap_or(defaults.permissions),
            proxy: raw.proxy.filter(|p| !p.is_empty()),
            notice_timeout: raw
                .notice_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.notice_timeout),
            chunk_size: raw.chunk_size.unwrap_or(defaults.chunk_size),
        })
    }

    /// Load a configuration file.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading config");
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_toml(&text)
    }

    /// Load `filedrop.toml` from the working directory, or defaults if absent.
    pub async fn load_default() -> Result<Self> {
        match tokio::fs::try_exists(DEFAULT_CONFIG_FILE).await {
            Ok(true) => Self::load(DEFAULT_CONFIG_FILE).await,
            _ => Ok(Self::default()),
        }
    }

    /// Override permissions from a comma-separated list.
    pub fn set_permissions(&mut self, list: &str) {
        self.permissions = PermissionSet::parse_list(list);
    }

    /// Build the HTTP store this configuration describes.
    pub fn store(&self) -> Result<HttpFileStore> {
        let http = match self.proxy.as_deref() {
            Some(proxy) => HttpClient::with_proxy(proxy)?,
            None => HttpClient::new(),
        };
        Ok(
            HttpFileStore::with_client(http, self.base_url.as_str(), self.permissions.clone())
                .with_chunk_size(self.chunk_size),
        )
    }
}
