//! Error types for the filedrop library.

use std::sync::Arc;

use thiserror::Error;

use crate::store::Permission;
use crate::upload::UploadBatchResult;

/// Main error type for filedrop operations.
#[derive(Error, Debug)]
pub enum FileDropError {
    /// HTTP request failed with status code.
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// Network request error.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid or unexpected response from server.
    #[error("Invalid response from server")]
    InvalidResponse,

    /// The user dismissed the failure notice instead of retrying.
    #[error("Retry declined: {0}")]
    RetryDeclined(#[source] Box<FileDropError>),

    /// A list refresh failed. Shared by every caller that joined the refresh.
    #[error("File list unavailable: {0}")]
    ListUnavailable(#[source] Arc<FileDropError>),

    /// At least one file of a batch failed to upload.
    #[error("Uploaded {} file(s), {} failed", .0.uploaded.len(), .0.failed.len())]
    PartialUpload(UploadBatchResult),

    /// An upload batch was requested with no files.
    #[error("No files provided")]
    NoFiles,

    /// No upload task with this id.
    #[error("Unknown upload task: {0}")]
    UnknownTask(u64),

    /// The session lacks the capability for this action.
    #[error("Permission denied: {0} not granted")]
    PermissionDenied(Permission),

    /// Local filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("Config error: {0}")]
    Config(String),

    /// A background actor has shut down.
    #[error("Actor stopped")]
    ActorStopped,

    /// Custom error message.
    #[error("{0}")]
    Custom(String),
}

impl FileDropError {
    /// Whether this is a network or server failure on a file operation.
    pub fn is_transport(&self) -> bool {
        match self {
            FileDropError::HttpError(_)
            | FileDropError::RequestError(_)
            | FileDropError::InvalidResponse => true,
            FileDropError::RetryDeclined(inner) => inner.is_transport(),
            FileDropError::ListUnavailable(inner) => inner.is_transport(),
            _ => false,
        }
    }

    /// The failure underneath any retry or refresh wrapping.
    pub fn root_cause(&self) -> &FileDropError {
        match self {
            FileDropError::RetryDeclined(inner) => inner.root_cause(),
            FileDropError::ListUnavailable(inner) => inner.root_cause(),
            other => other,
        }
    }
}

/// Result type alias for filedrop operations.
pub type Result<T> = std::result::Result<T, FileDropError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(FileDropError::HttpError(500).is_transport());
        assert!(FileDropError::InvalidResponse.is_transport());
        assert!(!FileDropError::NoFiles.is_transport());
        assert!(!FileDropError::PermissionDenied(Permission::Write).is_transport());

        let declined = FileDropError::RetryDeclined(Box::new(FileDropError::HttpError(503)));
        assert!(declined.is_transport());
    }

    #[test]
    fn test_root_cause_unwraps_nested_failures() {
        let inner = FileDropError::RetryDeclined(Box::new(FileDropError::HttpError(404)));
        let shared = FileDropError::ListUnavailable(Arc::new(inner));
        assert!(matches!(shared.root_cause(), FileDropError::HttpError(404)));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(FileDropError::HttpError(502).to_string(), "HTTP error: 502");
        assert_eq!(
            FileDropError::PermissionDenied(Permission::Delete).to_string(),
            "Permission denied: delete not granted"
        );
    }
}
