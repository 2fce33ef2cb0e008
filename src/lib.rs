//! # filedrop
//!
//! Client library for a simple HTTP file drop.
//!
//! ## Features
//!
//! - **File Store**: List, upload, download and delete files on a store that
//!   maps each file to `<base>/<percent-encoded name>`.
//!   - Uploads are streamed in chunks with byte-level progress callbacks.
//!   - Read, write and delete capabilities gate every operation.
//! - **Batch Uploads**:
//!   - Concurrent uploads tracked per file with status and percent complete.
//!   - A batch resolves once every file is terminal, reporting which files
//!     were stored and which failed.
//! - **User-driven Retry**:
//!   - Outcomes are surfaced as transient notices; failures carry a "Retry"
//!     action that re-runs the operation for as long as the user asks.
//! - **Controller**:
//!   - Loading / failed / empty / populated list state.
//!   - Single-flight refresh, upload with retry of failed files only,
//!     confirmed delete.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use filedrop::{Config, Controller, Notice, Notifier, Resolution, UploadFile};
//!
//! struct Log;
//!
//! #[async_trait]
//! impl Notifier for Log {
//!     async fn show(&self, notice: Notice) -> Resolution {
//!         println!("{}", notice.message);
//!         Resolution::Dismissed
//!     }
//! }
//!
//! # async fn example() -> filedrop::Result<()> {
//! let store = Config::default().store()?;
//! let controller = Controller::new(Arc::new(store), Arc::new(Log));
//!
//! controller.refresh().await?;
//! for file in controller.files().await? {
//!     println!("{} -> {}", file.name, file.url);
//! }
//!
//! let report = controller
//!     .upload(vec![UploadFile::from_path("notes.txt").await?])
//!     .await?;
//! println!("{} uploaded", report.uploaded.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod progress;
pub mod retry;
pub mod store;
pub mod upload;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::Config;
pub use controller::{Controller, ListState};
pub use error::{FileDropError, Result};
pub use progress::{ProgressCallback, TransferProgress};
pub use retry::{Attempt, Completed, Failed, Notice, Notifier, Resolution, retriable_action};
pub use store::{FileEntry, FileStore, HttpFileStore, Permission, PermissionSet, UploadFile};
pub use upload::{
    BatchHandle, TaskOutcome, UploadBatchResult, UploadManager, UploadStatus, UploadTask,
};
