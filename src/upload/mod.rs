//! Batch uploads with per-file tracking.

mod manager;
mod task;

pub use manager::{BatchHandle, UploadManager};
pub use task::{TaskOutcome, UploadBatchResult, UploadStatus, UploadTask};
