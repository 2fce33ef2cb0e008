//! Upload task state and batch results.

use std::sync::Arc;

use tracing::warn;

use crate::error::{FileDropError, Result};
use crate::progress::TransferProgress;
use crate::store::{FileEntry, UploadFile};

/// Status of a single upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    /// Transfer in flight
    Pending,
    /// Stored remotely
    Success,
    /// Transfer failed
    Error,
}

impl UploadStatus {
    /// Whether no further transition can occur.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, UploadStatus::Pending)
    }
}

/// A file queued for upload and its current state.
///
/// Holds only the file's name and size; the content lives with the
/// transfer and is released once it ends.
#[derive(Debug, Clone)]
pub struct UploadTask {
    /// Process-local id, never reused
    pub id: u64,
    /// Remote file name
    pub name: String,
    /// Content size in bytes
    pub size: u64,
    /// Current status
    pub status: UploadStatus,
    /// Fraction uploaded, `None` until known or if the total is unknown
    pub percent_complete: Option<f64>,
    warned_unknown_total: bool,
}

impl UploadTask {
    pub(crate) fn new(id: u64, file: &UploadFile) -> Self {
        Self {
            id,
            name: file.name.clone(),
            size: file.len(),
            status: UploadStatus::Pending,
            percent_complete: None,
            warned_unknown_total: false,
        }
    }

    /// Record a progress report. Ignored once the task is terminal.
    pub(crate) fn record_progress(&mut self, progress: &TransferProgress) {
        if self.status.is_terminal() {
            return;
        }
        match progress.fraction() {
            Some(fraction) => self.percent_complete = Some(fraction),
            None => {
                self.percent_complete = None;
                if !self.warned_unknown_total {
                    warn!(file = %self.name, "total size not computable");
                    self.warned_unknown_total = true;
                }
            }
        }
    }

    /// Move to a terminal state. Returns `false` if already terminal.
    pub(crate) fn finish(&mut self, success: bool) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = if success {
            UploadStatus::Success
        } else {
            UploadStatus::Error
        };
        true
    }
}

/// Terminal result of one upload task.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    /// The file was stored
    Uploaded(FileEntry),
    /// The transfer failed
    Failed {
        file: UploadFile,
        error: Arc<FileDropError>,
    },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Uploaded(_))
    }
}

/// Partition of a batch upload into stored entries and failed source files.
#[derive(Debug, Clone, Default)]
pub struct UploadBatchResult {
    /// Entries created, in input order
    pub uploaded: Vec<FileEntry>,
    /// Source files whose upload failed, in input order
    pub failed: Vec<UploadFile>,
}

impl UploadBatchResult {
    /// Partition task outcomes.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = TaskOutcome>) -> Self {
        let mut result = Self::default();
        for outcome in outcomes {
            match outcome {
                TaskOutcome::Uploaded(entry) => result.uploaded.push(entry),
                TaskOutcome::Failed { file, .. } => result.failed.push(file),
            }
        }
        result
    }

    /// True if every file was uploaded.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of files in the batch.
    pub fn len(&self) -> usize {
        self.uploaded.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Err(PartialUpload)` if any file failed, carrying the full partition.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FileDropError::PartialUpload(self))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> UploadTask {
        UploadTask::new(7, &UploadFile::new("a.bin", vec![0u8; 10]))
    }

    #[test]
    fn test_progress_with_known_total() {
        let mut t = task();
        t.record_progress(&TransferProgress::new(5, Some(10), "a.bin"));
        assert_eq!(t.percent_complete, Some(0.5));
    }

    #[test]
    fn test_progress_with_unknown_total() {
        let mut t = task();
        t.record_progress(&TransferProgress::new(5, Some(10), "a.bin"));
        t.record_progress(&TransferProgress::new(6, None, "a.bin"));
        assert_eq!(t.percent_complete, None);
        assert!(t.warned_unknown_total);
    }

    #[test]
    fn test_status_transitions_once() {
        let mut t = task();
        assert!(t.finish(false));
        assert_eq!(t.status, UploadStatus::Error);
        assert!(!t.finish(true));
        assert_eq!(t.status, UploadStatus::Error);

        t.record_progress(&TransferProgress::new(10, Some(10), "a.bin"));
        assert_eq!(t.percent_complete, None);
    }

    #[test]
    fn test_partition_keeps_input_order() {
        let outcomes = vec![
            TaskOutcome::Uploaded(FileEntry::new("/file", "a")),
            TaskOutcome::Failed {
                file: UploadFile::new("b", "b"),
                error: Arc::new(FileDropError::HttpError(500)),
            },
            TaskOutcome::Uploaded(FileEntry::new("/file", "c")),
        ];
        let result = UploadBatchResult::from_outcomes(outcomes);
        assert_eq!(result.len(), 3);
        assert_eq!(
            result.uploaded.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            vec!["a", "c"]
        );
        assert_eq!(result.failed[0].name, "b");

        match result.into_result() {
            Err(FileDropError::PartialUpload(partial)) => assert_eq!(partial.failed.len(), 1),
            other => panic!("expected partial upload, got {:?}", other),
        }
    }
}
