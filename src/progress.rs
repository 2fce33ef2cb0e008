//! Progress reporting for file transfers.

use std::sync::Arc;

/// Progress information for uploads.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferProgress {
    /// Bytes transferred so far
    pub done: u64,
    /// Total bytes to transfer, if the transport knows it
    pub total: Option<u64>,
    /// Name of the file being transferred
    pub filename: String,
}

impl TransferProgress {
    /// Create a new progress report.
    pub fn new(done: u64, total: Option<u64>, filename: impl Into<String>) -> Self {
        Self {
            done,
            total,
            filename: filename.into(),
        }
    }

    /// Get progress as a fraction in `[0.0, 1.0]`.
    ///
    /// Returns `None` when the total size is unknown.
    pub fn fraction(&self) -> Option<f64> {
        let total = self.total?;
        if total == 0 {
            return Some(1.0);
        }
        Some((self.done as f64 / total as f64).min(1.0))
    }

    /// Check if transfer is complete.
    pub fn is_complete(&self) -> bool {
        self.total.is_some_and(|total| self.done >= total)
    }
}

/// Type alias for progress callback function.
///
/// Called from the transfer as each chunk is handed to the transport.
pub type ProgressCallback = Arc<dyn Fn(&TransferProgress) + Send + Sync>;

/// A callback that ignores all progress reports.
pub fn no_progress() -> ProgressCallback {
    Arc::new(|_: &TransferProgress| {})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_with_known_total() {
        let p = TransferProgress::new(25, Some(100), "a.txt");
        assert_eq!(p.fraction(), Some(0.25));
        assert!(!p.is_complete());

        let done = TransferProgress::new(100, Some(100), "a.txt");
        assert_eq!(done.fraction(), Some(1.0));
        assert!(done.is_complete());
    }

    #[test]
    fn test_fraction_unknown_total() {
        let p = TransferProgress::new(10, None, "a.txt");
        assert_eq!(p.fraction(), None);
        assert!(!p.is_complete());
    }

    #[test]
    fn test_empty_file_is_complete() {
        let p = TransferProgress::new(0, Some(0), "empty");
        assert_eq!(p.fraction(), Some(1.0));
        assert!(p.is_complete());
    }
}
