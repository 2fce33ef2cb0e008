//! User-driven retry of idempotent actions.
//!
//! An action is run once; its outcome is surfaced through a [`Notifier`].
//! A failure notice carries a single "Retry" action, and the action is
//! re-run for as long as the user keeps choosing it. There is no automatic
//! backoff and no retry budget.

use std::future::Future;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{FileDropError, Result};

/// Label of the action attached to failure notices.
pub const RETRY_LABEL: &str = "Retry";

/// A transient notification, optionally carrying one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub action: Option<String>,
}

impl Notice {
    /// A notice without an action.
    pub fn simple(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            action: None,
        }
    }

    /// A notice with a single action button.
    pub fn with_action(message: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            action: Some(action.into()),
        }
    }
}

/// How a notice was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The user activated the notice's action.
    Activated,
    /// The notice timed out or was dismissed.
    Dismissed,
}

impl Resolution {
    pub fn activated(&self) -> bool {
        matches!(self, Resolution::Activated)
    }
}

/// Surface for transient notifications and confirmation prompts.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Show a notice and wait until it is resolved.
    async fn show(&self, notice: Notice) -> Resolution;

    /// Ask the user to confirm a destructive action.
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Successful result of an action, with an optional message override.
#[derive(Debug)]
pub struct Completed<T> {
    pub value: T,
    pub message: Option<String>,
}

impl<T> Completed<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            message: None,
        }
    }

    /// Replace the success message for this outcome.
    pub fn with_message(value: T, message: impl Into<String>) -> Self {
        Self {
            value,
            message: Some(message.into()),
        }
    }
}

/// Failed result of an action, with an optional message override.
#[derive(Debug)]
pub struct Failed {
    pub error: FileDropError,
    pub message: Option<String>,
}

impl Failed {
    /// Replace the failure message for this outcome.
    pub fn with_message(error: FileDropError, message: impl Into<String>) -> Self {
        Self {
            error,
            message: Some(message.into()),
        }
    }
}

impl From<FileDropError> for Failed {
    fn from(error: FileDropError) -> Self {
        Self {
            error,
            message: None,
        }
    }
}

/// Outcome of one attempt of a retriable action.
pub type Attempt<T> = std::result::Result<Completed<T>, Failed>;

/// Run `action`, notify the user of the outcome and let them retry failures.
///
/// On success the success message (or the attempt's override) is shown once
/// and the value returned; an empty or absent message shows nothing. On
/// failure a notice with a "Retry" action is shown: activating it runs
/// `action` again, anything else ends the loop with
/// [`FileDropError::RetryDeclined`] wrapping the last failure.
pub async fn retriable_action<T, F, Fut>(
    notifier: &dyn Notifier,
    success_message: Option<&str>,
    failure_message: &str,
    mut action: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let mut ok_text = success_message.map(str::to_string);
    let mut fail_text = failure_message.to_string();
    let mut attempt = 1u32;

    loop {
        match action().await {
            Ok(done) => {
                if let Some(message) = done.message {
                    ok_text = Some(message);
                }
                if let Some(text) = ok_text.as_deref().filter(|t| !t.is_empty()) {
                    notifier.show(Notice::simple(text)).await;
                }
                return Ok(done.value);
            }
            Err(failed) => {
                if let Some(message) = failed.message {
                    fail_text = message;
                }
                debug!(attempt, error = %failed.error, "action failed");
                let resolution = notifier
                    .show(Notice::with_action(fail_text.as_str(), RETRY_LABEL))
                    .await;
                if !resolution.activated() {
                    warn!(attempts = attempt, error = %failed.error, "retry declined");
                    return Err(FileDropError::RetryDeclined(Box::new(failed.error)));
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockNotifier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> AtomicUsize {
        AtomicUsize::new(0)
    }

    #[tokio::test]
    async fn test_always_failing_action_surfaces_original_error() {
        let notifier = MockNotifier::dismissing();
        let calls = counter();

        let res: Result<()> = retriable_action(&notifier, Some("ok"), "failed", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Failed::from(FileDropError::HttpError(503))) }
        })
        .await;

        let err = res.unwrap_err();
        assert!(matches!(err, FileDropError::RetryDeclined(_)));
        assert!(matches!(err.root_cause(), FileDropError::HttpError(503)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            notifier.shown(),
            vec![Notice::with_action("failed", RETRY_LABEL)]
        );
    }

    #[tokio::test]
    async fn test_retry_then_success_notifies_once() {
        let notifier = MockNotifier::new([Resolution::Activated]);
        let calls = counter();

        let value = retriable_action(&notifier, Some("Deleted a"), "Failed to delete a", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(Failed::from(FileDropError::HttpError(500)))
                } else {
                    Ok(Completed::new(42))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            notifier.messages(),
            vec!["Failed to delete a".to_string(), "Deleted a".to_string()]
        );
        let successes = notifier
            .shown()
            .into_iter()
            .filter(|n| n.action.is_none())
            .count();
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_retries_are_unbounded() {
        let notifier = MockNotifier::new([Resolution::Activated; 5]);
        let calls = counter();

        let res: Result<()> = retriable_action(&notifier, None, "nope", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Failed::from(FileDropError::HttpError(500))) }
        })
        .await;

        assert!(res.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_override_messages_replace_defaults() {
        let notifier = MockNotifier::new([Resolution::Activated]);
        let calls = counter();

        retriable_action(&notifier, Some("default ok"), "default fail", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(Failed::with_message(FileDropError::HttpError(500), "custom fail"))
                } else {
                    Ok(Completed::with_message((), "custom ok"))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(
            notifier.messages(),
            vec!["custom fail".to_string(), "custom ok".to_string()]
        );
    }

    #[tokio::test]
    async fn test_empty_success_message_shows_nothing() {
        let notifier = MockNotifier::dismissing();

        retriable_action(&notifier, Some(""), "fail", || async {
            Ok(Completed::new(()))
        })
        .await
        .unwrap();
        retriable_action(&notifier, None, "fail", || async { Ok(Completed::new(())) })
            .await
            .unwrap();

        assert!(notifier.shown().is_empty());
    }

    #[tokio::test]
    async fn test_default_confirm_accepts() {
        struct Silent;

        #[async_trait]
        impl Notifier for Silent {
            async fn show(&self, _notice: Notice) -> Resolution {
                Resolution::Dismissed
            }
        }

        assert!(Silent.confirm("Delete a?").await);
    }
}
