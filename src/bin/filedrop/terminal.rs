//! Notices on stderr, answers on stdin.

use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use filedrop::{Notice, Notifier, Resolution};
use tokio::sync::{Mutex, mpsc};
use tokio::time::timeout;
use tracing::debug;

pub struct TerminalNotifier {
    answers: Mutex<mpsc::Receiver<String>>,
    notice_timeout: Duration,
    assume_yes: bool,
}

impl TerminalNotifier {
    /// Answer notices from the process's stdin.
    pub fn new(notice_timeout: Duration, assume_yes: bool) -> Self {
        Self::with_answers(stdin_lines(), notice_timeout, assume_yes)
    }

    /// Answer notices from any line source; a closed source dismisses.
    pub fn with_answers(
        answers: mpsc::Receiver<String>,
        notice_timeout: Duration,
        assume_yes: bool,
    ) -> Self {
        Self {
            answers: Mutex::new(answers),
            notice_timeout,
            assume_yes,
        }
    }

    async fn read_answer(&self, limit: Option<Duration>) -> Option<String> {
        let mut answers = self.answers.lock().await;
        let line = match limit {
            Some(limit) => match timeout(limit, answers.recv()).await {
                Ok(line) => line,
                Err(_) => {
                    debug!("notice timed out");
                    return None;
                }
            },
            None => answers.recv().await,
        };
        line.map(|l| l.trim().to_lowercase())
    }
}

/// Forward stdin lines from a detached thread.
///
/// A blocking stdin read cannot be cancelled, so it must not run on the
/// runtime; the thread is left behind when the process exits.
fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(1);
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

#[async_trait]
impl Notifier for TerminalNotifier {
    async fn show(&self, notice: Notice) -> Resolution {
        let Some(action) = notice.action else {
            eprintln!("{}", notice.message);
            return Resolution::Dismissed;
        };

        eprint!(
            "{} [{}? y/N, {}s] ",
            notice.message,
            action,
            self.notice_timeout.as_secs()
        );
        let answer = self.read_answer(Some(self.notice_timeout)).await;
        match answer.as_deref() {
            Some("y" | "yes") => Resolution::Activated,
            Some(a) if a == action.to_lowercase() => Resolution::Activated,
            Some(_) => Resolution::Dismissed,
            None => {
                eprintln!();
                Resolution::Dismissed
            }
        }
    }

    async fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{} [y/N] ", prompt);
        matches!(self.read_answer(None).await.as_deref(), Some("y" | "yes"))
    }
}
