//! Per-file progress bars fed from upload task snapshots.

use std::collections::HashMap;
use std::time::Duration;

use filedrop::{UploadManager, UploadStatus, UploadTask};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;

const SCALE: u64 = 1000;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct UploadBars {
    handle: JoinHandle<()>,
}

impl UploadBars {
    /// Start rendering bars for every task of `uploads`.
    pub fn spawn(uploads: UploadManager) -> Self {
        let handle = tokio::spawn(async move {
            let multi = MultiProgress::new();
            let mut bars = HashMap::new();
            loop {
                let Ok(tasks) = uploads.tasks().await else {
                    break;
                };
                for task in &tasks {
                    let bar = bars
                        .entry(task.id)
                        .or_insert_with(|| multi.add(new_bar(task)));
                    update(bar, task);
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        });
        Self { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

fn new_bar(task: &UploadTask) -> ProgressBar {
    let bar = ProgressBar::new(SCALE);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{wide_bar:.cyan/blue}] {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    bar.set_message(task.name.clone());
    bar
}

fn update(bar: &ProgressBar, task: &UploadTask) {
    if bar.is_finished() {
        return;
    }
    match task.status {
        UploadStatus::Pending => match task.percent_complete {
            Some(fraction) => bar.set_position((fraction * SCALE as f64) as u64),
            None => bar.tick(),
        },
        UploadStatus::Success => {
            bar.set_position(SCALE);
            bar.finish_with_message(format!("{} uploaded", task.name));
        }
        UploadStatus::Error => bar.abandon_with_message(format!("{} failed", task.name)),
    }
}
