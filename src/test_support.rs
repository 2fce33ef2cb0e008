//! In-memory fakes shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Semaphore;

use crate::error::{FileDropError, Result};
use crate::progress::{ProgressCallback, TransferProgress};
use crate::retry::{Notice, Notifier, Resolution};
use crate::store::{FileEntry, FileStore, PermissionSet, UploadFile};

pub(crate) const BASE: &str = "/file";

/// A store that keeps files in memory and fails on request.
///
/// Operations are keyed as `list`, `upload:<name>`, `download:<name>` and
/// `remove:<name>`.
pub(crate) struct MockStore {
    files: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, usize>>,
    calls: Mutex<Vec<String>>,
    permissions: PermissionSet,
    hold_list: AtomicBool,
    list_gate: Semaphore,
    hold_uploads: AtomicBool,
    upload_gate: Semaphore,
    unknown_total: AtomicBool,
}

impl MockStore {
    pub(crate) fn new() -> Self {
        Self::with_permissions(PermissionSet::all())
    }

    pub(crate) fn with_permissions(permissions: PermissionSet) -> Self {
        Self {
            files: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            permissions,
            hold_list: AtomicBool::new(false),
            list_gate: Semaphore::new(0),
            hold_uploads: AtomicBool::new(false),
            upload_gate: Semaphore::new(0),
            unknown_total: AtomicBool::new(false),
        }
    }

    pub(crate) fn with_files(names: &[&str]) -> Self {
        let store = Self::new();
        *store.files.lock().unwrap() = names.iter().map(|n| n.to_string()).collect();
        store
    }

    /// Fail the next `times` calls of `op`.
    pub(crate) fn fail(&self, op: &str, times: usize) {
        self.failures.lock().unwrap().insert(op.to_string(), times);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == op).count()
    }

    pub(crate) fn hold_list(&self) {
        self.hold_list.store(true, Ordering::SeqCst);
    }

    pub(crate) fn release_list(&self, n: usize) {
        self.list_gate.add_permits(n);
    }

    pub(crate) fn hold_uploads(&self) {
        self.hold_uploads.store(true, Ordering::SeqCst);
    }

    pub(crate) fn release_uploads(&self, n: usize) {
        self.upload_gate.add_permits(n);
    }

    pub(crate) fn report_unknown_total(&self) {
        self.unknown_total.store(true, Ordering::SeqCst);
    }

    fn record(&self, op: String) -> Result<()> {
        self.calls.lock().unwrap().push(op.clone());
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(&op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(FileDropError::HttpError(500))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl FileStore for MockStore {
    async fn list(&self) -> Result<Vec<FileEntry>> {
        if self.hold_list.load(Ordering::SeqCst) {
            let permit = self.list_gate.acquire().await.expect("gate closed");
            permit.forget();
        }
        self.record("list".to_string())?;
        let files = self.files.lock().unwrap();
        Ok(files.iter().map(|n| FileEntry::new(BASE, n.as_str())).collect())
    }

    async fn upload(&self, file: &UploadFile, progress: ProgressCallback) -> Result<FileEntry> {
        if self.hold_uploads.load(Ordering::SeqCst) {
            let permit = self.upload_gate.acquire().await.expect("gate closed");
            permit.forget();
        }
        let total = if self.unknown_total.load(Ordering::SeqCst) {
            None
        } else {
            Some(file.len())
        };
        progress(&TransferProgress::new(file.len(), total, file.name.as_str()));
        self.record(format!("upload:{}", file.name))?;
        self.files.lock().unwrap().push(file.name.clone());
        Ok(FileEntry::new(BASE, file.name.as_str()))
    }

    async fn download(&self, name: &str) -> Result<Bytes> {
        self.record(format!("download:{name}"))?;
        Ok(Bytes::from(format!("content of {name}")))
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.record(format!("remove:{name}"))?;
        let mut files = self.files.lock().unwrap();
        if let Some(pos) = files.iter().position(|n| n == name) {
            files.remove(pos);
        }
        Ok(())
    }

    fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }
}

/// A notifier answering from a script and recording every notice.
pub(crate) struct MockNotifier {
    shown: Mutex<Vec<Notice>>,
    resolutions: Mutex<VecDeque<Resolution>>,
    prompts: Mutex<Vec<String>>,
    confirm: AtomicBool,
}

impl MockNotifier {
    /// Notices with an action resolve as `resolutions` in order, then `Dismissed`.
    pub(crate) fn new(resolutions: impl IntoIterator<Item = Resolution>) -> Self {
        Self {
            shown: Mutex::new(Vec::new()),
            resolutions: Mutex::new(resolutions.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
            confirm: AtomicBool::new(true),
        }
    }

    pub(crate) fn dismissing() -> Self {
        Self::new([])
    }

    pub(crate) fn set_confirm(&self, answer: bool) {
        self.confirm.store(answer, Ordering::SeqCst);
    }

    pub(crate) fn shown(&self) -> Vec<Notice> {
        self.shown.lock().unwrap().clone()
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.shown().into_iter().map(|n| n.message).collect()
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn show(&self, notice: Notice) -> Resolution {
        let has_action = notice.action.is_some();
        self.shown.lock().unwrap().push(notice);
        if !has_action {
            return Resolution::Dismissed;
        }
        self.resolutions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Resolution::Dismissed)
    }

    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.confirm.load(Ordering::SeqCst)
    }
}
