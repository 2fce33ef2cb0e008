//! Application controller: file list state, refresh, upload and delete.
//!
//! The file list and refresh bookkeeping live in a single actor task; every
//! mutation goes through its command channel. Network calls and retry
//! prompts run outside the actor and report back to it.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::error::{FileDropError, Result};
use crate::retry::{Attempt, Completed, Failed, Notifier, retriable_action};
use crate::store::{FileEntry, FileStore, Permission, UploadFile};
use crate::upload::{UploadBatchResult, UploadManager};

/// Failure notice of a refresh.
pub const LIST_UNAVAILABLE: &str = "File list unavailable.";

/// State of the controller's file list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    /// A refresh is in flight
    Loading,
    /// The last refresh failed
    Failed,
    /// The list is empty
    Empty,
    /// The list has entries
    HasData,
}

/// Handle to the controller actor. Cheap to clone.
#[derive(Clone)]
pub struct Controller {
    tx: mpsc::Sender<ControllerCommand>,
    store: Arc<dyn FileStore>,
    notifier: Arc<dyn Notifier>,
    uploads: UploadManager,
}

enum ControllerCommand {
    ListState {
        reply: oneshot::Sender<ListState>,
    },
    Files {
        reply: oneshot::Sender<Vec<FileEntry>>,
    },
    Refresh {
        reply: Option<oneshot::Sender<Result<()>>>,
    },
    RefreshDone {
        result: Result<Vec<FileEntry>>,
    },
    Append {
        entries: Vec<FileEntry>,
        reply: oneshot::Sender<()>,
    },
    Remove {
        name: String,
        reply: oneshot::Sender<bool>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

struct ControllerActor {
    store: Arc<dyn FileStore>,
    notifier: Arc<dyn Notifier>,
    tx: mpsc::WeakSender<ControllerCommand>,
    rx: mpsc::Receiver<ControllerCommand>,
    files: Vec<FileEntry>,
    files_failed: bool,
    // Some while a refresh is in flight.
    refresh_waiters: Option<Vec<oneshot::Sender<Result<()>>>>,
}

impl Controller {
    /// Start a controller and kick off the initial refresh.
    pub fn start(store: Arc<dyn FileStore>, notifier: Arc<dyn Notifier>) -> Self {
        let controller = Self::new(store, notifier);
        if controller.can_read() {
            let _ = controller
                .tx
                .try_send(ControllerCommand::Refresh { reply: None });
        }
        controller
    }

    /// Start a controller with an empty list and no refresh.
    pub fn new(store: Arc<dyn FileStore>, notifier: Arc<dyn Notifier>) -> Self {
        let uploads = UploadManager::new(store.clone());
        let tx = ControllerActor::spawn(store.clone(), notifier.clone());
        Self {
            tx,
            store,
            notifier,
            uploads,
        }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(oneshot::Sender<R>) -> ControllerCommand,
    ) -> Result<R> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(build(tx))
            .await
            .map_err(|_| FileDropError::ActorStopped)?;
        rx.await.map_err(|_| FileDropError::ActorStopped)
    }

    fn require(&self, perm: Permission) -> Result<()> {
        if self.store.permissions().has(perm) {
            Ok(())
        } else {
            Err(FileDropError::PermissionDenied(perm))
        }
    }

    pub fn can_read(&self) -> bool {
        self.store.can_read()
    }

    pub fn can_write(&self) -> bool {
        self.store.can_write()
    }

    pub fn can_delete(&self) -> bool {
        self.store.can_delete()
    }

    /// The upload manager used for this controller's uploads.
    pub fn uploads(&self) -> &UploadManager {
        &self.uploads
    }

    /// Current state of the file list.
    pub async fn list_state(&self) -> Result<ListState> {
        self.request(|reply| ControllerCommand::ListState { reply })
            .await
    }

    /// Snapshot of the file list.
    pub async fn files(&self) -> Result<Vec<FileEntry>> {
        self.request(|reply| ControllerCommand::Files { reply })
            .await
    }

    /// Reload the file list.
    ///
    /// Concurrent calls join the refresh already in flight and observe its
    /// result instead of issuing another request.
    pub async fn refresh(&self) -> Result<()> {
        self.require(Permission::Read)?;
        self.request(|reply| ControllerCommand::Refresh { reply: Some(reply) })
            .await?
    }

    /// Upload files, letting the user retry the ones that fail.
    ///
    /// Files stored by each attempt are added to the list immediately; a
    /// retry uploads only the files that failed in the previous attempt.
    pub async fn upload(&self, files: Vec<UploadFile>) -> Result<UploadBatchResult> {
        self.require(Permission::Write)?;
        if files.is_empty() {
            return Err(FileDropError::NoFiles);
        }

        let to_upload = Arc::new(Mutex::new(files));
        let uploaded = Arc::new(Mutex::new(Vec::<FileEntry>::new()));

        let action = || upload_attempt(self.clone(), to_upload.clone(), uploaded.clone());
        retriable_action(self.notifier.as_ref(), None, "Upload failed", action).await
    }

    /// Upload dropped files if the session may write; otherwise ignore them.
    pub async fn drop_files(&self, files: Vec<UploadFile>) -> Result<Option<UploadBatchResult>> {
        if !self.can_write() {
            debug!(count = files.len(), "ignoring drop without write permission");
            return Ok(None);
        }
        self.upload(files).await.map(Some)
    }

    /// Delete a file after confirmation.
    ///
    /// Returns `false` if the user did not confirm. The first list entry with
    /// this name is removed once the remote delete succeeds.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        self.require(Permission::Delete)?;
        if !self.notifier.confirm(&format!("Delete {}?", name)).await {
            debug!(name, "delete not confirmed");
            return Ok(false);
        }

        let ok_text = format!("Deleted {}", name);
        let fail_text = format!("Failed to delete {}", name);
        retriable_action(self.notifier.as_ref(), Some(ok_text.as_str()), &fail_text, || {
            let store = self.store.clone();
            let name = name.to_string();
            async move {
                store
                    .remove(&name)
                    .await
                    .map(Completed::new)
                    .map_err(Failed::from)
            }
        })
        .await?;

        let removed = self
            .request(|reply| ControllerCommand::Remove {
                name: name.to_string(),
                reply,
            })
            .await?;
        if !removed {
            debug!(name, "deleted file was not in the list");
        }
        Ok(true)
    }

    /// Fetch a file's content.
    pub async fn download(&self, name: &str) -> Result<Bytes> {
        self.require(Permission::Read)?;
        self.store.download(name).await
    }

    async fn append(&self, entries: Vec<FileEntry>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        self.request(|reply| ControllerCommand::Append { entries, reply })
            .await
    }

    /// Stop the controller and its upload manager.
    pub async fn shutdown(&self) {
        self.uploads.shutdown().await;
        let (tx, rx) = oneshot::channel();
        let _ = self.tx.send(ControllerCommand::Shutdown { reply: tx }).await;
        let _ = rx.await;
    }
}

/// One attempt of a batch upload: upload `to_upload`, record what was stored
/// and keep only the failures for the next attempt.
async fn upload_attempt(
    this: Controller,
    to_upload: Arc<Mutex<Vec<UploadFile>>>,
    uploaded: Arc<Mutex<Vec<FileEntry>>>,
) -> Attempt<UploadBatchResult> {
    let batch_files = lock(&to_upload).clone();
    let attempt = this.uploads.make_uploads(batch_files).await?.join().await?;
    this.append(attempt.uploaded.clone()).await?;
    lock(&uploaded).extend(attempt.uploaded.iter().cloned());

    match attempt.into_result() {
        Ok(attempt) => {
            let message = upload_success_text(&attempt);
            let all = UploadBatchResult {
                uploaded: lock(&uploaded).clone(),
                failed: Vec::new(),
            };
            Ok(Completed::with_message(all, message))
        }
        Err(FileDropError::PartialUpload(attempt)) => {
            let message = format!(
                "Uploaded {} file(s), {} failed",
                attempt.uploaded.len(),
                attempt.failed.len()
            );
            *lock(&to_upload) = attempt.failed.clone();
            let partial = UploadBatchResult {
                uploaded: lock(&uploaded).clone(),
                failed: attempt.failed,
            };
            Err(Failed::with_message(
                FileDropError::PartialUpload(partial),
                message,
            ))
        }
        Err(err) => Err(err.into()),
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn upload_success_text(result: &UploadBatchResult) -> String {
    match result.uploaded.as_slice() {
        [single] => format!("Uploaded {}", single.name),
        entries => format!("Uploaded {} file(s)", entries.len()),
    }
}

impl ControllerActor {
    fn spawn(
        store: Arc<dyn FileStore>,
        notifier: Arc<dyn Notifier>,
    ) -> mpsc::Sender<ControllerCommand> {
        let (tx, rx) = mpsc::channel(64);
        let actor = ControllerActor {
            store,
            notifier,
            tx: tx.downgrade(),
            rx,
            files: Vec::new(),
            files_failed: false,
            refresh_waiters: None,
        };
        tokio::spawn(actor.run());
        tx
    }

    async fn run(mut self) {
        while let Some(cmd) = self.rx.recv().await {
            if self.handle_command(cmd) {
                break;
            }
        }
    }

    fn handle_command(&mut self, cmd: ControllerCommand) -> bool {
        match cmd {
            ControllerCommand::ListState { reply } => {
                let _ = reply.send(self.list_state());
            }
            ControllerCommand::Files { reply } => {
                let _ = reply.send(self.files.clone());
            }
            ControllerCommand::Refresh { reply } => self.refresh(reply),
            ControllerCommand::RefreshDone { result } => self.refresh_done(result),
            ControllerCommand::Append { entries, reply } => {
                self.files.extend(entries);
                let _ = reply.send(());
            }
            ControllerCommand::Remove { name, reply } => {
                let pos = self.files.iter().position(|f| f.name == name);
                if let Some(pos) = pos {
                    self.files.remove(pos);
                }
                let _ = reply.send(pos.is_some());
            }
            ControllerCommand::Shutdown { reply } => {
                let _ = reply.send(());
                return true;
            }
        }
        false
    }

    fn list_state(&self) -> ListState {
        if self.refresh_waiters.is_some() {
            ListState::Loading
        } else if self.files_failed {
            ListState::Failed
        } else if self.files.is_empty() {
            ListState::Empty
        } else {
            ListState::HasData
        }
    }

    fn refresh(&mut self, reply: Option<oneshot::Sender<Result<()>>>) {
        if let Some(waiters) = self.refresh_waiters.as_mut() {
            debug!("joining in-flight refresh");
            waiters.extend(reply);
            return;
        }
        let Some(tx) = self.tx.upgrade() else {
            return;
        };

        self.files_failed = false;
        self.refresh_waiters = Some(reply.into_iter().collect());

        let store = self.store.clone();
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            let result = retriable_action(notifier.as_ref(), None, LIST_UNAVAILABLE, || {
                let store = store.clone();
                async move { store.list().await.map(Completed::new).map_err(Failed::from) }
            })
            .await;
            let _ = tx.send(ControllerCommand::RefreshDone { result }).await;
        });
    }

    fn refresh_done(&mut self, result: Result<Vec<FileEntry>>) {
        let waiters = self.refresh_waiters.take().unwrap_or_default();
        match result {
            Ok(files) => {
                info!(count = files.len(), "file list refreshed");
                self.files = files;
                for waiter in waiters {
                    let _ = waiter.send(Ok(()));
                }
            }
            Err(err) => {
                self.files_failed = true;
                let shared = Arc::new(err);
                for waiter in waiters {
                    let _ = waiter.send(Err(FileDropError::ListUnavailable(shared.clone())));
                }
            }
        }
    }
}
