//! Actor owning the upload task table.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::task::{TaskOutcome, UploadBatchResult, UploadTask};
use crate::error::{FileDropError, Result};
use crate::progress::{ProgressCallback, TransferProgress};
use crate::store::{FileEntry, FileStore, UploadFile};

/// Handle to the upload actor. Cheap to clone.
#[derive(Clone)]
pub struct UploadManager {
    tx: mpsc::Sender<UploadCommand>,
}

/// Aggregate of a batch of concurrently issued uploads.
#[derive(Debug)]
pub struct BatchHandle {
    ids: Vec<u64>,
    waiters: Vec<oneshot::Receiver<TaskOutcome>>,
}

enum UploadCommand {
    Enqueue {
        file: UploadFile,
        reply: oneshot::Sender<u64>,
    },
    Progress {
        id: u64,
        progress: TransferProgress,
    },
    Finished {
        id: u64,
        result: Result<FileEntry>,
    },
    Watch {
        ids: Vec<u64>,
        reply: oneshot::Sender<Result<Vec<oneshot::Receiver<TaskOutcome>>>>,
    },
    Ids {
        reply: oneshot::Sender<Vec<u64>>,
    },
    Task {
        id: u64,
        reply: oneshot::Sender<Option<UploadTask>>,
    },
    Tasks {
        reply: oneshot::Sender<Vec<UploadTask>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

struct TaskEntry {
    task: UploadTask,
    // Content to upload, until the task is terminal.
    payload: Option<UploadFile>,
    outcome: Option<TaskOutcome>,
    waiters: Vec<oneshot::Sender<TaskOutcome>>,
}

struct UploadActor {
    store: Arc<dyn FileStore>,
    tx: mpsc::WeakSender<UploadCommand>,
    rx: mpsc::Receiver<UploadCommand>,
    tasks: BTreeMap<u64, TaskEntry>,
    next_id: u64,
}

impl UploadManager {
    /// Start an upload actor backed by `store`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        UploadActor::spawn(store)
    }

    async fn request<R>(&self, build: impl FnOnce(oneshot::Sender<R>) -> UploadCommand) -> Result<R> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(build(tx))
            .await
            .map_err(|_| FileDropError::ActorStopped)?;
        rx.await.map_err(|_| FileDropError::ActorStopped)
    }

    /// Queue a file and start uploading it immediately.
    ///
    /// Returns the task id; the transfer continues in the background.
    pub async fn enqueue(&self, file: UploadFile) -> Result<u64> {
        self.request(|reply| UploadCommand::Enqueue { file, reply })
            .await
    }

    /// Upload every file concurrently.
    ///
    /// Fails with [`FileDropError::NoFiles`] without issuing any request if
    /// `files` is empty.
    pub async fn make_uploads<I>(&self, files: I) -> Result<BatchHandle>
    where
        I: IntoIterator<Item = UploadFile>,
    {
        let files: Vec<UploadFile> = files.into_iter().collect();
        if files.is_empty() {
            warn!("no files provided to make uploads");
            return Err(FileDropError::NoFiles);
        }

        let mut ids = Vec::with_capacity(files.len());
        for file in files {
            ids.push(self.enqueue(file).await?);
        }
        let waiters = self.watch(ids.clone()).await?;
        Ok(BatchHandle { ids, waiters })
    }

    async fn watch(&self, ids: Vec<u64>) -> Result<Vec<oneshot::Receiver<TaskOutcome>>> {
        self.request(|reply| UploadCommand::Watch { ids, reply })
            .await?
    }

    /// Wait until every named task is terminal.
    ///
    /// Does not re-upload anything; tasks that already finished resolve at once.
    pub async fn fetch(&self, ids: &[u64]) -> Result<Vec<TaskOutcome>> {
        let waiters = self.watch(ids.to_vec()).await?;
        join_outcomes(waiters).await
    }

    /// Wait until every task this manager has seen is terminal.
    pub async fn fetch_all(&self) -> Result<Vec<TaskOutcome>> {
        let ids = self.request(|reply| UploadCommand::Ids { reply }).await?;
        self.fetch(&ids).await
    }

    /// Snapshot of one task.
    pub async fn task(&self, id: u64) -> Result<Option<UploadTask>> {
        self.request(|reply| UploadCommand::Task { id, reply })
            .await
    }

    /// Snapshot of every task, ordered by id.
    pub async fn tasks(&self) -> Result<Vec<UploadTask>> {
        self.request(|reply| UploadCommand::Tasks { reply }).await
    }

    /// Stop the actor. In-flight transfers still run to completion.
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        let _ = self.tx.send(UploadCommand::Shutdown { reply: tx }).await;
        let _ = rx.await;
    }
}

impl BatchHandle {
    /// Ids of the tasks in this batch, in input order.
    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    /// Wait for every task and partition the results.
    ///
    /// A batch with failed files still resolves `Ok`; check
    /// [`UploadBatchResult::is_success`] or use
    /// [`UploadBatchResult::into_result`] for the failure view.
    pub async fn join(self) -> Result<UploadBatchResult> {
        let outcomes = join_outcomes(self.waiters).await?;
        Ok(UploadBatchResult::from_outcomes(outcomes))
    }
}

async fn join_outcomes(waiters: Vec<oneshot::Receiver<TaskOutcome>>) -> Result<Vec<TaskOutcome>> {
    join_all(waiters)
        .await
        .into_iter()
        .map(|res| res.map_err(|_| FileDropError::ActorStopped))
        .collect()
}

impl UploadActor {
    fn spawn(store: Arc<dyn FileStore>) -> UploadManager {
        let (tx, rx) = mpsc::channel(64);
        let actor = UploadActor {
            store,
            tx: tx.downgrade(),
            rx,
            tasks: BTreeMap::new(),
            next_id: 0,
        };
        tokio::spawn(actor.run());
        UploadManager { tx }
    }

    async fn run(mut self) {
        while let Some(cmd) = self.rx.recv().await {
            if self.handle_command(cmd) {
                break;
            }
        }
    }

    fn handle_command(&mut self, cmd: UploadCommand) -> bool {
        match cmd {
            UploadCommand::Enqueue { file, reply } => {
                let id = self.start_upload(file);
                let _ = reply.send(id);
            }
            UploadCommand::Progress { id, progress } => {
                if let Some(entry) = self.tasks.get_mut(&id) {
                    entry.task.record_progress(&progress);
                }
            }
            UploadCommand::Finished { id, result } => self.finish(id, result),
            UploadCommand::Watch { ids, reply } => {
                let _ = reply.send(self.watch(&ids));
            }
            UploadCommand::Ids { reply } => {
                let _ = reply.send(self.tasks.keys().copied().collect());
            }
            UploadCommand::Task { id, reply } => {
                let _ = reply.send(self.tasks.get(&id).map(|e| e.task.clone()));
            }
            UploadCommand::Tasks { reply } => {
                let _ = reply.send(self.tasks.values().map(|e| e.task.clone()).collect());
            }
            UploadCommand::Shutdown { reply } => {
                let _ = reply.send(());
                return true;
            }
        }
        false
    }

    fn start_upload(&mut self, file: UploadFile) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        debug!(id, file = %file.name, "enqueued upload");

        self.tasks.insert(
            id,
            TaskEntry {
                task: UploadTask::new(id, &file),
                payload: Some(file.clone()),
                outcome: None,
                waiters: Vec::new(),
            },
        );

        // The actor is alive while handling this command, so upgrade succeeds.
        let Some(tx) = self.tx.upgrade() else {
            return id;
        };
        let store = self.store.clone();
        tokio::spawn(async move {
            let progress_tx = tx.clone();
            let progress: ProgressCallback = Arc::new(move |p: &TransferProgress| {
                // Dropped reports are superseded by later ones.
                let _ = progress_tx.try_send(UploadCommand::Progress {
                    id,
                    progress: p.clone(),
                });
            });
            let result = store.upload(&file, progress).await;
            let _ = tx.send(UploadCommand::Finished { id, result }).await;
        });
        id
    }

    fn finish(&mut self, id: u64, result: Result<FileEntry>) {
        let Some(entry) = self.tasks.get_mut(&id) else {
            return;
        };
        if !entry.task.finish(result.is_ok()) {
            return;
        }
        let payload = entry.payload.take();
        let outcome = match result {
            Ok(file_entry) => {
                debug!(id, file = %file_entry.name, "upload succeeded");
                TaskOutcome::Uploaded(file_entry)
            }
            Err(err) => {
                warn!(id, file = %entry.task.name, error = %err, "upload failed");
                let file = payload
                    .unwrap_or_else(|| UploadFile::new(entry.task.name.as_str(), Bytes::new()));
                TaskOutcome::Failed {
                    file,
                    error: Arc::new(err),
                }
            }
        };
        for waiter in entry.waiters.drain(..) {
            let _ = waiter.send(outcome.clone());
        }
        entry.outcome = Some(outcome);
    }

    fn watch(&mut self, ids: &[u64]) -> Result<Vec<oneshot::Receiver<TaskOutcome>>> {
        if let Some(missing) = ids.iter().find(|id| !self.tasks.contains_key(id)) {
            return Err(FileDropError::UnknownTask(*missing));
        }
        let mut receivers = Vec::with_capacity(ids.len());
        for id in ids {
            let (tx, rx) = oneshot::channel();
            if let Some(entry) = self.tasks.get_mut(id) {
                match &entry.outcome {
                    Some(outcome) => {
                        let _ = tx.send(outcome.clone());
                    }
                    None => entry.waiters.push(tx),
                }
            }
            receivers.push(rx);
        }
        Ok(receivers)
    }
}
