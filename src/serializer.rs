//! FIFO serialization of writes to the active file.
//!
//! Every mutation of the active file — saves, rotation, clear — flows
//! through one queue with a single pump task, so at most one physical write
//! is in flight at any time and two callers' temp-file lifecycles never
//! interleave. Jobs complete strictly in submission order; there is no
//! priority and no cancellation.
//!
//! This is last-writer-wins at the snapshot level: the Nth successful save
//! persists exactly the document the Nth caller submitted. Callers needing
//! merge semantics must re-load before mutating.

use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};

use crate::atomic::write_json_atomic;
use crate::error::StoreError;
use crate::paths::StorePaths;
use crate::redact::redact_secrets;
use crate::rotation;
use crate::types::ChatDatabase;

enum Job {
    Save {
        database: ChatDatabase,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    Rotate {
        max_bytes: u64,
        reply: oneshot::Sender<Result<bool, StoreError>>,
    },
    Clear {
        reply: oneshot::Sender<Result<Option<PathBuf>, StoreError>>,
    },
}

/// Per-store write queue. Constructed once per [`crate::ConversationStore`]
/// instance; dropping it shuts the pump down after the queue drains.
pub struct WriteSerializer {
    queue: mpsc::UnboundedSender<Job>,
}

/// Handle to a submitted save; awaits the pump's completion reply.
pub struct SaveTicket {
    rx: oneshot::Receiver<Result<(), StoreError>>,
}

impl SaveTicket {
    pub async fn wait(self) -> Result<(), StoreError> {
        self.rx.await.map_err(|_| StoreError::WriteQueueClosed)?
    }
}

impl WriteSerializer {
    /// Spawn the pump task for the given layout.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(paths: StorePaths) -> Self {
        let (queue, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_pump(paths, rx));
        Self { queue }
    }

    /// Enqueue a save without awaiting it.
    ///
    /// Submission is synchronous, so the call order defines the
    /// serialization order: a caller holding a lock on the document can
    /// submit its snapshot before releasing the lock, guaranteeing that
    /// snapshots reach the queue in mutation order.
    pub fn submit(&self, database: ChatDatabase) -> Result<SaveTicket, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.queue
            .send(Job::Save { database, reply })
            .map_err(|_| StoreError::WriteQueueClosed)?;
        Ok(SaveTicket { rx })
    }

    /// Persist a snapshot: ensure dirs, redact secrets, write atomically.
    pub async fn save(&self, database: ChatDatabase) -> Result<(), StoreError> {
        self.submit(database)?.wait().await
    }

    /// Run the rotation check behind the queue. Returns true iff rotated.
    pub async fn rotate(&self, max_bytes: u64) -> Result<bool, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.queue
            .send(Job::Rotate { max_bytes, reply })
            .map_err(|_| StoreError::WriteQueueClosed)?;
        rx.await.map_err(|_| StoreError::WriteQueueClosed)?
    }

    /// Back up then reset the active file, behind the queue.
    pub async fn clear(&self) -> Result<Option<PathBuf>, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.queue
            .send(Job::Clear { reply })
            .map_err(|_| StoreError::WriteQueueClosed)?;
        rx.await.map_err(|_| StoreError::WriteQueueClosed)?
    }
}

/// Dequeue one job at a time and run it to completion before the next.
async fn run_pump(paths: StorePaths, mut queue: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = queue.recv().await {
        let paths = paths.clone();
        match job {
            Job::Save { database, reply } => {
                let result = run_blocking(move || {
                    paths.ensure_dirs()?;
                    let redacted = redact_secrets(&database);
                    write_json_atomic(&paths.active_file, &redacted)
                })
                .await;
                if let Err(err) = &result {
                    log::warn!("save failed: {err}");
                }
                let _ = reply.send(result);
            }
            Job::Rotate { max_bytes, reply } => {
                let result =
                    run_blocking(move || rotation::rotate_if_needed(&paths, max_bytes)).await;
                let _ = reply.send(result);
            }
            Job::Clear { reply } => {
                let result = run_blocking(move || rotation::clear_with_backup(&paths)).await;
                let _ = reply.send(result);
            }
        }
    }
}

async fn run_blocking<T, F>(work: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(err) => Err(StoreError::WriteTask(err.to_string())),
    }
}

// ============================================================================
// TESTS
// ============================================================================
