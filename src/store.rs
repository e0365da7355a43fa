//! The conversation store public API.
//!
//! # Overview
//!
//! [`ConversationStore`] owns the in-memory snapshot of the chat database
//! and orchestrates the other components: every active-file mutation is
//! delegated to the [`WriteSerializer`], reads degrade to the empty database
//! rather than failing, and the rotation check runs after each save.
//!
//! # Concurrency
//!
//! The snapshot lives behind a tokio `Mutex`; operations are last-writer-
//! wins at the snapshot level. `save_chat` with an externally mutated
//! snapshot fully replaces the persisted document — callers needing merge
//! semantics must re-load before mutating.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::atomic::write_json_atomic;
use crate::error::StoreError;
use crate::paths::StorePaths;
use crate::rotation::DEFAULT_MAX_ACTIVE_BYTES;
use crate::serializer::WriteSerializer;
use crate::types::{
    ChatDatabase, Conversation, ConversationSummary, Message, MessageDraft, StorageStats,
};

/// Title used when `create_conversation` is called without one.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Persistent, crash-safe store for chat conversations.
pub struct ConversationStore {
    paths: StorePaths,
    serializer: WriteSerializer,
    max_active_bytes: u64,
    database: Mutex<ChatDatabase>,
}

impl ConversationStore {
    /// Open a store over the given layout with the default rotation
    /// threshold. Loads the active file, degrading to the empty database if
    /// it is absent or unreadable.
    pub async fn open(paths: StorePaths) -> Self {
        Self::open_with_max_bytes(paths, DEFAULT_MAX_ACTIVE_BYTES).await
    }

    /// Open with a custom rotation threshold.
    pub async fn open_with_max_bytes(paths: StorePaths, max_active_bytes: u64) -> Self {
        let database = read_database(&paths).await;
        Self {
            serializer: WriteSerializer::new(paths.clone()),
            paths,
            max_active_bytes,
            database: Mutex::new(database),
        }
    }

    /// Re-read the active file and replace the in-memory snapshot.
    ///
    /// Never fails: an absent, unreadable, or structurally invalid file
    /// yields a fresh empty database — the panel always has usable history.
    pub async fn load_chat(&self) -> ChatDatabase {
        let database = read_database(&self.paths).await;
        *self.database.lock().await = database.clone();
        database
    }

    /// Persist a caller-mutated snapshot, then consult rotation.
    pub async fn save_chat(&self, database: ChatDatabase) -> Result<(), StoreError> {
        let ticket = {
            let mut current = self.database.lock().await;
            *current = database;
            self.serializer.submit(current.clone())?
        };
        ticket.wait().await?;
        self.rotate_and_sync().await
    }

    /// Create an empty conversation and persist it. Returns the new id.
    pub async fn create_conversation(&self, title: Option<&str>) -> Result<String, StoreError> {
        let (id, ticket) = {
            let mut database = self.database.lock().await;
            let conversation = Conversation::new(title.unwrap_or(DEFAULT_TITLE));
            let id = conversation.id.clone();
            database.conversations.push(conversation);
            (id, self.serializer.submit(database.clone())?)
        };
        ticket.wait().await?;
        Ok(id)
    }

    /// Append a message to a conversation, persist, then consult rotation.
    ///
    /// Returns the constructed message with id and timestamp filled in, or
    /// [`StoreError::ConversationNotFound`] if the id is not in the loaded
    /// database. A rotation failure propagates but never rolls back the
    /// append: the message is already on disk by the time rotation runs.
    pub async fn append_message(
        &self,
        conversation_id: &str,
        draft: MessageDraft,
    ) -> Result<Message, StoreError> {
        let (message, ticket) = {
            let mut database = self.database.lock().await;
            let conversation = database
                .conversations
                .iter_mut()
                .find(|c| c.id == conversation_id)
                .ok_or_else(|| StoreError::ConversationNotFound(conversation_id.to_string()))?;

            let message = Message::from_draft(draft);
            conversation.updated_at = message.timestamp;
            conversation.messages.push(message.clone());
            // Submit while holding the lock so snapshots reach the queue
            // in mutation order.
            (message, self.serializer.submit(database.clone())?)
        };

        ticket.wait().await?;

        // The append is on disk by now; a rotation failure propagates
        // without rolling it back.
        self.rotate_and_sync().await?;
        Ok(message)
    }

    /// Run the rotation check; when the active file was archived and
    /// reset, the in-memory snapshot is reset to match so the archived
    /// conversations are not re-persisted by the next save.
    async fn rotate_and_sync(&self) -> Result<(), StoreError> {
        if self.serializer.rotate(self.max_active_bytes).await? {
            *self.database.lock().await = ChatDatabase::default();
        }
        Ok(())
    }

    /// Snapshot view of one conversation.
    pub async fn get_conversation(&self, conversation_id: &str) -> Option<Conversation> {
        self.database
            .lock()
            .await
            .conversations
            .iter()
            .find(|c| c.id == conversation_id)
            .cloned()
    }

    /// Metadata plus message count for every conversation, no bodies.
    pub async fn get_conversation_list(&self) -> Vec<ConversationSummary> {
        self.database
            .lock()
            .await
            .conversations
            .iter()
            .map(ConversationSummary::of)
            .collect()
    }

    /// Back up the active file under a timestamped name, then reset it to
    /// the empty database. Returns the backup path, if a file existed.
    pub async fn clear_all(&self) -> Result<Option<PathBuf>, StoreError> {
        let backup = self.serializer.clear().await?;
        *self.database.lock().await = ChatDatabase::default();
        Ok(backup)
    }

    /// Write the in-memory database verbatim to a caller-chosen path.
    ///
    /// Export is an explicit user action on already-loaded data, so
    /// would-be-redacted metadata is included.
    pub async fn export_to_file(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot = self.database.lock().await.clone();
        let path = path.to_path_buf();
        run_blocking(move || write_json_atomic(&path, &snapshot)).await
    }

    /// Active-file size plus archive count and aggregate archive bytes.
    pub async fn get_storage_stats(&self) -> Result<StorageStats, StoreError> {
        let paths = self.paths.clone();
        run_blocking(move || scan_storage(&paths)).await
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

async fn read_database(paths: &StorePaths) -> ChatDatabase {
    let active_file = paths.active_file.clone();
    tokio::task::spawn_blocking(move || load_database(&active_file))
        .await
        .unwrap_or_default()
}

fn load_database(active_file: &Path) -> ChatDatabase {
    let contents = match fs::read_to_string(active_file) {
        Ok(contents) => contents,
        Err(_) => return ChatDatabase::default(),
    };
    match serde_json::from_str(&contents) {
        Ok(database) => database,
        Err(err) => {
            log::warn!("active history file is not valid JSON, starting empty: {err}");
            ChatDatabase::default()
        }
    }
}

fn scan_storage(paths: &StorePaths) -> Result<StorageStats, StoreError> {
    let active_file_bytes = match fs::metadata(&paths.active_file) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == ErrorKind::NotFound => 0,
        Err(err) => return Err(err.into()),
    };

    let mut archive_count = 0;
    let mut archive_bytes = 0;
    if paths.logs_dir.is_dir() {
        for entry in fs::read_dir(&paths.logs_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if is_archive_name(&name.to_string_lossy()) {
                archive_count += 1;
                archive_bytes += entry.metadata()?.len();
            }
        }
    }

    Ok(StorageStats {
        active_file_bytes,
        archive_count,
        archive_bytes,
    })
}

/// `chat_history.<anything>.json` siblings of the active file. Excludes the
/// active file itself and `.tmp` artifacts.
fn is_archive_name(name: &str) -> bool {
    name.starts_with("chat_history.") && name.ends_with(".json") && name != "chat_history.json"
}

// ============================================================================
// TESTS
// ============================================================================
