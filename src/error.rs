use thiserror::Error;

/// Errors surfaced by the conversation store and its components.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The conversation id does not exist in the loaded database.
    /// A caller/UI-level error, not a storage fault.
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    /// IO error (directory creation, temp-file write, rename, ...).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The per-user application-data directory could not be determined.
    #[error("User data directory unavailable: {0} is not set")]
    DataDirUnset(&'static str),

    /// The write queue shut down before the job completed.
    #[error("Write queue closed before the job completed")]
    WriteQueueClosed,

    /// A background filesystem task panicked or was cancelled.
    #[error("Background write task failed: {0}")]
    WriteTask(String),
}
