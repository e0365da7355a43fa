//! # chatvault
//!
//! Crash-safe persistent conversation store for a chat panel: an
//! append-only JSON history of chat sessions that survives crashes
//! mid-write, never leaks credentials into its persisted form, serializes
//! concurrent writers, and self-rotates before growing unbounded.
//!
//! ## Key Concepts
//!
//! - **Active file**: the single JSON file currently accepting new
//!   conversations and messages.
//! - **Atomic writes**: write to a temp file, then rename — a reader sees
//!   either the old or the new complete document, never a partial one.
//! - **Redaction**: credential-shaped metadata is replaced with a fixed
//!   marker before anything reaches disk; in-memory state is untouched.
//! - **Write serialization**: one FIFO queue per store instance; at most
//!   one physical write to the active file is in flight at a time.
//! - **Rotation**: oversized active files are archived under timestamped
//!   names and replaced with an empty database.
//!
//! ## Example
//!
//! ```no_run
//! use chatvault::{ConversationStore, MessageDraft, Platform, StorePaths};
//!
//! # async fn demo() -> Result<(), chatvault::StoreError> {
//! let paths = StorePaths::resolve(Platform::current())?;
//! let store = ConversationStore::open(paths).await;
//!
//! let id = store.create_conversation(Some("Demo")).await?;
//! store
//!     .append_message(&id, MessageDraft::new("user", "Hello"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod atomic;
pub mod error;
pub mod paths;
pub mod redact;
pub mod rotation;
pub mod serializer;
pub mod store;
pub mod types;

// Re-export the public surface consumed by the panel UI.
pub use error::StoreError;
pub use paths::{Platform, StorePaths};
pub use redact::{redact_secrets, REDACTION_MARKER};
pub use rotation::DEFAULT_MAX_ACTIVE_BYTES;
pub use serializer::{SaveTicket, WriteSerializer};
pub use store::{ConversationStore, DEFAULT_TITLE};
pub use types::{
    ChatDatabase, Conversation, ConversationSummary, Message, MessageDraft, StorageStats,
    DB_VERSION,
};
