//! Persisted data types.
//!
//! # Data Model Overview
//!
//! The store persists a single JSON document, the [`ChatDatabase`]:
//!
//! ```text
//! chat_history.json
//! └── conversations[]          # insertion order, never resorted
//!     └── messages[]           # append-only
//! ```
//!
//! # Design Principles
//!
//! - **Append-only**: conversations grow by message append; messages are
//!   never reordered or edited after append.
//! - **Open metadata**: `Message.meta` is an open key/value map so provider
//!   code can attach token counts, latency, context snapshots, etc.
//! - **camelCase on disk**: field names match the panel's JSON conventions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Current on-disk format version.
pub const DB_VERSION: u32 = 1;

/// Well-known message roles. The set is open; any string is accepted.
pub mod role {
    pub const USER: &str = "user";
    pub const ASSISTANT: &str = "assistant";
    pub const SYSTEM: &str = "system";
}

/// The root persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatDatabase {
    /// Format version tag, currently [`DB_VERSION`].
    pub version: u32,

    /// All conversations, in insertion order.
    pub conversations: Vec<Conversation>,
}

impl Default for ChatDatabase {
    fn default() -> Self {
        Self {
            version: DB_VERSION,
            conversations: Vec::new(),
        }
    }
}

/// A single conversation with its full message history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Globally unique identifier, immutable once created.
    pub id: String,

    /// User-visible label, mutable.
    pub title: String,

    /// When this conversation was created.
    pub created_at: DateTime<Utc>,

    /// Advances on every message append.
    pub updated_at: DateTime<Utc>,

    /// All messages, append-only.
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation with a fresh id and current timestamps.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique within its conversation.
    pub id: String,

    /// Message role: "user", "assistant", "system", or any future value.
    pub role: String,

    /// Message text content.
    pub text: String,

    /// Open metadata map: provider name, token counts, latency, etc.
    /// Credential-shaped keys are redacted before reaching disk.
    #[serde(default)]
    pub meta: Map<String, Value>,

    /// Set at append time.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Materialize a draft: allocate the id and timestamp.
    pub(crate) fn from_draft(draft: MessageDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: draft.role,
            text: draft.text,
            meta: draft.meta,
            timestamp: Utc::now(),
        }
    }
}

/// Input to `append_message`: a message without id or timestamp.
#[derive(Debug, Clone, Default)]
pub struct MessageDraft {
    pub role: String,
    pub text: String,
    pub meta: Map<String, Value>,
}

impl MessageDraft {
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            text: text.into(),
            meta: Map::new(),
        }
    }

    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = meta;
        self
    }
}

/// Conversation metadata plus message count, without message bodies.
///
/// Keeps listing cheap for the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
}

impl ConversationSummary {
    pub fn of(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id.clone(),
            title: conversation.title.clone(),
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
            message_count: conversation.messages.len(),
        }
    }
}

/// On-disk footprint of the store, for operational tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    /// Size of the active file in bytes (0 if absent).
    pub active_file_bytes: u64,

    /// Number of archive/backup files next to the active file.
    pub archive_count: usize,

    /// Aggregate size of all archive/backup files.
    pub archive_bytes: u64,
}

// ============================================================================
// TESTS
// ============================================================================
