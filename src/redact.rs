//! Credential redaction applied before anything reaches disk.

use serde_json::Value;

use crate::types::ChatDatabase;

/// Marker written in place of a detected secret value.
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Metadata keys treated as credential-shaped. Exact match, top level only.
/// New secret-shaped fields must be added here or they reach disk unredacted.
const SECRET_KEYS: [&str; 4] = ["apiKey", "token", "password", "secret"];

/// Return a deep copy of `database` with every credential-shaped `meta`
/// value replaced by [`REDACTION_MARKER`].
///
/// The input is never mutated, so callers keep their unredacted in-memory
/// state after a save.
pub fn redact_secrets(database: &ChatDatabase) -> ChatDatabase {
    let mut copy = database.clone();
    for conversation in &mut copy.conversations {
        for message in &mut conversation.messages {
            for key in SECRET_KEYS {
                if let Some(value) = message.meta.get_mut(key) {
                    *value = Value::String(REDACTION_MARKER.to_string());
                }
            }
        }
    }
    copy
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{role, ChatDatabase, Conversation, Message, MessageDraft};
    use serde_json::{json, Map};

    fn database_with_meta(meta: Map<String, Value>) -> ChatDatabase {
        let mut conversation = Conversation::new("Test");
        conversation
            .messages
            .push(Message::from_draft(
                MessageDraft::new(role::ASSISTANT, "Hi").with_meta(meta),
            ));
        ChatDatabase {
            conversations: vec![conversation],
            ..ChatDatabase::default()
        }
    }

    fn meta_of(db: &ChatDatabase) -> &Map<String, Value> {
        &db.conversations[0].messages[0].meta
    }

    #[test]
    fn redacts_every_known_secret_key() {
        let mut meta = Map::new();
        meta.insert("apiKey".to_string(), json!("sk-123"));
        meta.insert("token".to_string(), json!("tok-456"));
        meta.insert("password".to_string(), json!("hunter2"));
        meta.insert("secret".to_string(), json!("s3cr3t"));
        let db = database_with_meta(meta);

        let redacted = redact_secrets(&db);

        for key in ["apiKey", "token", "password", "secret"] {
            assert_eq!(meta_of(&redacted)[key], REDACTION_MARKER);
        }
    }

    #[test]
    fn input_is_never_mutated() {
        let mut meta = Map::new();
        meta.insert("apiKey".to_string(), json!("sk-123"));
        let db = database_with_meta(meta);

        let _ = redact_secrets(&db);

        assert_eq!(meta_of(&db)["apiKey"], "sk-123");
    }

    #[test]
    fn unknown_meta_keys_pass_through_verbatim() {
        let mut meta = Map::new();
        meta.insert("provider".to_string(), json!("acme"));
        meta.insert("tokensUsed".to_string(), json!(128));
        meta.insert("apiKey".to_string(), json!("sk-123"));
        let db = database_with_meta(meta);

        let redacted = redact_secrets(&db);

        assert_eq!(meta_of(&redacted)["provider"], "acme");
        assert_eq!(meta_of(&redacted)["tokensUsed"], 128);
        assert_eq!(meta_of(&redacted)["apiKey"], REDACTION_MARKER);
    }

    #[test]
    fn messages_without_meta_are_untouched() {
        let db = database_with_meta(Map::new());

        let redacted = redact_secrets(&db);

        assert_eq!(redacted, db);
    }

    #[test]
    fn non_string_secret_values_are_still_redacted() {
        let mut meta = Map::new();
        meta.insert("token".to_string(), json!({ "value": "tok-456" }));
        let db = database_with_meta(meta);

        let redacted = redact_secrets(&db);

        assert_eq!(meta_of(&redacted)["token"], REDACTION_MARKER);
    }
}
