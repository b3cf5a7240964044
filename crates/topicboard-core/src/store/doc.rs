//! Document mapping between stored JSON and the domain types.
//!
//! Stored documents keep the historical snake_case shape. Decoding accepts
//! the legacy field spellings that older deployments wrote
//! (`userlist_message_id`, a scalar `message_id` instead of a `messages`
//! array, camelCase topic author fields) and flags the board dirty so the
//! next flush rewrites the canonical shape.

use serde_json::{json, Value};

use crate::models::{Board, MessageSlot, Topic};

/// First non-empty value among `keys`, stringified. Legacy documents stored
/// some ids as numbers.
fn str_field(raw: &Value, keys: &[&str]) -> String {
    for key in keys {
        match raw.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return s.clone(),
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }
    }
    String::new()
}

fn count_field(raw: &Value) -> usize {
    raw.get("count").and_then(Value::as_u64).unwrap_or(0) as usize
}

/// Decode a board document. Returns `None` for a non-object value.
pub fn board_from_doc(raw: &Value) -> Option<Board> {
    if !raw.is_object() {
        return None;
    }

    let contributors_message_id = str_field(raw, &["contributors_message_id", "userlist_message_id"]);
    let had_legacy_contributors = raw.get("contributors_message_id").is_none()
        && raw
            .get("userlist_message_id")
            .is_some_and(|v| !v.is_null());

    let mut messages = Vec::new();
    let mut registry_dirty = had_legacy_contributors;

    match raw.get("messages") {
        Some(Value::Array(entries)) if !entries.is_empty() => {
            for entry in entries {
                let message_id = str_field(entry, &["message_id"]);
                if message_id.is_empty() {
                    continue;
                }
                messages.push(MessageSlot {
                    message_id,
                    count: count_field(entry),
                });
            }
        }
        _ => {
            // Legacy single-message shape: a scalar message_id on the board.
            let legacy_id = str_field(raw, &["message_id"]);
            if !legacy_id.is_empty() {
                messages.push(MessageSlot::new(legacy_id));
                registry_dirty = true;
            }
        }
    }

    Some(Board {
        channel_id: str_field(raw, &["channel_id"]),
        welcome_message_id: str_field(raw, &["welcome_message_id"]),
        header_message_id: str_field(raw, &["board_header_message_id"]),
        contributors_message_id,
        notification_message_id: str_field(raw, &["notification_message_id"]),
        messages,
        registry_dirty,
    })
}

pub fn board_to_doc(guild_id: u64, board: &Board) -> Value {
    json!({
        "guild_id": guild_id.to_string(),
        "channel_id": board.channel_id,
        "welcome_message_id": board.welcome_message_id,
        "board_header_message_id": board.header_message_id,
        "contributors_message_id": board.contributors_message_id,
        "notification_message_id": board.notification_message_id,
        "messages": board
            .messages
            .iter()
            .map(|m| json!({ "message_id": m.message_id, "count": m.count }))
            .collect::<Vec<_>>(),
    })
}

/// Decode a topic document. Documents without an id are unusable and yield
/// `None`; callers skip them.
pub fn topic_from_doc(raw: &Value) -> Option<Topic> {
    let id = str_field(raw, &["topic_id", "id"]);
    if id.is_empty() {
        return None;
    }
    Some(Topic {
        id,
        emoji: str_field(raw, &["emoji"]),
        text: str_field(raw, &["text"]),
        author_id: str_field(raw, &["author_id", "authorId"]),
        author_name: str_field(raw, &["author_name", "authorName"]),
        message_id: str_field(raw, &["message_id"]),
    })
}

pub fn topic_to_doc(guild_id: u64, channel_id: u64, topic: &Topic) -> Value {
    json!({
        "topic_id": topic.id,
        "guild_id": guild_id.to_string(),
        "channel_id": channel_id.to_string(),
        "emoji": topic.emoji,
        "text": topic.text,
        "author_id": topic.author_id,
        "author_name": topic.author_name,
        "message_id": topic.message_id,
    })
}

/// Topic id of a raw document, used by backends that key rows by it.
pub fn topic_id_of(doc: &Value) -> Option<String> {
    let id = str_field(doc, &["topic_id", "id"]);
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}
