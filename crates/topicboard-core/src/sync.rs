//! Per-guild state synchronization.
//!
//! Every read or mutation of a guild's board and topic list runs inside a
//! session: acquire the guild lock, load and normalize state, hand the
//! aggregate to a unit of work, flush dirty parts exactly once on the way
//! out. Sessions for one guild are totally ordered by lock acquisition;
//! sessions for different guilds run fully concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::config::MAX_TOPICS_PER_MESSAGE;
use crate::error::BoardError;
use crate::models::{Board, GuildTopicState, MessageSlot, Topic};
use crate::store::{doc, BoardStore};

/// Per-guild lock table. Grows lazily, one entry per guild ever seen, never
/// shrinks; acceptable for bot-scale guild counts.
#[derive(Default)]
pub struct LockRegistry {
    locks: parking_lot::Mutex<HashMap<u64, Arc<tokio::sync::Mutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn guild_lock(&self, guild_id: u64) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .entry(guild_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

/// The synchronization core: serializes sessions per guild against the
/// persistence adapter.
pub struct TopicSync {
    store: Arc<dyn BoardStore>,
    locks: LockRegistry,
}

impl TopicSync {
    pub fn new(store: Arc<dyn BoardStore>) -> Self {
        Self {
            store,
            locks: LockRegistry::new(),
        }
    }

    pub fn with_registry(store: Arc<dyn BoardStore>, locks: LockRegistry) -> Self {
        Self { store, locks }
    }

    /// Run `work` inside a locked session for the guild channel.
    ///
    /// The flush runs exactly once after the unit of work, whether it
    /// returned Ok or Err; a store failure during the flush supersedes the
    /// work's result and the in-memory state is discarded (the next session
    /// reloads from the store). If the enclosing task is cancelled the lock
    /// is released by the guard and nothing is flushed.
    pub async fn with_locked_state<T, F>(
        &self,
        guild_id: u64,
        channel_id: u64,
        work: F,
    ) -> Result<T, BoardError>
    where
        F: for<'a> FnOnce(&'a mut GuildTopicState) -> BoxFuture<'a, Result<T, BoardError>>,
    {
        let lock = self.locks.guild_lock(guild_id);
        let _guard = lock.lock().await;

        let mut state = self.load_state(guild_id, channel_id).await?;
        let result = work(&mut state).await;
        self.save_state(&mut state).await?;
        result
    }

    /// Load and normalize state without taking the guild lock.
    ///
    /// For read-mostly callers that tolerate a narrow race (autocomplete).
    /// Mutating callers must go through [`with_locked_state`].
    ///
    /// [`with_locked_state`]: TopicSync::with_locked_state
    pub async fn load_state(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<GuildTopicState, BoardError> {
        let raw = self.store.fetch_board(guild_id, channel_id).await?;
        let entry = raw.as_ref().and_then(doc::board_from_doc);
        let topics: Vec<Topic> = if entry.is_some() {
            self.store
                .list_topics(guild_id, channel_id)
                .await?
                .iter()
                .filter_map(doc::topic_from_doc)
                .collect()
        } else {
            Vec::new()
        };

        let (entry, topics, registry_dirty, topics_dirty) = normalize(entry, topics);
        if registry_dirty || topics_dirty {
            tracing::debug!(
                guild_id,
                channel_id,
                registry_dirty,
                topics_dirty,
                "normalization repaired loaded state"
            );
        }
        Ok(GuildTopicState {
            guild_id,
            channel_id,
            entry,
            topics,
            registry_dirty,
            topics_dirty,
        })
    }

    /// Persist registry and topics if marked dirty, clearing the flags.
    pub async fn save_state(&self, state: &mut GuildTopicState) -> Result<(), BoardError> {
        let registry_dirty =
            state.registry_dirty || state.entry.as_ref().is_some_and(|b| b.registry_dirty);
        if registry_dirty {
            match &state.entry {
                Some(board) => {
                    let payload = doc::board_to_doc(state.guild_id, board);
                    self.store
                        .upsert_board(state.guild_id, state.channel_id, payload)
                        .await?;
                }
                None => {
                    self.store
                        .delete_board(state.guild_id, state.channel_id)
                        .await?;
                }
            }
            state.registry_dirty = false;
            if let Some(board) = &mut state.entry {
                board.registry_dirty = false;
            }
        }

        if state.topics_dirty {
            let docs = state
                .topics
                .iter()
                .map(|t| doc::topic_to_doc(state.guild_id, state.channel_id, t))
                .collect();
            self.store
                .replace_topics(state.guild_id, state.channel_id, docs)
                .await?;
            state.topics_dirty = false;
        }
        Ok(())
    }
}

/// Reconcile cross-references and cached counts after a load.
///
/// Topics pointing at an unknown or empty slot are reassigned to the first
/// slot; every slot count is recomputed from actual membership. Idempotent:
/// a second pass over the output reports no further changes.
pub fn normalize(
    entry: Option<Board>,
    mut topics: Vec<Topic>,
) -> (Option<Board>, Vec<Topic>, bool, bool) {
    let Some(mut board) = entry else {
        return (None, topics, false, false);
    };

    let mut registry_changed = board.registry_dirty;
    let mut topics_changed = false;

    if !board.messages.is_empty() {
        let primary_id = board.messages[0].message_id.clone();
        let mut counts: HashMap<String, usize> = board
            .messages
            .iter()
            .map(|m| (m.message_id.clone(), 0))
            .collect();

        for topic in &mut topics {
            if topic.message_id.is_empty() || !counts.contains_key(&topic.message_id) {
                topic.message_id = primary_id.clone();
                topics_changed = true;
            }
            *counts.entry(topic.message_id.clone()).or_insert(0) += 1;
        }

        for slot in &mut board.messages {
            let new_count = counts.get(&slot.message_id).copied().unwrap_or(0);
            if slot.count != new_count {
                slot.count = new_count;
                registry_changed = true;
            }
        }
    }

    (Some(board), topics, registry_changed, topics_changed)
}

/// Oldest slot that still has capacity, or `None` when all are full and the
/// caller must create a new board message.
pub fn find_first_available_slot(board: &Board) -> Option<&MessageSlot> {
    board
        .messages
        .iter()
        .find(|m| m.count < MAX_TOPICS_PER_MESSAGE)
}

/// Append a brand-new board message slot to the registry entry.
pub fn register_slot(board: &mut Board, message_id: &str) -> MessageSlot {
    let slot = MessageSlot::new(message_id);
    board.messages.push(slot.clone());
    board.registry_dirty = true;
    slot
}

/// Append a topic to the in-memory state and bump the target slot's count.
/// The caller is responsible for the duplicate-emoji guard ([`has_emoji`]).
pub fn add_topic(
    state: &mut GuildTopicState,
    emoji: &str,
    text: &str,
    author_id: &str,
    author_name: &str,
    message_id: &str,
) -> Topic {
    let topic = Topic {
        id: Uuid::new_v4().simple().to_string(),
        emoji: emoji.to_string(),
        text: text.to_string(),
        author_id: author_id.to_string(),
        author_name: author_name.to_string(),
        message_id: message_id.to_string(),
    };
    state.topics.push(topic.clone());
    state.topics_dirty = true;

    if let Some(board) = &mut state.entry {
        if let Some(slot) = board.slot_mut(message_id) {
            slot.count += 1;
            state.registry_dirty = true;
        }
    }
    topic
}

/// Remove a topic by id, adjusting counts. `None` when no such topic exists;
/// state and dirty flags are untouched in that case.
pub fn remove_topic(state: &mut GuildTopicState, topic_id: &str) -> Option<Topic> {
    let index = state.topics.iter().position(|t| t.id == topic_id)?;
    let removed = state.topics.remove(index);
    state.topics_dirty = true;

    if let Some(board) = &mut state.entry {
        if let Some(slot) = board.slot_mut(&removed.message_id) {
            slot.count = slot.count.saturating_sub(1);
            state.registry_dirty = true;
        }
    }
    Some(removed)
}

/// Exact-match uniqueness guard over the guild's current topics.
pub fn has_emoji(state: &GuildTopicState, emoji: &str) -> bool {
    state.topics.iter().any(|t| t.emoji == emoji)
}

/// Construct the registry entry for a freshly initialized board.
pub fn create_board(
    channel_id: u64,
    welcome_message_id: &str,
    header_message_id: &str,
    contributors_message_id: &str,
    topics_message_id: &str,
) -> Board {
    Board {
        channel_id: channel_id.to_string(),
        welcome_message_id: welcome_message_id.to_string(),
        header_message_id: header_message_id.to_string(),
        contributors_message_id: contributors_message_id.to_string(),
        notification_message_id: String::new(),
        messages: vec![MessageSlot::new(topics_message_id)],
        registry_dirty: true,
    }
}
