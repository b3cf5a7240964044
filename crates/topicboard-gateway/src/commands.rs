//! Command orchestration: translates interaction events into locked state
//! sessions, then applies the resulting render plan to the live messages.
//!
//! Chat-client failures during rendering and cleanup are soft — logged and
//! swallowed. Store failures during a session's commit are not: the caller
//! is told the change did not durably complete.

use std::collections::HashSet;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use topicboard_core::config;
use topicboard_core::render;
use topicboard_core::sync as service;
use topicboard_core::sync::TopicSync;
use topicboard_core::BoardError;

use crate::discord::{ChatClient, ChatError};

/// The member invoking a command, as resolved by the interaction layer.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: u64,
    pub display_name: String,
    /// Manage Server permission; grants init/remove and removal of any topic.
    pub can_manage: bool,
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub name: String,
    pub value: String,
}

const MAX_AUTOCOMPLETE_CHOICES: usize = 25;
const MAX_CHOICE_NAME_CHARS: usize = 100;

enum AddOutcome {
    NotInitialized,
    Duplicate,
    ChannelInaccessible,
    Added { target: String },
}

enum RemoveOutcome {
    NotInitialized,
    NotFound,
    NotAllowed,
    Removed { message_id: String, emoji: String },
}

enum RemoveBoardsOutcome {
    NotInitialized,
    WrongChannel,
    Removed,
}

/// A single emoji grapheme, no surrounding whitespace, not plain ASCII.
/// The platform validates actual emoji-ness on its end.
fn valid_single_emoji(emoji: &str) -> bool {
    if emoji.is_empty() || emoji.trim() != emoji {
        return false;
    }
    let mut graphemes = emoji.graphemes(true);
    let Some(first) = graphemes.next() else {
        return false;
    };
    if graphemes.next().is_some() {
        return false;
    }
    !first.chars().all(|c| c.is_ascii())
}

fn reply_for_error(err: &BoardError) -> &'static str {
    match err {
        BoardError::EmojiInUse => config::EMOJI_ALREADY_USED,
        BoardError::TopicNotFound => config::TOPIC_NOT_FOUND,
        BoardError::BoardNotFound => config::SERVER_NOT_INITIALIZED,
        BoardError::PermissionDenied => config::MANAGE_SERVER_REQUIRED,
        BoardError::Store(_) => config::OPERATION_NOT_SAVED,
    }
}

pub struct Commands {
    sync: Arc<TopicSync>,
    chat: Arc<dyn ChatClient>,
}

impl Commands {
    pub fn new(sync: Arc<TopicSync>, chat: Arc<dyn ChatClient>) -> Self {
        Self { sync, chat }
    }

    /// Set up the board in the invoking channel: welcome, contributors and
    /// first topics message, then the registry entry.
    pub async fn init(&self, guild_id: u64, channel_id: u64, caller: &Caller) -> &'static str {
        if !caller.can_manage {
            return config::MANAGE_SERVER_REQUIRED;
        }

        match self.sync.load_state(guild_id, channel_id).await {
            Ok(state) if state.entry.is_some() => return config::INIT_ALREADY_EXISTS,
            Ok(_) => {}
            Err(err) => {
                tracing::error!(error = %err, guild_id, "failed to load state for init");
                return config::OPERATION_NOT_SAVED;
            }
        }

        // The managed messages are sent before the session so their ids can
        // go into the new registry entry.
        let welcome = match self
            .chat
            .send_message(channel_id, config::DEFAULT_WELCOME_MESSAGE)
            .await
        {
            Ok(m) => m,
            Err(err) => {
                tracing::warn!(error = %err, channel_id, "failed to send welcome message");
                return config::CONFIGURED_CHANNEL_INACCESSIBLE;
            }
        };
        let contributors = match self
            .chat
            .send_message(channel_id, &render::render_contributors(&[]))
            .await
        {
            Ok(m) => m,
            Err(err) => {
                tracing::warn!(error = %err, channel_id, "failed to send contributors message");
                return config::CONFIGURED_CHANNEL_INACCESSIBLE;
            }
        };
        let topics_message = match self
            .chat
            .send_message(channel_id, config::TOPICS_INITIALIZING_MESSAGE)
            .await
        {
            Ok(m) => m,
            Err(err) => {
                tracing::warn!(error = %err, channel_id, "failed to send topics message");
                return config::CONFIGURED_CHANNEL_INACCESSIBLE;
            }
        };

        let entry = service::create_board(
            channel_id,
            &welcome.id,
            "",
            &contributors.id,
            &topics_message.id,
        );
        let result = self
            .sync
            .with_locked_state(guild_id, channel_id, move |state| {
                async move {
                    state.entry = Some(entry);
                    state.topics.clear();
                    state.mark_registry_dirty();
                    state.mark_topics_dirty();
                    Ok(())
                }
                .boxed()
            })
            .await;
        if let Err(err) = result {
            tracing::error!(error = %err, guild_id, "failed to persist new board");
            return config::OPERATION_NOT_SAVED;
        }

        self.render_board(guild_id, channel_id, None).await;
        config::INIT_DONE
    }

    pub async fn add_topic(
        &self,
        guild_id: u64,
        channel_id: u64,
        caller: &Caller,
        emoji: &str,
        text: &str,
    ) -> &'static str {
        if !valid_single_emoji(emoji) {
            return config::SINGLE_EMOJI_REQUIRED;
        }

        let chat = Arc::clone(&self.chat);
        let emoji_owned = emoji.to_string();
        let text_owned = text.to_string();
        let author_id = caller.user_id.to_string();
        let author_name = caller.display_name.clone();

        let outcome = self
            .sync
            .with_locked_state(guild_id, channel_id, move |state| {
                async move {
                    if state.entry.is_none() {
                        return Ok(AddOutcome::NotInitialized);
                    }
                    if service::has_emoji(state, &emoji_owned) {
                        return Ok(AddOutcome::Duplicate);
                    }

                    // Replace any previous notification message; the new one
                    // is published after the render.
                    let stale = state
                        .entry
                        .as_ref()
                        .map(|b| b.notification_message_id.clone())
                        .unwrap_or_default();
                    if !stale.is_empty() {
                        if let Err(err) = chat.delete_message(channel_id, &stale).await {
                            tracing::debug!(error = %err, "stale notification message not deleted");
                        }
                        if let Some(board) = state.entry.as_mut() {
                            board.notification_message_id.clear();
                        }
                        state.mark_registry_dirty();
                    }

                    let target = state
                        .entry
                        .as_ref()
                        .and_then(service::find_first_available_slot)
                        .map(|slot| slot.message_id.clone());
                    let target = match target {
                        Some(id) => id,
                        None => {
                            // All slots full: grow the board by one message.
                            let message = match chat
                                .send_message(channel_id, config::TOPICS_INITIALIZING_MESSAGE)
                                .await
                            {
                                Ok(m) => m,
                                Err(err) => {
                                    tracing::warn!(
                                        error = %err,
                                        channel_id,
                                        "failed to create overflow board message"
                                    );
                                    return Ok(AddOutcome::ChannelInaccessible);
                                }
                            };
                            match state.entry.as_mut() {
                                Some(board) => {
                                    service::register_slot(board, &message.id).message_id
                                }
                                None => return Ok(AddOutcome::NotInitialized),
                            }
                        }
                    };

                    let topic = service::add_topic(
                        state,
                        &emoji_owned,
                        &text_owned,
                        &author_id,
                        &author_name,
                        &target,
                    );
                    Ok(AddOutcome::Added {
                        target: topic.message_id,
                    })
                }
                .boxed()
            })
            .await;

        match outcome {
            Err(err) => {
                tracing::error!(error = %err, guild_id, "add-topic session failed");
                reply_for_error(&err)
            }
            Ok(AddOutcome::NotInitialized) => config::SERVER_NOT_INITIALIZED,
            Ok(AddOutcome::Duplicate) => config::EMOJI_ALREADY_USED,
            Ok(AddOutcome::ChannelInaccessible) => config::CONFIGURED_CHANNEL_INACCESSIBLE,
            Ok(AddOutcome::Added { target }) => {
                self.render_board(guild_id, channel_id, Some(&target)).await;
                self.publish_notification(guild_id, channel_id, caller, emoji, text)
                    .await;
                config::TOPIC_ADDED
            }
        }
    }

    pub async fn remove_topic(
        &self,
        guild_id: u64,
        channel_id: u64,
        caller: &Caller,
        topic_id: &str,
    ) -> &'static str {
        let topic_id_owned = topic_id.to_string();
        let author_id = caller.user_id.to_string();
        let can_manage = caller.can_manage;

        let outcome = self
            .sync
            .with_locked_state(guild_id, channel_id, move |state| {
                async move {
                    if state.entry.is_none() {
                        return Ok(RemoveOutcome::NotInitialized);
                    }
                    let Some(topic) = state.topic(&topic_id_owned) else {
                        return Ok(RemoveOutcome::NotFound);
                    };
                    if !can_manage && topic.author_id != author_id {
                        return Ok(RemoveOutcome::NotAllowed);
                    }
                    match service::remove_topic(state, &topic_id_owned) {
                        Some(removed) => Ok(RemoveOutcome::Removed {
                            message_id: removed.message_id,
                            emoji: removed.emoji,
                        }),
                        None => Ok(RemoveOutcome::NotFound),
                    }
                }
                .boxed()
            })
            .await;

        match outcome {
            Err(err) => {
                tracing::error!(error = %err, guild_id, "remove-topic session failed");
                reply_for_error(&err)
            }
            Ok(RemoveOutcome::NotInitialized) => config::SERVER_NOT_INITIALIZED,
            Ok(RemoveOutcome::NotFound) => config::TOPIC_NOT_FOUND,
            Ok(RemoveOutcome::NotAllowed) => config::TOPIC_REMOVAL_NOT_ALLOWED,
            Ok(RemoveOutcome::Removed { message_id, emoji }) => {
                self.clear_reaction_fully(channel_id, &message_id, &emoji)
                    .await;
                self.render_board(guild_id, channel_id, Some(&message_id))
                    .await;
                config::TOPIC_REMOVED
            }
        }
    }

    /// Tear down the whole board: best-effort deletion of every managed
    /// message, then purge of the registry entry and all topics.
    pub async fn remove_boards(
        &self,
        guild_id: u64,
        channel_id: u64,
        caller: &Caller,
    ) -> &'static str {
        if !caller.can_manage {
            return config::MANAGE_SERVER_REQUIRED;
        }

        let chat = Arc::clone(&self.chat);
        let outcome = self
            .sync
            .with_locked_state(guild_id, channel_id, move |state| {
                async move {
                    let Some(board) = state.entry.as_ref() else {
                        return Ok(RemoveBoardsOutcome::NotInitialized);
                    };
                    if board.channel_id != channel_id.to_string() {
                        return Ok(RemoveBoardsOutcome::WrongChannel);
                    }

                    let mut message_ids: Vec<String> = vec![
                        board.welcome_message_id.clone(),
                        board.header_message_id.clone(),
                        board.contributors_message_id.clone(),
                        board.notification_message_id.clone(),
                    ];
                    message_ids.extend(board.messages.iter().map(|m| m.message_id.clone()));

                    for message_id in message_ids.iter().filter(|id| !id.is_empty()) {
                        if let Err(err) = chat.delete_message(channel_id, message_id).await {
                            tracing::debug!(
                                error = %err,
                                message_id = %message_id,
                                "board message not deleted during teardown"
                            );
                        }
                    }

                    state.entry = None;
                    state.topics.clear();
                    state.mark_registry_dirty();
                    state.mark_topics_dirty();
                    Ok(RemoveBoardsOutcome::Removed)
                }
                .boxed()
            })
            .await;

        match outcome {
            Err(err) => {
                tracing::error!(error = %err, guild_id, "remove-boards session failed");
                reply_for_error(&err)
            }
            Ok(RemoveBoardsOutcome::NotInitialized) => config::SERVER_NOT_INITIALIZED,
            Ok(RemoveBoardsOutcome::WrongChannel) => config::REMOVE_BOARDS_CHANNEL_ONLY,
            Ok(RemoveBoardsOutcome::Removed) => config::REMOVE_BOARDS_SUCCESS,
        }
    }

    pub async fn edit_welcome(
        &self,
        guild_id: u64,
        channel_id: u64,
        caller: &Caller,
        text: &str,
    ) -> &'static str {
        if !caller.can_manage {
            return config::MANAGE_SERVER_REQUIRED;
        }

        let state = match self.sync.load_state(guild_id, channel_id).await {
            Ok(state) => state,
            Err(err) => {
                tracing::error!(error = %err, guild_id, "failed to load state for welcome edit");
                return config::OPERATION_NOT_SAVED;
            }
        };
        let Some(board) = state.entry else {
            return config::SERVER_NOT_INITIALIZED;
        };
        if board.welcome_message_id.is_empty() {
            return config::NO_WELCOME_MESSAGE_CONFIGURED;
        }

        let board_channel = board.channel_id.parse().unwrap_or(channel_id);
        match self
            .chat
            .edit_message(board_channel, &board.welcome_message_id, text)
            .await
        {
            Ok(()) => config::WELCOME_MESSAGE_UPDATED,
            Err(ChatError::NotFound) | Err(ChatError::Forbidden) => {
                config::WELCOME_MESSAGE_INACCESSIBLE
            }
            Err(err) => {
                tracing::warn!(error = %err, "welcome message edit failed");
                config::WELCOME_MESSAGE_UPDATE_FAILED
            }
        }
    }

    pub fn help(&self) -> &'static str {
        config::TOPICS_HELP_MESSAGE
    }

    /// Suggestions for the remove-topic picker. Lock-free read: staleness is
    /// acceptable here and the path never writes.
    pub async fn autocomplete(
        &self,
        guild_id: u64,
        channel_id: u64,
        caller: &Caller,
        query: &str,
    ) -> Vec<Choice> {
        let state = match self.sync.load_state(guild_id, channel_id).await {
            Ok(state) => state,
            Err(err) => {
                tracing::debug!(error = %err, guild_id, "autocomplete state load failed");
                return Vec::new();
            }
        };
        if state.entry.is_none() {
            return Vec::new();
        }

        let author_id = caller.user_id.to_string();
        let query = query.to_lowercase();
        state
            .topics
            .iter()
            .filter(|t| caller.can_manage || t.author_id == author_id)
            .filter_map(|t| {
                let display = format!("{} {}", t.emoji, t.text).trim().to_string();
                if !display.to_lowercase().contains(&query) {
                    return None;
                }
                Some(Choice {
                    name: display.chars().take(MAX_CHOICE_NAME_CHARS).collect(),
                    value: t.id.clone(),
                })
            })
            .take(MAX_AUTOCOMPLETE_CHOICES)
            .collect()
    }

    /// Re-render one or all board messages and reconcile their reactions
    /// with the current topic set. Every chat failure in here is soft.
    pub async fn render_board(
        &self,
        guild_id: u64,
        channel_id: u64,
        target_message_id: Option<&str>,
    ) {
        struct Snapshot {
            contributors_message_id: String,
            topics: Vec<topicboard_core::Topic>,
            slots: Vec<String>,
        }

        let target = target_message_id.map(str::to_string);
        // Locked session so normalization repairs observed here get flushed.
        let snapshot = self
            .sync
            .with_locked_state(guild_id, channel_id, move |state| {
                async move {
                    let Some(board) = state.entry.as_ref() else {
                        return Ok(None);
                    };
                    let slots = board
                        .messages
                        .iter()
                        .map(|m| m.message_id.clone())
                        .filter(|id| target.as_deref().map_or(true, |t| t == id))
                        .collect();
                    Ok(Some(Snapshot {
                        contributors_message_id: board.contributors_message_id.clone(),
                        topics: state.topics.clone(),
                        slots,
                    }))
                }
                .boxed()
            })
            .await;
        let snapshot = match snapshot {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(error = %err, guild_id, "render snapshot failed");
                return;
            }
        };

        if !snapshot.contributors_message_id.is_empty() {
            let content = render::render_contributors(&snapshot.topics);
            if let Err(err) = self
                .chat
                .edit_message(channel_id, &snapshot.contributors_message_id, &content)
                .await
            {
                tracing::warn!(error = %err, guild_id, "contributors message not updated");
            }
        }

        for slot_id in &snapshot.slots {
            let message = match self.chat.fetch_message(channel_id, slot_id).await {
                Ok(message) => message,
                Err(err) => {
                    tracing::debug!(error = %err, slot_id = %slot_id, "skipping unreachable board message");
                    continue;
                }
            };

            let rendered = render::render_slot(&snapshot.topics, Some(slot_id));
            if let Err(err) = self
                .chat
                .edit_message(channel_id, slot_id, &rendered.content)
                .await
            {
                tracing::warn!(error = %err, slot_id = %slot_id, "board message not updated");
                continue;
            }

            let wanted: HashSet<&str> = rendered.emojis.iter().map(String::as_str).collect();
            let existing: HashSet<&str> = message
                .reactions
                .iter()
                .map(|r| r.emoji.as_str())
                .collect();

            for emoji in &rendered.emojis {
                if existing.contains(emoji.as_str()) {
                    continue;
                }
                if let Err(err) = self.chat.add_reaction(channel_id, slot_id, emoji).await {
                    tracing::debug!(error = %err, slot_id = %slot_id, emoji = %emoji, "reaction not added");
                }
            }

            for reaction in &message.reactions {
                if wanted.contains(reaction.emoji.as_str()) {
                    continue;
                }
                match self
                    .chat
                    .clear_reaction(channel_id, slot_id, &reaction.emoji)
                    .await
                {
                    Ok(()) => {}
                    Err(ChatError::Forbidden) if reaction.me => {
                        if let Err(err) = self
                            .chat
                            .remove_own_reaction(channel_id, slot_id, &reaction.emoji)
                            .await
                        {
                            tracing::debug!(error = %err, slot_id = %slot_id, "own reaction not removed");
                        }
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, slot_id = %slot_id, "stale reaction not cleared");
                    }
                }
            }
        }
    }

    async fn clear_reaction_fully(&self, channel_id: u64, message_id: &str, emoji: &str) {
        match self.chat.clear_reaction(channel_id, message_id, emoji).await {
            Ok(()) => {}
            Err(ChatError::Forbidden) => {
                if let Err(err) = self
                    .chat
                    .remove_own_reaction(channel_id, message_id, emoji)
                    .await
                {
                    tracing::debug!(error = %err, message_id = %message_id, "own reaction not removed");
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, message_id = %message_id, "reaction not cleared");
            }
        }
    }

    /// Announce the new topic, keeping at most one live notification
    /// message. If a competing session already stored a different id, the
    /// later message withdraws itself instead of overwriting.
    async fn publish_notification(
        &self,
        guild_id: u64,
        channel_id: u64,
        caller: &Caller,
        emoji: &str,
        text: &str,
    ) {
        let content = render::notification_line(&caller.user_id.to_string(), emoji, text);
        let message = match self.chat.send_message(channel_id, &content).await {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(error = %err, channel_id, "notification message not sent");
                return;
            }
        };

        let chat = Arc::clone(&self.chat);
        let notification_id = message.id;
        let result = self
            .sync
            .with_locked_state(guild_id, channel_id, move |state| {
                async move {
                    let Some(board) = state.entry.as_mut() else {
                        return Ok(());
                    };
                    if !board.notification_message_id.is_empty()
                        && board.notification_message_id != notification_id
                    {
                        if let Err(err) = chat.delete_message(channel_id, &notification_id).await {
                            tracing::debug!(error = %err, "raced notification not deleted");
                        }
                    } else {
                        board.notification_message_id = notification_id;
                        state.mark_registry_dirty();
                    }
                    Ok(())
                }
                .boxed()
            })
            .await;
        if let Err(err) = result {
            tracing::warn!(error = %err, guild_id, "notification id not persisted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use topicboard_core::{MemoryStore, TopicSync};

    use crate::discord::{MessageView, ReactionView};

    const GUILD: u64 = 5;
    const CHANNEL: u64 = 6;

    #[derive(Clone, Default)]
    struct MockMessage {
        content: String,
        reactions: Vec<ReactionView>,
    }

    #[derive(Default)]
    struct MockChat {
        next_id: AtomicU64,
        messages: Mutex<HashMap<String, MockMessage>>,
        deleted: Mutex<Vec<String>>,
    }

    impl MockChat {
        fn new() -> Self {
            Self {
                next_id: AtomicU64::new(1000),
                ..Self::default()
            }
        }

        fn content_of(&self, message_id: &str) -> Option<String> {
            self.messages
                .lock()
                .get(message_id)
                .map(|m| m.content.clone())
        }

        fn reactions_of(&self, message_id: &str) -> Vec<String> {
            self.messages
                .lock()
                .get(message_id)
                .map(|m| m.reactions.iter().map(|r| r.emoji.clone()).collect())
                .unwrap_or_default()
        }

        fn seed_reaction(&self, message_id: &str, emoji: &str, me: bool) {
            if let Some(message) = self.messages.lock().get_mut(message_id) {
                message.reactions.push(ReactionView {
                    emoji: emoji.to_string(),
                    me,
                });
            }
        }

        fn deleted_ids(&self) -> Vec<String> {
            self.deleted.lock().clone()
        }
    }

    #[async_trait]
    impl ChatClient for MockChat {
        async fn fetch_message(
            &self,
            _channel_id: u64,
            message_id: &str,
        ) -> Result<MessageView, ChatError> {
            let messages = self.messages.lock();
            let message = messages.get(message_id).ok_or(ChatError::NotFound)?;
            Ok(MessageView {
                id: message_id.to_string(),
                content: message.content.clone(),
                reactions: message.reactions.clone(),
            })
        }

        async fn send_message(
            &self,
            _channel_id: u64,
            content: &str,
        ) -> Result<MessageView, ChatError> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
            self.messages.lock().insert(
                id.clone(),
                MockMessage {
                    content: content.to_string(),
                    reactions: Vec::new(),
                },
            );
            Ok(MessageView {
                id,
                content: content.to_string(),
                reactions: Vec::new(),
            })
        }

        async fn edit_message(
            &self,
            _channel_id: u64,
            message_id: &str,
            content: &str,
        ) -> Result<(), ChatError> {
            let mut messages = self.messages.lock();
            let message = messages.get_mut(message_id).ok_or(ChatError::NotFound)?;
            message.content = content.to_string();
            Ok(())
        }

        async fn delete_message(
            &self,
            _channel_id: u64,
            message_id: &str,
        ) -> Result<(), ChatError> {
            self.messages
                .lock()
                .remove(message_id)
                .ok_or(ChatError::NotFound)?;
            self.deleted.lock().push(message_id.to_string());
            Ok(())
        }

        async fn add_reaction(
            &self,
            _channel_id: u64,
            message_id: &str,
            emoji: &str,
        ) -> Result<(), ChatError> {
            let mut messages = self.messages.lock();
            let message = messages.get_mut(message_id).ok_or(ChatError::NotFound)?;
            if !message.reactions.iter().any(|r| r.emoji == emoji) {
                message.reactions.push(ReactionView {
                    emoji: emoji.to_string(),
                    me: true,
                });
            }
            Ok(())
        }

        async fn remove_own_reaction(
            &self,
            _channel_id: u64,
            message_id: &str,
            emoji: &str,
        ) -> Result<(), ChatError> {
            let mut messages = self.messages.lock();
            let message = messages.get_mut(message_id).ok_or(ChatError::NotFound)?;
            message.reactions.retain(|r| !(r.emoji == emoji && r.me));
            Ok(())
        }

        async fn clear_reaction(
            &self,
            _channel_id: u64,
            message_id: &str,
            emoji: &str,
        ) -> Result<(), ChatError> {
            let mut messages = self.messages.lock();
            let message = messages.get_mut(message_id).ok_or(ChatError::NotFound)?;
            message.reactions.retain(|r| r.emoji != emoji);
            Ok(())
        }
    }

    fn admin() -> Caller {
        Caller {
            user_id: 1,
            display_name: "Admin".to_string(),
            can_manage: true,
        }
    }

    fn member(user_id: u64) -> Caller {
        Caller {
            user_id,
            display_name: format!("Member {user_id}"),
            can_manage: false,
        }
    }

    fn setup() -> (Commands, Arc<MockChat>, Arc<TopicSync>) {
        let sync = Arc::new(TopicSync::new(Arc::new(MemoryStore::new())));
        let chat = Arc::new(MockChat::new());
        let commands = Commands::new(Arc::clone(&sync), chat.clone() as Arc<dyn ChatClient>);
        (commands, chat, sync)
    }

    #[test]
    fn test_emoji_validation() {
        assert!(valid_single_emoji("🔥"));
        assert!(valid_single_emoji("🇺🇦"));
        assert!(!valid_single_emoji("🔥🔥"));
        assert!(!valid_single_emoji(" 🔥"));
        assert!(!valid_single_emoji("ab"));
        assert!(!valid_single_emoji(""));
    }

    #[tokio::test]
    async fn test_init_creates_board_and_renders_empty_state() {
        let (commands, chat, sync) = setup();

        let reply = commands.init(GUILD, CHANNEL, &admin()).await;
        assert_eq!(reply, config::INIT_DONE);

        let state = sync.load_state(GUILD, CHANNEL).await.unwrap();
        let board = state.entry.expect("board should exist after init");
        assert_eq!(board.messages.len(), 1);
        assert_eq!(
            chat.content_of(&board.messages[0].message_id).unwrap(),
            config::TOPICS_EMPTY_MESSAGE
        );
        assert_eq!(
            chat.content_of(&board.welcome_message_id).unwrap(),
            config::DEFAULT_WELCOME_MESSAGE
        );

        // Second init in the same channel is refused.
        let reply = commands.init(GUILD, CHANNEL, &admin()).await;
        assert_eq!(reply, config::INIT_ALREADY_EXISTS);

        let reply = commands.init(GUILD, CHANNEL, &member(9)).await;
        assert_eq!(reply, config::MANAGE_SERVER_REQUIRED);
    }

    #[tokio::test]
    async fn test_add_topic_renders_and_guards_duplicates() {
        let (commands, chat, sync) = setup();
        commands.init(GUILD, CHANNEL, &admin()).await;

        let reply = commands
            .add_topic(GUILD, CHANNEL, &member(7), "🔥", "rust meetup")
            .await;
        assert_eq!(reply, config::TOPIC_ADDED);

        let state = sync.load_state(GUILD, CHANNEL).await.unwrap();
        assert_eq!(state.topics.len(), 1);
        let slot_id = state.entry.as_ref().unwrap().messages[0].message_id.clone();
        assert!(chat.content_of(&slot_id).unwrap().contains("rust meetup"));
        assert_eq!(chat.reactions_of(&slot_id), vec!["🔥"]);

        let reply = commands
            .add_topic(GUILD, CHANNEL, &member(8), "🔥", "another")
            .await;
        assert_eq!(reply, config::EMOJI_ALREADY_USED);
        let state = sync.load_state(GUILD, CHANNEL).await.unwrap();
        assert_eq!(state.topics.len(), 1);

        let reply = commands
            .add_topic(GUILD, CHANNEL, &member(8), "ab", "not an emoji")
            .await;
        assert_eq!(reply, config::SINGLE_EMOJI_REQUIRED);
    }

    #[tokio::test]
    async fn test_add_topic_replaces_notification_message() {
        let (commands, chat, sync) = setup();
        commands.init(GUILD, CHANNEL, &admin()).await;

        commands
            .add_topic(GUILD, CHANNEL, &member(7), "🔥", "first")
            .await;
        let state = sync.load_state(GUILD, CHANNEL).await.unwrap();
        let first_notification = state.entry.unwrap().notification_message_id;
        assert!(!first_notification.is_empty());

        commands
            .add_topic(GUILD, CHANNEL, &member(7), "🎯", "second")
            .await;
        let state = sync.load_state(GUILD, CHANNEL).await.unwrap();
        let second_notification = state.entry.unwrap().notification_message_id;
        assert_ne!(first_notification, second_notification);
        assert!(chat.deleted_ids().contains(&first_notification));
        assert!(chat.content_of(&second_notification).unwrap().contains("🎯"));
    }

    #[tokio::test]
    async fn test_remove_topic_enforces_ownership() {
        let (commands, chat, sync) = setup();
        commands.init(GUILD, CHANNEL, &admin()).await;
        commands
            .add_topic(GUILD, CHANNEL, &member(7), "🔥", "mine")
            .await;
        let state = sync.load_state(GUILD, CHANNEL).await.unwrap();
        let topic_id = state.topics[0].id.clone();
        let slot_id = state.entry.as_ref().unwrap().messages[0].message_id.clone();

        let reply = commands
            .remove_topic(GUILD, CHANNEL, &member(8), &topic_id)
            .await;
        assert_eq!(reply, config::TOPIC_REMOVAL_NOT_ALLOWED);

        let reply = commands
            .remove_topic(GUILD, CHANNEL, &member(8), "missing-id")
            .await;
        assert_eq!(reply, config::TOPIC_NOT_FOUND);

        let reply = commands
            .remove_topic(GUILD, CHANNEL, &admin(), &topic_id)
            .await;
        assert_eq!(reply, config::TOPIC_REMOVED);
        let state = sync.load_state(GUILD, CHANNEL).await.unwrap();
        assert!(state.topics.is_empty());
        assert!(chat.reactions_of(&slot_id).is_empty());
        assert_eq!(
            chat.content_of(&slot_id).unwrap(),
            config::TOPICS_EMPTY_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_render_clears_stale_reactions() {
        let (commands, chat, sync) = setup();
        commands.init(GUILD, CHANNEL, &admin()).await;
        commands
            .add_topic(GUILD, CHANNEL, &member(7), "🔥", "live")
            .await;

        let state = sync.load_state(GUILD, CHANNEL).await.unwrap();
        let slot_id = state.entry.as_ref().unwrap().messages[0].message_id.clone();
        chat.seed_reaction(&slot_id, "👾", true);

        commands.render_board(GUILD, CHANNEL, None).await;
        assert_eq!(chat.reactions_of(&slot_id), vec!["🔥"]);
    }

    #[tokio::test]
    async fn test_remove_boards_purges_everything() {
        let (commands, chat, sync) = setup();
        commands.init(GUILD, CHANNEL, &admin()).await;
        commands
            .add_topic(GUILD, CHANNEL, &member(7), "🔥", "doomed")
            .await;

        let reply = commands.remove_boards(GUILD, CHANNEL, &member(7)).await;
        assert_eq!(reply, config::MANAGE_SERVER_REQUIRED);

        let state = sync.load_state(GUILD, CHANNEL).await.unwrap();
        let board = state.entry.unwrap();
        let slot_id = board.messages[0].message_id.clone();

        let reply = commands.remove_boards(GUILD, CHANNEL, &admin()).await;
        assert_eq!(reply, config::REMOVE_BOARDS_SUCCESS);

        let state = sync.load_state(GUILD, CHANNEL).await.unwrap();
        assert!(state.entry.is_none());
        assert!(state.topics.is_empty());
        assert!(chat.content_of(&slot_id).is_none());
        assert!(chat.content_of(&board.welcome_message_id).is_none());
    }

    #[tokio::test]
    async fn test_autocomplete_restricted_to_own_topics() {
        let (commands, _chat, _sync) = setup();
        commands.init(GUILD, CHANNEL, &admin()).await;
        commands
            .add_topic(GUILD, CHANNEL, &member(7), "🔥", "rust meetup")
            .await;
        commands
            .add_topic(GUILD, CHANNEL, &member(8), "🎯", "other topic")
            .await;

        let choices = commands.autocomplete(GUILD, CHANNEL, &member(7), "").await;
        assert_eq!(choices.len(), 1);
        assert!(choices[0].name.contains("rust meetup"));

        let choices = commands.autocomplete(GUILD, CHANNEL, &admin(), "").await;
        assert_eq!(choices.len(), 2);

        let choices = commands
            .autocomplete(GUILD, CHANNEL, &admin(), "meetup")
            .await;
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].name, "🔥 rust meetup");
    }

    #[tokio::test]
    async fn test_overflow_creates_second_board_message() {
        let (commands, chat, sync) = setup();
        commands.init(GUILD, CHANNEL, &admin()).await;

        let emojis = [
            "🔥", "🎯", "🌊", "🍕", "🎸", "🚀", "🧭", "🪐", "🎁", "🧪", "🦀",
        ];
        for emoji in emojis {
            let reply = commands
                .add_topic(GUILD, CHANNEL, &member(7), emoji, "filler")
                .await;
            assert_eq!(reply, config::TOPIC_ADDED);
        }

        let state = sync.load_state(GUILD, CHANNEL).await.unwrap();
        let board = state.entry.unwrap();
        assert_eq!(board.messages.len(), 2);
        assert_eq!(board.messages[0].count, 10);
        assert_eq!(board.messages[1].count, 1);
        assert_eq!(
            chat.reactions_of(&board.messages[1].message_id),
            vec!["🦀"]
        );
    }
}
