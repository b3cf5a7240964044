//! Narrow chat-platform capability interface and its Discord REST binding.
//!
//! The orchestration layer only ever talks to [`ChatClient`]; tests swap in
//! a mock. NotFound and Forbidden are expected, non-fatal outcomes — callers
//! decide whether to degrade or propagate.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message or channel not found")]
    NotFound,
    #[error("missing permission for this call")]
    Forbidden,
    #[error("chat request failed: {0}")]
    Http(String),
}

/// A message as the orchestration layer sees it: identity, content and the
/// reactions currently on it.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub id: String,
    pub content: String,
    pub reactions: Vec<ReactionView>,
}

#[derive(Debug, Clone)]
pub struct ReactionView {
    pub emoji: String,
    /// Whether the bot itself has added this reaction.
    pub me: bool,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn fetch_message(
        &self,
        channel_id: u64,
        message_id: &str,
    ) -> Result<MessageView, ChatError>;

    async fn send_message(&self, channel_id: u64, content: &str)
        -> Result<MessageView, ChatError>;

    async fn edit_message(
        &self,
        channel_id: u64,
        message_id: &str,
        content: &str,
    ) -> Result<(), ChatError>;

    async fn delete_message(&self, channel_id: u64, message_id: &str) -> Result<(), ChatError>;

    async fn add_reaction(
        &self,
        channel_id: u64,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ChatError>;

    /// Remove only the bot's own reaction.
    async fn remove_own_reaction(
        &self,
        channel_id: u64,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ChatError>;

    /// Remove the reaction for all users.
    async fn clear_reaction(
        &self,
        channel_id: u64,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ChatError>;

    async fn list_reactions(
        &self,
        channel_id: u64,
        message_id: &str,
    ) -> Result<Vec<ReactionView>, ChatError> {
        Ok(self.fetch_message(channel_id, message_id).await?.reactions)
    }
}

#[derive(Deserialize)]
struct WireMessage {
    id: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    reactions: Vec<WireReaction>,
}

#[derive(Deserialize)]
struct WireReaction {
    emoji: WireEmoji,
    #[serde(default)]
    me: bool,
}

#[derive(Deserialize)]
struct WireEmoji {
    name: Option<String>,
}

impl From<WireMessage> for MessageView {
    fn from(wire: WireMessage) -> Self {
        MessageView {
            id: wire.id,
            content: wire.content,
            reactions: wire
                .reactions
                .into_iter()
                .filter_map(|r| {
                    r.emoji.name.map(|emoji| ReactionView { emoji, me: r.me })
                })
                .collect(),
        }
    }
}

/// Percent-encode a unicode emoji for use as a reaction path segment.
fn encode_reaction(emoji: &str) -> String {
    let mut out = String::new();
    for byte in emoji.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(*byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// [`ChatClient`] over the Discord REST API.
pub struct DiscordClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl DiscordClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, DISCORD_API_BASE)
    }

    /// Point the client at a different API root (tests).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Bot {}", self.token))
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ChatError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ChatError::Http(e.to_string()))?;
        match response.status() {
            reqwest::StatusCode::NOT_FOUND => Err(ChatError::NotFound),
            reqwest::StatusCode::FORBIDDEN => Err(ChatError::Forbidden),
            status if status.is_success() => Ok(response),
            status => Err(ChatError::Http(format!("unexpected status {status}"))),
        }
    }
}

#[async_trait]
impl ChatClient for DiscordClient {
    async fn fetch_message(
        &self,
        channel_id: u64,
        message_id: &str,
    ) -> Result<MessageView, ChatError> {
        let path = format!("/channels/{channel_id}/messages/{message_id}");
        let response = self.send(self.request(reqwest::Method::GET, &path)).await?;
        let wire: WireMessage = response
            .json()
            .await
            .map_err(|e| ChatError::Http(e.to_string()))?;
        Ok(wire.into())
    }

    async fn send_message(
        &self,
        channel_id: u64,
        content: &str,
    ) -> Result<MessageView, ChatError> {
        let path = format!("/channels/{channel_id}/messages");
        let response = self
            .send(
                self.request(reqwest::Method::POST, &path)
                    .json(&json!({ "content": content })),
            )
            .await?;
        let wire: WireMessage = response
            .json()
            .await
            .map_err(|e| ChatError::Http(e.to_string()))?;
        Ok(wire.into())
    }

    async fn edit_message(
        &self,
        channel_id: u64,
        message_id: &str,
        content: &str,
    ) -> Result<(), ChatError> {
        let path = format!("/channels/{channel_id}/messages/{message_id}");
        self.send(
            self.request(reqwest::Method::PATCH, &path)
                .json(&json!({ "content": content })),
        )
        .await?;
        Ok(())
    }

    async fn delete_message(&self, channel_id: u64, message_id: &str) -> Result<(), ChatError> {
        let path = format!("/channels/{channel_id}/messages/{message_id}");
        self.send(self.request(reqwest::Method::DELETE, &path))
            .await?;
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel_id: u64,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ChatError> {
        let path = format!(
            "/channels/{channel_id}/messages/{message_id}/reactions/{}/@me",
            encode_reaction(emoji)
        );
        self.send(self.request(reqwest::Method::PUT, &path)).await?;
        Ok(())
    }

    async fn remove_own_reaction(
        &self,
        channel_id: u64,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ChatError> {
        let path = format!(
            "/channels/{channel_id}/messages/{message_id}/reactions/{}/@me",
            encode_reaction(emoji)
        );
        self.send(self.request(reqwest::Method::DELETE, &path))
            .await?;
        Ok(())
    }

    async fn clear_reaction(
        &self,
        channel_id: u64,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), ChatError> {
        let path = format!(
            "/channels/{channel_id}/messages/{message_id}/reactions/{}",
            encode_reaction(emoji)
        );
        self.send(self.request(reqwest::Method::DELETE, &path))
            .await?;
        Ok(())
    }
}
