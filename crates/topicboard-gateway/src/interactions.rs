//! Interactions webhook: signature verification, payload decoding and
//! dispatch into [`Commands`]. Replies are synchronous interaction
//! responses; slow work happens before the response is written because the
//! platform allows a few seconds per interaction.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::Deserialize;
use serde_json::json;

use topicboard_core::config;

use crate::commands::{Caller, Choice, Commands};

const INTERACTION_PING: u64 = 1;
const INTERACTION_COMMAND: u64 = 2;
const INTERACTION_AUTOCOMPLETE: u64 = 4;

const RESPONSE_PONG: u64 = 1;
const RESPONSE_MESSAGE: u64 = 4;
const RESPONSE_AUTOCOMPLETE: u64 = 8;

/// Message flag for replies only the invoking user can see.
const FLAG_EPHEMERAL: u64 = 64;

/// Manage Guild bit in the member permissions bitfield.
const PERMISSION_MANAGE_GUILD: u64 = 0x20;

pub struct AppState {
    pub commands: Commands,
    pub verify_key: VerifyingKey,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/interactions", post(handle_interaction))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct Interaction {
    #[serde(rename = "type")]
    kind: u64,
    #[serde(default)]
    data: Option<InteractionData>,
    #[serde(default)]
    guild_id: Option<String>,
    #[serde(default)]
    channel_id: Option<String>,
    #[serde(default)]
    member: Option<Member>,
}

#[derive(Debug, Deserialize)]
struct InteractionData {
    name: String,
    #[serde(default)]
    options: Vec<CommandOption>,
}

#[derive(Debug, Deserialize)]
struct CommandOption {
    name: String,
    #[serde(default)]
    value: Option<serde_json::Value>,
    #[serde(default)]
    focused: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct Member {
    user: User,
    #[serde(default)]
    nick: Option<String>,
    #[serde(default)]
    permissions: Option<String>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
    username: String,
    #[serde(default)]
    global_name: Option<String>,
}

/// Check the ed25519 signature the platform attaches to every delivery.
/// The signed message is the timestamp header concatenated with the raw
/// request body.
pub fn verify_signature(key: &VerifyingKey, headers: &HeaderMap, body: &[u8]) -> bool {
    let Some(signature_hex) = headers
        .get("X-Signature-Ed25519")
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let Some(timestamp) = headers
        .get("X-Signature-Timestamp")
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let Ok(signature_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let signature = match <[u8; 64]>::try_from(signature_bytes.as_slice()) {
        Ok(bytes) => Signature::from_bytes(&bytes),
        Err(_) => return false,
    };

    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);
    key.verify(&message, &signature).is_ok()
}

async fn handle_interaction(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !verify_signature(&state.verify_key, &headers, &body) {
        return (StatusCode::UNAUTHORIZED, "invalid request signature").into_response();
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(err) => {
            tracing::warn!(error = %err, "undecodable interaction payload");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match interaction.kind {
        INTERACTION_PING => Json(json!({ "type": RESPONSE_PONG })).into_response(),
        INTERACTION_COMMAND => {
            let reply = dispatch_command(&state.commands, &interaction).await;
            Json(json!({
                "type": RESPONSE_MESSAGE,
                "data": { "content": reply, "flags": FLAG_EPHEMERAL },
            }))
            .into_response()
        }
        INTERACTION_AUTOCOMPLETE => {
            let choices = dispatch_autocomplete(&state.commands, &interaction).await;
            Json(json!({
                "type": RESPONSE_AUTOCOMPLETE,
                "data": { "choices": choices },
            }))
            .into_response()
        }
        other => {
            tracing::debug!(kind = other, "unsupported interaction type");
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

fn resolve_caller(member: &Member) -> Option<Caller> {
    let user_id = member.user.id.parse().ok()?;
    let display_name = member
        .nick
        .clone()
        .or_else(|| member.user.global_name.clone())
        .unwrap_or_else(|| member.user.username.clone());
    let can_manage = member
        .permissions
        .as_deref()
        .and_then(|p| p.parse::<u64>().ok())
        .map(|bits| bits & PERMISSION_MANAGE_GUILD != 0)
        .unwrap_or(false);
    Some(Caller {
        user_id,
        display_name,
        can_manage,
    })
}

fn option_str<'a>(data: &'a InteractionData, name: &str) -> &'a str {
    data.options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| o.value.as_ref())
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

async fn dispatch_command(commands: &Commands, interaction: &Interaction) -> String {
    let Some(data) = interaction.data.as_ref() else {
        return config::SERVER_ONLY_COMMAND.to_string();
    };
    let (Some(guild_id), Some(channel_id)) = (
        interaction
            .guild_id
            .as_deref()
            .and_then(|id| id.parse::<u64>().ok()),
        interaction
            .channel_id
            .as_deref()
            .and_then(|id| id.parse::<u64>().ok()),
    ) else {
        return config::SERVER_ONLY_COMMAND.to_string();
    };
    let Some(caller) = interaction.member.as_ref().and_then(resolve_caller) else {
        return config::SERVER_ONLY_COMMAND.to_string();
    };

    let reply = match data.name.as_str() {
        "init" => commands.init(guild_id, channel_id, &caller).await,
        "addtopic" => {
            commands
                .add_topic(
                    guild_id,
                    channel_id,
                    &caller,
                    option_str(data, "emoji").trim(),
                    option_str(data, "topic").trim(),
                )
                .await
        }
        "removetopic" => {
            commands
                .remove_topic(guild_id, channel_id, &caller, option_str(data, "topic"))
                .await
        }
        "removeboards" => commands.remove_boards(guild_id, channel_id, &caller).await,
        "editwelcomemessage" => {
            commands
                .edit_welcome(guild_id, channel_id, &caller, option_str(data, "message"))
                .await
        }
        "topicshelp" => commands.help(),
        other => {
            tracing::warn!(command = other, "unknown command name");
            config::SERVER_ONLY_COMMAND
        }
    };
    reply.to_string()
}

async fn dispatch_autocomplete(commands: &Commands, interaction: &Interaction) -> Vec<Choice> {
    let Some(data) = interaction.data.as_ref() else {
        return Vec::new();
    };
    let (Some(guild_id), Some(channel_id)) = (
        interaction
            .guild_id
            .as_deref()
            .and_then(|id| id.parse::<u64>().ok()),
        interaction
            .channel_id
            .as_deref()
            .and_then(|id| id.parse::<u64>().ok()),
    ) else {
        return Vec::new();
    };
    let Some(caller) = interaction.member.as_ref().and_then(resolve_caller) else {
        return Vec::new();
    };

    let query = data
        .options
        .iter()
        .find(|o| o.focused.unwrap_or(false))
        .and_then(|o| o.value.as_ref())
        .and_then(|v| v.as_str())
        .unwrap_or("");
    commands
        .autocomplete(guild_id, channel_id, &caller, query)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn signed_headers(key: &SigningKey, timestamp: &str, body: &[u8]) -> HeaderMap {
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        let signature = key.sign(&message);

        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Signature-Ed25519",
            hex::encode(signature.to_bytes()).parse().unwrap(),
        );
        headers.insert("X-Signature-Timestamp", timestamp.parse().unwrap());
        headers
    }

    #[test]
    fn test_signature_roundtrip() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let body = br#"{"type":1}"#;
        let headers = signed_headers(&key, "1700000000", body);
        assert!(verify_signature(&key.verifying_key(), &headers, body));
    }

    #[test]
    fn test_signature_rejects_tampered_body() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        let headers = signed_headers(&key, "1700000000", br#"{"type":1}"#);
        assert!(!verify_signature(
            &key.verifying_key(),
            &headers,
            br#"{"type":2}"#
        ));
    }

    #[test]
    fn test_signature_rejects_missing_headers() {
        let key = SigningKey::from_bytes(&[7u8; 32]);
        assert!(!verify_signature(
            &key.verifying_key(),
            &HeaderMap::new(),
            b"{}"
        ));
    }

    #[test]
    fn test_caller_resolution() {
        let member = Member {
            user: User {
                id: "42".to_string(),
                username: "octo".to_string(),
                global_name: Some("Octo".to_string()),
            },
            nick: None,
            permissions: Some("32".to_string()),
        };
        let caller = resolve_caller(&member).unwrap();
        assert_eq!(caller.user_id, 42);
        assert_eq!(caller.display_name, "Octo");
        assert!(caller.can_manage);

        let member = Member {
            user: User {
                id: "42".to_string(),
                username: "octo".to_string(),
                global_name: None,
            },
            nick: Some("Nick".to_string()),
            permissions: Some("8192".to_string()),
        };
        let caller = resolve_caller(&member).unwrap();
        assert_eq!(caller.display_name, "Nick");
        assert!(!caller.can_manage);
    }
}
