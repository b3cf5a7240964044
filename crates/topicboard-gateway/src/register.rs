//! One-shot slash-command registration against the application commands API.
//! Global by default; a guild id scopes the upload to that guild, which the
//! platform propagates immediately (handy while iterating).

use anyhow::{Context, Result};
use serde_json::json;

use topicboard_core::config;

const API_BASE: &str = "https://discord.com/api/v10";

/// Bit value of the Manage Guild permission, as the string form the
/// commands API expects for `default_member_permissions`.
const MANAGE_GUILD: &str = "32";

fn command_definitions() -> serde_json::Value {
    json!([
        {
            "name": "init",
            "description": config::INIT_COMMAND_DESCRIPTION,
            "default_member_permissions": MANAGE_GUILD,
        },
        {
            "name": "addtopic",
            "description": config::ADD_TOPIC_COMMAND_DESCRIPTION,
            "options": [
                {
                    "type": 3,
                    "name": "emoji",
                    "description": "Emoji for the topic",
                    "required": true,
                },
                {
                    "type": 3,
                    "name": "topic",
                    "description": "Topic text",
                    "required": true,
                },
            ],
        },
        {
            "name": "removetopic",
            "description": config::REMOVE_TOPIC_COMMAND_DESCRIPTION,
            "options": [
                {
                    "type": 3,
                    "name": "topic",
                    "description": "Topic to remove",
                    "required": true,
                    "autocomplete": true,
                },
            ],
        },
        {
            "name": "removeboards",
            "description": config::REMOVE_BOARDS_COMMAND_DESCRIPTION,
            "default_member_permissions": MANAGE_GUILD,
        },
        {
            "name": "editwelcomemessage",
            "description": config::EDIT_WELCOME_COMMAND_DESCRIPTION,
            "default_member_permissions": MANAGE_GUILD,
            "options": [
                {
                    "type": 3,
                    "name": "message",
                    "description": "New welcome message text",
                    "required": true,
                },
            ],
        },
        {
            "name": "topicshelp",
            "description": config::TOPICS_HELP_COMMAND_DESCRIPTION,
        },
    ])
}

/// Bulk-overwrite the application's command set.
pub async fn register_commands(token: &str, app_id: u64, guild_id: Option<u64>) -> Result<()> {
    let url = match guild_id {
        Some(guild) => format!("{API_BASE}/applications/{app_id}/guilds/{guild}/commands"),
        None => format!("{API_BASE}/applications/{app_id}/commands"),
    };

    let client = reqwest::Client::new();
    let response = client
        .put(&url)
        .header("Authorization", format!("Bot {token}"))
        .json(&command_definitions())
        .send()
        .await
        .context("command registration request failed")?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("command registration rejected: {status}: {body}");
    }

    tracing::info!(scope = %guild_id.map_or("global".to_string(), |g| g.to_string()),
        "slash commands registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definitions_cover_every_command() {
        let defs = command_definitions();
        let names: Vec<&str> = defs
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "init",
                "addtopic",
                "removetopic",
                "removeboards",
                "editwelcomemessage",
                "topicshelp",
            ]
        );
    }

    #[test]
    fn test_admin_commands_carry_permission_gate() {
        let defs = command_definitions();
        for def in defs.as_array().unwrap() {
            let gated = def.get("default_member_permissions").is_some();
            match def["name"].as_str().unwrap() {
                "init" | "removeboards" | "editwelcomemessage" => assert!(gated),
                _ => assert!(!gated),
            }
        }
    }

    #[test]
    fn test_remove_topic_option_autocompletes() {
        let defs = command_definitions();
        let remove = defs
            .as_array()
            .unwrap()
            .iter()
            .find(|d| d["name"] == "removetopic")
            .unwrap();
        assert_eq!(remove["options"][0]["autocomplete"], true);
    }
}
