//! Gateway configuration: a JSON file with environment-variable fallbacks,
//! so deployments can keep the token out of the file entirely.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    pub token: Option<String>,
    pub app_id: Option<u64>,
    pub public_key: Option<String>,
    pub db_path: Option<PathBuf>,
}

impl GatewayConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("failed to parse config {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if self.token.is_none() {
            self.token = std::env::var("DISCORD_TOKEN").ok();
        }
        if self.app_id.is_none() {
            self.app_id = std::env::var("DISCORD_APP_ID")
                .ok()
                .and_then(|v| v.parse().ok());
        }
        if self.public_key.is_none() {
            self.public_key = std::env::var("DISCORD_PUBLIC_KEY").ok();
        }
        if self.db_path.is_none() {
            self.db_path = std::env::var("TOPICBOARD_DB").ok().map(PathBuf::from);
        }
    }

    pub fn require_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .context("bot token missing: set DISCORD_TOKEN or the token config field")
    }

    pub fn require_app_id(&self) -> Result<u64> {
        self.app_id
            .context("application id missing: set DISCORD_APP_ID or the appId config field")
    }

    pub fn require_public_key(&self) -> Result<&str> {
        self.public_key.as_deref().context(
            "interaction public key missing: set DISCORD_PUBLIC_KEY or the publicKey config field",
        )
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("topicboard.db"))
    }
}
