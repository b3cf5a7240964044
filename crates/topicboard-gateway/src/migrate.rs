//! Import of the legacy flat-file data: a `guilds.json` registry map plus
//! one `topics/<guild_id>.json` file per guild. Documents pass through the
//! same decode path the live service uses, so legacy field shapes are
//! repaired on the way in.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use topicboard_core::store::doc;
use topicboard_core::BoardStore;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub boards: usize,
    pub topics: usize,
    pub skipped_guilds: usize,
}

/// Load every guild entry and its topics into the store. Existing documents
/// for a migrated guild are replaced; guilds absent from the input files are
/// left untouched.
pub async fn run_migration(
    store: &dyn BoardStore,
    guilds_file: &Path,
    topics_dir: &Path,
) -> Result<MigrationReport> {
    let raw = fs::read_to_string(guilds_file)
        .with_context(|| format!("failed to read {}", guilds_file.display()))?;
    let guilds: Value = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", guilds_file.display()))?;
    let guilds = guilds
        .as_object()
        .context("guild registry is not a JSON object")?;

    let mut report = MigrationReport::default();
    for (guild_key, entry) in guilds {
        let Ok(guild_id) = guild_key.parse::<u64>() else {
            tracing::warn!(guild_key = %guild_key, "skipping non-numeric guild key");
            report.skipped_guilds += 1;
            continue;
        };
        let Some(board) = doc::board_from_doc(entry) else {
            tracing::warn!(guild_id, "skipping undecodable guild entry");
            report.skipped_guilds += 1;
            continue;
        };
        let Ok(channel_id) = board.channel_id.parse::<u64>() else {
            tracing::warn!(guild_id, "skipping guild entry without a channel id");
            report.skipped_guilds += 1;
            continue;
        };

        store.delete_board(guild_id, channel_id).await?;
        store.delete_topics(guild_id, channel_id).await?;
        store
            .upsert_board(guild_id, channel_id, doc::board_to_doc(guild_id, &board))
            .await?;
        report.boards += 1;

        let topics_file = topics_dir.join(format!("{guild_id}.json"));
        if !topics_file.exists() {
            continue;
        }
        let raw = fs::read_to_string(&topics_file)
            .with_context(|| format!("failed to read {}", topics_file.display()))?;
        let entries: Vec<Value> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", topics_file.display()))?;

        let mut docs = Vec::with_capacity(entries.len());
        for entry in &entries {
            match doc::topic_from_doc(entry) {
                Some(topic) => docs.push(doc::topic_to_doc(guild_id, channel_id, &topic)),
                None => tracing::warn!(guild_id, "skipping undecodable topic entry"),
            }
        }
        report.topics += docs.len();
        store.replace_topics(guild_id, channel_id, docs).await?;
    }

    tracing::info!(
        boards = report.boards,
        topics = report.topics,
        skipped = report.skipped_guilds,
        "migration finished"
    );
    Ok(report)
}
