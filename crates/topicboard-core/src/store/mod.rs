//! Persistence adapter boundary.
//!
//! The store deals in raw JSON documents keyed by (guild, channel); the
//! [`doc`] module owns the mapping between those documents and the domain
//! types, including legacy-field repairs.

pub mod doc;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Durable storage for one board document per guild channel plus its topic
/// documents. Backends guarantee one board per (guild, channel) and unique
/// topic ids.
#[async_trait]
pub trait BoardStore: Send + Sync {
    async fn fetch_board(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<Option<Value>, StoreError>;

    /// Insert or replace the board document for the guild channel.
    async fn upsert_board(
        &self,
        guild_id: u64,
        channel_id: u64,
        doc: Value,
    ) -> Result<(), StoreError>;

    async fn delete_board(&self, guild_id: u64, channel_id: u64) -> Result<(), StoreError>;

    async fn list_topics(&self, guild_id: u64, channel_id: u64) -> Result<Vec<Value>, StoreError>;

    /// Replace all topics for the guild channel with the provided list.
    /// Implemented as delete-all-then-insert-all; callers must not rely on
    /// partial-update semantics.
    async fn replace_topics(
        &self,
        guild_id: u64,
        channel_id: u64,
        topics: Vec<Value>,
    ) -> Result<(), StoreError>;

    async fn delete_topics(&self, guild_id: u64, channel_id: u64) -> Result<(), StoreError>;
}
