use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::StoreError;
use crate::store::BoardStore;

type Key = (u64, u64);

/// In-memory store backend. Used by tests and as a stand-in where no
/// durable storage is wanted.
#[derive(Default)]
pub struct MemoryStore {
    boards: RwLock<HashMap<Key, Value>>,
    topics: RwLock<HashMap<Key, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BoardStore for MemoryStore {
    async fn fetch_board(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<Option<Value>, StoreError> {
        Ok(self.boards.read().get(&(guild_id, channel_id)).cloned())
    }

    async fn upsert_board(
        &self,
        guild_id: u64,
        channel_id: u64,
        doc: Value,
    ) -> Result<(), StoreError> {
        self.boards.write().insert((guild_id, channel_id), doc);
        Ok(())
    }

    async fn delete_board(&self, guild_id: u64, channel_id: u64) -> Result<(), StoreError> {
        self.boards.write().remove(&(guild_id, channel_id));
        Ok(())
    }

    async fn list_topics(&self, guild_id: u64, channel_id: u64) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .topics
            .read()
            .get(&(guild_id, channel_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_topics(
        &self,
        guild_id: u64,
        channel_id: u64,
        topics: Vec<Value>,
    ) -> Result<(), StoreError> {
        let mut map = self.topics.write();
        if topics.is_empty() {
            map.remove(&(guild_id, channel_id));
        } else {
            map.insert((guild_id, channel_id), topics);
        }
        Ok(())
    }

    async fn delete_topics(&self, guild_id: u64, channel_id: u64) -> Result<(), StoreError> {
        self.topics.write().remove(&(guild_id, channel_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_board_upsert_and_delete() {
        let store = MemoryStore::new();
        assert!(store.fetch_board(1, 2).await.unwrap().is_none());

        store
            .upsert_board(1, 2, json!({ "channel_id": "2" }))
            .await
            .unwrap();
        assert!(store.fetch_board(1, 2).await.unwrap().is_some());
        assert!(store.fetch_board(1, 3).await.unwrap().is_none());

        store.delete_board(1, 2).await.unwrap();
        assert!(store.fetch_board(1, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_topics_is_a_full_replace() {
        let store = MemoryStore::new();
        store
            .replace_topics(1, 2, vec![json!({ "topic_id": "a" }), json!({ "topic_id": "b" })])
            .await
            .unwrap();
        store
            .replace_topics(1, 2, vec![json!({ "topic_id": "c" })])
            .await
            .unwrap();

        let topics = store.list_topics(1, 2).await.unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0]["topic_id"], "c");

        store.replace_topics(1, 2, Vec::new()).await.unwrap();
        assert!(store.list_topics(1, 2).await.unwrap().is_empty());
    }
}
