use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::Value;

use crate::error::StoreError;
use crate::store::{doc, BoardStore};

/// SQLite-backed store. Boards and topics are kept as JSON documents in
/// document-per-row tables so the on-disk shape stays the historical one.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS guild_boards (
    guild_id TEXT NOT NULL,
    channel_id TEXT NOT NULL,
    doc TEXT NOT NULL,
    PRIMARY KEY (guild_id, channel_id)
);
CREATE TABLE IF NOT EXISTS topics (
    topic_id TEXT PRIMARY KEY,
    guild_id TEXT NOT NULL,
    channel_id TEXT NOT NULL,
    doc TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS topics_guild_channel ON topics (guild_id, channel_id);
"#;

impl SqliteStore {
    /// Open (or create) the database at `path`. Failure here means the
    /// backend is unavailable and startup should abort.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            }
        }
        let conn =
            Connection::open(path).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::with_connection(conn)
    }

    /// Purely in-memory database, for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Io("store connection poisoned".to_string()))
    }
}

#[async_trait]
impl BoardStore for SqliteStore {
    async fn fetch_board(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<Option<Value>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT doc FROM guild_boards WHERE guild_id = ?1 AND channel_id = ?2")?;
        let mut rows = stmt.query(params![guild_id.to_string(), channel_id.to_string()])?;
        match rows.next()? {
            Some(row) => {
                let raw: String = row.get(0)?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }

    async fn upsert_board(
        &self,
        guild_id: u64,
        channel_id: u64,
        doc: Value,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO guild_boards (guild_id, channel_id, doc) VALUES (?1, ?2, ?3)
             ON CONFLICT (guild_id, channel_id) DO UPDATE SET doc = excluded.doc",
            params![
                guild_id.to_string(),
                channel_id.to_string(),
                doc.to_string()
            ],
        )?;
        Ok(())
    }

    async fn delete_board(&self, guild_id: u64, channel_id: u64) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM guild_boards WHERE guild_id = ?1 AND channel_id = ?2",
            params![guild_id.to_string(), channel_id.to_string()],
        )?;
        Ok(())
    }

    async fn list_topics(&self, guild_id: u64, channel_id: u64) -> Result<Vec<Value>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT doc FROM topics WHERE guild_id = ?1 AND channel_id = ?2 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![guild_id.to_string(), channel_id.to_string()], |row| {
            row.get::<_, String>(0)
        })?;

        let mut docs = Vec::new();
        for raw in rows {
            docs.push(serde_json::from_str(&raw?)?);
        }
        Ok(docs)
    }

    async fn replace_topics(
        &self,
        guild_id: u64,
        channel_id: u64,
        topics: Vec<Value>,
    ) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM topics WHERE guild_id = ?1 AND channel_id = ?2",
            params![guild_id.to_string(), channel_id.to_string()],
        )?;
        for topic in &topics {
            let Some(topic_id) = doc::topic_id_of(topic) else {
                tracing::warn!(guild_id, channel_id, "skipping topic document without id");
                continue;
            };
            tx.execute(
                "INSERT OR REPLACE INTO topics (topic_id, guild_id, channel_id, doc)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    topic_id,
                    guild_id.to_string(),
                    channel_id.to_string(),
                    topic.to_string()
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn delete_topics(&self, guild_id: u64, channel_id: u64) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM topics WHERE guild_id = ?1 AND channel_id = ?2",
            params![guild_id.to_string(), channel_id.to_string()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_board_roundtrip_on_disk() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("boards.db")).unwrap();

        let doc = json!({ "guild_id": "1", "channel_id": "2", "messages": [] });
        store.upsert_board(1, 2, doc.clone()).await.unwrap();
        assert_eq!(store.fetch_board(1, 2).await.unwrap(), Some(doc));

        let replacement = json!({ "guild_id": "1", "channel_id": "2", "welcome_message_id": "9" });
        store.upsert_board(1, 2, replacement.clone()).await.unwrap();
        assert_eq!(store.fetch_board(1, 2).await.unwrap(), Some(replacement));

        store.delete_board(1, 2).await.unwrap();
        assert!(store.fetch_board(1, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_topics_replace_and_scoping() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .replace_topics(
                1,
                2,
                vec![
                    json!({ "topic_id": "a", "emoji": "🔥" }),
                    json!({ "topic_id": "b", "emoji": "🎯" }),
                ],
            )
            .await
            .unwrap();
        store
            .replace_topics(1, 3, vec![json!({ "topic_id": "c" })])
            .await
            .unwrap();

        let topics = store.list_topics(1, 2).await.unwrap();
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0]["topic_id"], "a");

        store
            .replace_topics(1, 2, vec![json!({ "topic_id": "b" })])
            .await
            .unwrap();
        assert_eq!(store.list_topics(1, 2).await.unwrap().len(), 1);
        // Other channel untouched by the full replace.
        assert_eq!(store.list_topics(1, 3).await.unwrap().len(), 1);

        store.delete_topics(1, 2).await.unwrap();
        assert!(store.list_topics(1, 2).await.unwrap().is_empty());
    }
}
