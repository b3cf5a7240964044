use super::{Board, Topic};

/// In-memory aggregate for one guild channel: the registry entry plus its
/// topic list, with dirty flags tracking what a session must flush.
///
/// Exclusively owned by the holder of the guild lock for the duration of a
/// session; created on session entry and discarded after the flush.
#[derive(Debug, Clone)]
pub struct GuildTopicState {
    pub guild_id: u64,
    pub channel_id: u64,
    pub entry: Option<Board>,
    pub topics: Vec<Topic>,
    pub registry_dirty: bool,
    pub topics_dirty: bool,
}

impl GuildTopicState {
    pub fn mark_registry_dirty(&mut self) {
        self.registry_dirty = true;
    }

    pub fn mark_topics_dirty(&mut self) {
        self.topics_dirty = true;
    }

    pub fn topic(&self, topic_id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == topic_id)
    }
}
