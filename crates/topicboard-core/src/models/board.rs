/// One externally rendered board message and its cached topic count.
///
/// The count is a cache over the topic list; normalization recomputes it
/// from actual membership on every load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSlot {
    pub message_id: String,
    pub count: usize,
}

impl MessageSlot {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            count: 0,
        }
    }
}

/// Registry entry for one guild channel: where the board lives and which
/// messages it spans. Slot order is insertion order and defines pagination
/// priority (earliest slot fills first).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    pub channel_id: String,
    pub welcome_message_id: String,
    pub header_message_id: String,
    pub contributors_message_id: String,
    pub notification_message_id: String,
    pub messages: Vec<MessageSlot>,
    /// Set when decoding repaired a legacy document shape; folded into the
    /// session dirty flag by normalization so the repair gets flushed.
    pub registry_dirty: bool,
}

impl Board {
    pub fn slot(&self, message_id: &str) -> Option<&MessageSlot> {
        self.messages.iter().find(|m| m.message_id == message_id)
    }

    pub fn slot_mut(&mut self, message_id: &str) -> Option<&mut MessageSlot> {
        self.messages.iter_mut().find(|m| m.message_id == message_id)
    }
}
