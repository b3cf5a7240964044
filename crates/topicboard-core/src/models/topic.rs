/// A single topic entry contributed by a guild member.
///
/// `id` is assigned at creation and never reused. `author_name` is a display
/// snapshot taken at creation time and not kept in sync with later profile
/// changes. `message_id` points at the owning board slot and is only ever
/// rewritten by normalization repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub id: String,
    pub emoji: String,
    pub text: String,
    pub author_id: String,
    pub author_name: String,
    pub message_id: String,
}
