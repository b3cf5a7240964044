pub mod board;
pub mod state;
pub mod topic;

pub use board::{Board, MessageSlot};
pub use state::GuildTopicState;
pub use topic::Topic;
