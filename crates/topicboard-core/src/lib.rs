pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod store;
pub mod sync;
pub mod tracing_setup;

pub use error::{BoardError, StoreError};
pub use models::{Board, GuildTopicState, MessageSlot, Topic};
pub use render::RenderedTopics;
pub use store::{BoardStore, MemoryStore, SqliteStore};
pub use sync::{LockRegistry, TopicSync};
