pub mod commands;
pub mod config;
pub mod discord;
pub mod interactions;
pub mod migrate;
pub mod register;

pub use commands::{Caller, Choice, Commands};
pub use config::GatewayConfig;
pub use discord::{ChatClient, ChatError, DiscordClient, MessageView, ReactionView};
