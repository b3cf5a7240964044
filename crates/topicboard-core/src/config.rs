//! Board capacity and every fixed piece of user-facing copy.

/// Maximum number of topics rendered into a single board message.
pub const MAX_TOPICS_PER_MESSAGE: usize = 10;

pub const DEFAULT_WELCOME_MESSAGE: &str = "Add a welcome message.";
pub const CONTRIBUTORS_HEADER: &str = "## Topics added by:";
pub const CONTRIBUTORS_EMPTY_STATE: &str = "(empty at first)";
pub const TOPICS_INITIALIZING_MESSAGE: &str = "Setting up topics board...";
pub const TOPICS_EMPTY_MESSAGE: &str = "No topics yet. Add one with /addtopic.";

pub const SERVER_ONLY_COMMAND: &str = "This command can only be used inside a server.";
pub const INIT_ALREADY_EXISTS: &str = "У цьому каналі вже є Topic Board.";
pub const INIT_DONE: &str = "Topics board initialized.";
pub const SERVER_NOT_INITIALIZED: &str = "This server is not initialized. Run /init first.";
pub const MANAGE_SERVER_REQUIRED: &str = "You need the Manage Server permission to run this command.";
pub const CONFIGURED_CHANNEL_INACCESSIBLE: &str =
    "Unable to access the configured channel for this server.";
pub const NO_WELCOME_MESSAGE_CONFIGURED: &str =
    "No welcome message is configured. Run /init to set up the board.";
pub const WELCOME_MESSAGE_INACCESSIBLE: &str =
    "Unable to access the welcome message in the configured channel.";
pub const WELCOME_MESSAGE_UPDATE_FAILED: &str =
    "Failed to update the welcome message. Please try again.";
pub const WELCOME_MESSAGE_UPDATED: &str = "Welcome message updated.";
pub const REMOVE_BOARDS_CHANNEL_ONLY: &str =
    "This command can only be used in the topic board channel.";
pub const REMOVE_BOARDS_SUCCESS: &str = "Topic board removed. Run /init again to start fresh.";

pub const EMOJI_ALREADY_USED: &str =
    "This emoji is already in use in this guild. Choose another one.";
pub const SINGLE_EMOJI_REQUIRED: &str = "Please enter exactly one emoji.";
pub const TOPIC_ADDED: &str = "Topic added!";
pub const TOPIC_NOT_FOUND: &str = "Topic not found.";
pub const TOPIC_REMOVAL_NOT_ALLOWED: &str = "You can only remove topics you created.";
pub const TOPIC_REMOVED: &str = "Topic removed.";
pub const OPERATION_NOT_SAVED: &str = "Something went wrong and the change was not saved.";

pub const INIT_COMMAND_DESCRIPTION: &str = "Initialize the topics board in this channel.";
pub const EDIT_WELCOME_COMMAND_DESCRIPTION: &str =
    "Edit the welcome message created during initialization.";
pub const ADD_TOPIC_COMMAND_DESCRIPTION: &str = "Add a topic for this guild.";
pub const REMOVE_TOPIC_COMMAND_DESCRIPTION: &str =
    "Remove one of your topics or any if you are an admin.";
pub const REMOVE_BOARDS_COMMAND_DESCRIPTION: &str =
    "Remove all topic board messages and data for this guild.";
pub const TOPICS_HELP_COMMAND_DESCRIPTION: &str = "Show a quick guide to all topic commands.";

pub const TOPICS_HELP_MESSAGE: &str = "Here are all available commands:\n\
• **/addtopic** — add a new topic\n\
• **/removetopic** — remove one of your topics (with autocomplete)\n\
• **/editwelcomemessage** — edit the welcome message\n\
• **/removeboards** — admin-only, deletes all topic boards and resets everything\n\
• **/topicshelp** — shows this help";
