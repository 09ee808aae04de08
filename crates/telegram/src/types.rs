use teloxide::{
    dispatching::dialogue::{Dialogue, InMemStorage},
    macros::BotCommands,
};

/// Type alias for dialogue management with State and InMemStorage
pub type MyDialogue = Dialogue<State, InMemStorage<State>>;

/// Type alias for handler result types
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Represents the dialogue state for a chat
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub enum State {
    /// Normal operation
    #[default]
    Start,
    /// An admin asked to broadcast and the next admin message is the payload
    AwaitBroadcast,
}

/// Available bot commands
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Show usage information")]
    Help,
    #[command(description = "Download a Facebook video")]
    Fb(String),
    #[command(description = "Download an Instagram reel")]
    In(String),
    #[command(description = "Download a TikTok video")]
    Tt(String),
    #[command(description = "Download a Pinterest video")]
    Pin(String),
    #[command(description = "Download a Spotify track")]
    Sp(String),
    #[command(description = "Download a YouTube video")]
    Yt(String),
    #[command(description = "Download a YouTube video as MP3")]
    Song(String),
    #[command(description = "Broadcast a message to all chats (admin)")]
    Broadcast,
    #[command(description = "Show usage statistics (admin)")]
    Stats,
    #[command(description = "Show recent logs (admin)")]
    Logs,
    #[command(description = "Restart the bot (admin)")]
    Restart,
    #[command(description = "Cancel the current operation")]
    Cancel,
}
