//! Constants used throughout the telegram bot

/// Display name of the bot
pub const BOT_NAME: &str = "Smart Tool ⚙️";

/// Characters accepted in front of a command name
pub const COMMAND_PREFIXES: [char; 3] = ['/', '.', '!'];

/// Minimum seconds between download requests from the same user
pub const RATE_LIMIT_SECONDS: u64 = 5;

/// Bot API upload limit for bots (50 MiB)
pub const MAX_UPLOAD_SIZE: u64 = 50 * 1024 * 1024;

/// Telegram message length limit
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Maximum callback payload size accepted
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

/// Minimum seconds between progress edits for yt-dlp downloads
pub const PROGRESS_INTERVAL_SECS: u64 = 1;

/// Minimum seconds between progress edits for Spotify downloads
pub const SPOTIFY_PROGRESS_INTERVAL_SECS: u64 = 2;

/// Pause between broadcast deliveries, keeps under Telegram's flood limits
pub const BROADCAST_DELAY_MS: u64 = 50;

/// Capacity of the in-memory log buffer served by /logs
pub const LOG_BUFFER_CAPACITY: usize = 256 * 1024;

/// Separator line used in captions
pub const SEPARATOR: &str = "━━━━━━━━━━━━━━━━━━━━━";

/// Admin rights requested by the "Add Me" link
pub const ADD_ME_RIGHTS: &str =
    "post_messages+delete_messages+edit_messages+pin_messages+change_info+invite_users+promote_members";

/// Chat-facing messages
pub mod text {
    pub const NOT_AUTHORIZED: &str = "🚫 <b>You are not authorized to use this command.</b>";
    pub const RATE_LIMITED: &str =
        "⏳ Please wait a few seconds before sending another download request.";
    pub const SEARCHING_VIDEO: &str = "<b>Searching The Video...</b>";
    pub const SEARCHING_MUSIC: &str = "<b>Searching The Music...</b>";
    pub const UPLOADING: &str = "<b>Found ☑️ Uploading...</b>";
    pub const DOWNLOAD_ERROR: &str = "<b>❌ Download Error</b>";
    pub const SPOTIFY_DISABLED: &str = "<b>❌ Spotify downloads are not configured.</b>";
    pub const SPOTIFY_NOT_FOUND: &str = "<b>❌ Could not fetch Spotify track details.</b>";
    pub const SPOTIFY_INVALID: &str = "<b>Please Provide A Valid Spotify URL ❌</b>";
    pub const BROADCAST_PROMPT: &str = "📢 <b>Please send the message you want to broadcast.</b>";
    pub const BROADCAST_PENDING: &str =
        "<b>Unknown command.</b> Send the message to broadcast, or /cancel.";
    pub const BROADCAST_PROCESSING: &str = "<b>⏳ Processing Broadcast ⚡️</b>";
    pub const LOGS_LOADING: &str = "🚀 <b>Fetching Logs Database 🔥</b>";
    pub const LOGS_EMPTY: &str = "No logs available yet.";
    pub const RESTARTING: &str = "<b>🔄 Restarting the bot...</b>";
    pub const STARTED: &str = "<b>Bot Successfully Started! 💥</b>";
}
