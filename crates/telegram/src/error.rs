use downloader::DownloadError;
use std::fmt;

/// Custom error type for telegram bot operations
#[derive(Debug)]
pub enum BotError {
    /// Telegram API error
    TelegramError(teloxide::RequestError),
    /// Media download error
    DownloadError(DownloadError),
    /// Invalid or missing configuration
    Config(String),
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotError::TelegramError(e) => write!(f, "Telegram error: {}", e),
            BotError::DownloadError(e) => write!(f, "Download error: {}", e),
            BotError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for BotError {}

impl From<teloxide::RequestError> for BotError {
    fn from(err: teloxide::RequestError) -> Self {
        BotError::TelegramError(err)
    }
}

impl From<DownloadError> for BotError {
    fn from(err: DownloadError) -> Self {
        BotError::DownloadError(err)
    }
}

/// Result type alias for bot operations
pub type BotResult<T> = Result<T, BotError>;

/// Helper trait to convert errors into user-friendly messages
pub trait UserMessage {
    fn user_message(&self) -> String;
}

impl UserMessage for DownloadError {
    fn user_message(&self) -> String {
        match self {
            DownloadError::TooLarge { limit, .. } => format!(
                "❌ The file is too large to upload (limit {} MB).",
                limit / (1024 * 1024)
            ),
            DownloadError::Spawn { .. } => "❌ Downloader is unavailable right now.".to_string(),
            DownloadError::ToolFailed { stderr, .. } if stderr.contains("Private") || stderr.contains("login") => {
                "❌ This media is private or requires login.".to_string()
            }
            _ => "❌ An error occurred while downloading.".to_string(),
        }
    }
}

impl UserMessage for BotError {
    fn user_message(&self) -> String {
        match self {
            BotError::TelegramError(e) => format!("❌ Communication error: {}", e),
            BotError::DownloadError(e) => e.user_message(),
            BotError::Config(msg) => format!("❌ {}", msg),
        }
    }
}
