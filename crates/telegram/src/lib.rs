pub mod broadcast;
pub mod callbacks;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod keyboards;
pub mod logs;
pub mod rate_limit;
pub mod telegram;
pub mod types;
pub mod utils;

pub use config::BotConfig;
pub use error::{BotError, BotResult};
pub use logs::LogBuffer;
pub use teloxide::prelude::Dispatcher;
pub use types::{Command, HandlerResult, MyDialogue, State};
