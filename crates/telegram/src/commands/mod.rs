//! Command handlers for the Telegram bot
//!
//! This module contains all command handler functions organized by category:
//! - `basic`: Start, help, cancel, group joins
//! - `media`: Social media and music downloads
//! - `admin`: Broadcast, stats, logs, restart

mod admin;
mod basic;
mod media;

pub use admin::*;
pub use basic::*;
pub use media::*;
