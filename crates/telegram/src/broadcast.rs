//! Broadcast delivery
//!
//! Copies one message to every recorded chat, sequentially, tallying
//! outcomes. Failures never abort the loop.

use crate::constants::BROADCAST_DELAY_MS;
use std::time::Duration;
use teloxide::{
    prelude::*,
    types::{InlineKeyboardMarkup, MessageId},
    ApiError, RequestError,
};

/// Result of delivering to a single chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The user blocked the bot
    Blocked,
    Failed,
}

impl Delivery {
    pub fn from_result<T>(result: &Result<T, RequestError>) -> Self {
        match result {
            Ok(_) => Delivery::Delivered,
            Err(RequestError::Api(ApiError::BotBlocked)) => Delivery::Blocked,
            Err(_) => Delivery::Failed,
        }
    }
}

/// Tally of a finished broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: u64,
    pub blocked: u64,
    pub failed: u64,
}

impl BroadcastReport {
    pub fn record(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Delivered => self.delivered += 1,
            Delivery::Blocked => self.blocked += 1,
            Delivery::Failed => self.failed += 1,
        }
    }

    /// Completion message sent back to the admin
    pub fn summary(&self, elapsed: Duration) -> String {
        format!(
            "<b>✅ Successfully Broadcast Complete to {} chats in {:.2} seconds</b>\n\n\
            <b>👥 Delivered: {}\n\
            🚫 Blocked: {}\n\
            ⚠️ Failed: {}</b>",
            self.delivered,
            elapsed.as_secs_f64(),
            self.delivered,
            self.blocked,
            self.failed
        )
    }
}

/// Copy `message_id` from `from_chat` to every recipient
pub async fn deliver(
    bot: &Bot,
    from_chat: ChatId,
    message_id: MessageId,
    recipients: &[i64],
    markup: InlineKeyboardMarkup,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();
    tracing::info!("Broadcasting message {} to {} chats", message_id.0, recipients.len());

    for &chat_id in recipients {
        let result = bot
            .copy_message(ChatId(chat_id), from_chat, message_id)
            .reply_markup(markup.clone())
            .await;

        let delivery = Delivery::from_result(&result);
        if let Err(e) = &result {
            tracing::debug!("Broadcast to {} failed: {}", chat_id, e);
        }
        report.record(delivery);

        tokio::time::sleep(Duration::from_millis(BROADCAST_DELAY_MS)).await;
    }

    tracing::info!(
        "Broadcast finished: {} delivered, {} blocked, {} failed",
        report.delivered,
        report.blocked,
        report.failed
    );
    report
}
