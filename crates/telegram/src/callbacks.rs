//! Callback query handlers for inline keyboard interactions
//!
//! Menu buttons swap the text of the message they are attached to; the logs
//! "Close" button deletes it.

use crate::config::BotConfig;
use crate::constants::MAX_CALLBACK_DATA_LEN;
use crate::handlers;
use crate::keyboards::{self, data};
use crate::types::HandlerResult;
use std::sync::Arc;
use teloxide::{
    prelude::*,
    types::{InlineKeyboardMarkup, Me, ParseMode},
};

/// Handle all callback queries from inline keyboards
pub async fn handle_callback(bot: Bot, q: CallbackQuery, cfg: Arc<BotConfig>, me: Me) -> HandlerResult {
    // Answer callback query to remove loading state
    bot.answer_callback_query(&q.id).await?;

    let data = match q.data {
        Some(ref data) => data,
        None => return Ok(()),
    };

    if data.len() > MAX_CALLBACK_DATA_LEN {
        tracing::warn!("Callback data too long: {} bytes", data.len());
        return Ok(());
    }

    let message = match q.message {
        Some(msg) => msg,
        None => return Ok(()),
    };

    match data.as_str() {
        data::HELP_MENU => {
            let text = handlers::help_text(&cfg.updates_url);
            show_menu(&bot, &message, text, keyboards::back_keyboard()).await?;
        }
        data::ABOUT_ME => {
            let text = handlers::about_text(&cfg.developer_url, &cfg.updates_url);
            show_menu(&bot, &message, text, keyboards::back_keyboard()).await?;
        }
        data::START_MENU => {
            let text = handlers::welcome_text(&q.from.full_name(), me.id.0, &cfg.updates_url);
            let keyboard = keyboards::start_keyboard(me.username(), &cfg.updates_url);
            show_menu(&bot, &message, text, keyboard).await?;
        }
        data::CLOSE_LOGS => {
            bot.delete_message(message.chat.id, message.id).await?;
        }
        other => {
            tracing::warn!("Unknown callback data: {}", other);
        }
    }

    Ok(())
}

/// Replace a menu message's text and keyboard
async fn show_menu(
    bot: &Bot,
    message: &Message,
    text: String,
    keyboard: InlineKeyboardMarkup,
) -> Result<(), teloxide::RequestError> {
    bot.edit_message_text(message.chat.id, message.id, text)
        .parse_mode(ParseMode::Html)
        .disable_web_page_preview(true)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}
