//! Basic bot commands (start, help, cancel) and group joins

use crate::config::BotConfig;
use crate::constants::BOT_NAME;
use crate::handlers;
use crate::keyboards;
use crate::types::{HandlerResult, MyDialogue};
use activity::ActivityStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use teloxide::{prelude::*, types::{Me, ParseMode}};

/// Delay between frames of the start-up animation
const ANIMATION_STEP: Duration = Duration::from_millis(400);

/// Welcome message when a user starts the bot in private
pub async fn start(bot: Bot, msg: Message, cfg: Arc<BotConfig>, me: Me) -> HandlerResult {
    let chat_id = msg.chat.id;

    let animation = handlers::send_html(&bot, chat_id, &format!("<b>Starting {}...</b>", BOT_NAME)).await?;
    tokio::time::sleep(ANIMATION_STEP).await;
    handlers::edit_html(&bot, &animation, "<b>Generating Session Keys Please Wait...</b>").await?;
    tokio::time::sleep(ANIMATION_STEP).await;
    if let Err(e) = bot.delete_message(chat_id, animation.id).await {
        tracing::debug!("Could not delete start animation: {}", e);
    }

    let full_name = msg
        .from()
        .map(|u| u.full_name())
        .unwrap_or_else(|| "there".to_string());

    bot.send_message(chat_id, handlers::welcome_text(&full_name, me.id.0, &cfg.updates_url))
        .parse_mode(ParseMode::Html)
        .disable_web_page_preview(true)
        .reply_markup(keyboards::start_keyboard(me.username(), &cfg.updates_url))
        .await?;
    Ok(())
}

/// Display usage for every download command
pub async fn help(bot: Bot, msg: Message, cfg: Arc<BotConfig>) -> HandlerResult {
    bot.send_message(msg.chat.id, handlers::help_text(&cfg.updates_url))
        .parse_mode(ParseMode::Html)
        .disable_web_page_preview(true)
        .await?;
    Ok(())
}

/// Cancel the current operation and reset dialogue state
pub async fn cancel(bot: Bot, dialogue: MyDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, "Operation cancelled.").await?;
    dialogue.exit().await?;
    Ok(())
}

/// Record the group and thank whoever added the bot
pub async fn bot_added(
    bot: Bot,
    msg: Message,
    cfg: Arc<BotConfig>,
    store: ActivityStore,
    me: Me,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    tracing::info!("Added to group {} ({})", chat_id, msg.chat.title().unwrap_or("untitled"));

    let recorded =
        tokio::task::spawn_blocking(move || store.record(chat_id.0, true, Utc::now())).await?;
    if let Err(e) = recorded {
        tracing::warn!("Failed to record group {}: {}", chat_id, e);
    }

    bot.send_message(
        chat_id,
        format!(
            "<b>Thank you for adding {} to this group!</b>\n\
            Send /help to see everything I can download.",
            BOT_NAME
        ),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(keyboards::group_welcome_keyboard(me.username(), &cfg.developer_url))
    .await?;
    Ok(())
}
