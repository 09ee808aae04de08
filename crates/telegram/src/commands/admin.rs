//! Admin commands (broadcast, stats, logs, restart)
//!
//! All of them check the sender against `ADMIN_IDS` first and answer
//! everyone else with a fixed refusal.

use crate::broadcast;
use crate::config::BotConfig;
use crate::constants::{text, MAX_MESSAGE_LEN};
use crate::handlers;
use crate::keyboards;
use crate::logs::LogBuffer;
use crate::types::{HandlerResult, MyDialogue, State};
use crate::utils;
use activity::ActivityStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use teloxide::{
    prelude::*,
    types::{InputFile, ParseMode},
};

/// Pause between the restart notice and its confirmation
const RESTART_NOTICE_DELAY: Duration = Duration::from_secs(2);

/// Header of the `/logs` reply
const LOGS_HEADER: &str = "📜 Latest Logs:\n\n";

/// Reply to a non-admin, returns `true` when the sender may proceed
async fn ensure_admin(bot: &Bot, msg: &Message, cfg: &BotConfig) -> Result<bool, teloxide::RequestError> {
    if msg.from().is_some_and(|u| cfg.is_admin(u.id.0)) {
        return Ok(true);
    }

    tracing::warn!(
        "Unauthorized admin command from {:?} in chat {}",
        msg.from().map(|u| u.id),
        msg.chat.id
    );
    bot.send_message(msg.chat.id, text::NOT_AUTHORIZED)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboards::unauthorized_keyboard(&cfg.developer_url, &cfg.updates_url))
        .await?;
    Ok(false)
}

/// Broadcast the replied-to message, or ask the admin for one
pub async fn broadcast(
    bot: Bot,
    dialogue: MyDialogue,
    msg: Message,
    cfg: Arc<BotConfig>,
    store: ActivityStore,
) -> HandlerResult {
    if !ensure_admin(&bot, &msg, &cfg).await? {
        return Ok(());
    }

    if let Some(reply) = msg.reply_to_message() {
        return run_broadcast(&bot, reply, &cfg, store).await;
    }

    handlers::send_html(&bot, msg.chat.id, text::BROADCAST_PROMPT).await?;
    dialogue.update(State::AwaitBroadcast).await?;
    Ok(())
}

/// Deliver the admin's next message to every recorded chat
pub async fn receive_broadcast(
    bot: Bot,
    dialogue: MyDialogue,
    msg: Message,
    cfg: Arc<BotConfig>,
    store: ActivityStore,
) -> HandlerResult {
    dialogue.exit().await?;
    run_broadcast(&bot, &msg, &cfg, store).await
}

/// Reply to an unknown command while a broadcast payload is awaited
pub async fn broadcast_pending(bot: Bot, msg: Message) -> HandlerResult {
    handlers::send_html(&bot, msg.chat.id, text::BROADCAST_PENDING).await?;
    Ok(())
}

async fn run_broadcast(bot: &Bot, payload: &Message, cfg: &BotConfig, store: ActivityStore) -> HandlerResult {
    let chat_id = payload.chat.id;
    let processing = handlers::send_html(bot, chat_id, text::BROADCAST_PROCESSING).await?;
    let recipients = tokio::task::spawn_blocking(move || store.recipients()).await??;

    let started = Instant::now();
    let report = broadcast::deliver(
        bot,
        chat_id,
        payload.id,
        &recipients,
        keyboards::updates_keyboard("Update Channel", &cfg.updates_url),
    )
    .await;

    if let Err(e) = bot.delete_message(chat_id, processing.id).await {
        tracing::debug!("Could not delete broadcast status: {}", e);
    }
    handlers::send_html(bot, chat_id, &report.summary(started.elapsed())).await?;
    Ok(())
}

/// Show the usage report
pub async fn stats(bot: Bot, msg: Message, cfg: Arc<BotConfig>, store: ActivityStore) -> HandlerResult {
    if !ensure_admin(&bot, &msg, &cfg).await? {
        return Ok(());
    }

    let stats = tokio::task::spawn_blocking(move || store.stats(Utc::now())).await??;
    bot.send_message(msg.chat.id, handlers::format_stats(&stats))
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboards::updates_keyboard("📢 Updates Channel", &cfg.updates_url))
        .await?;
    Ok(())
}

/// Show the tail of the captured logs, attaching the full buffer when truncated
pub async fn logs(bot: Bot, msg: Message, cfg: Arc<BotConfig>, log_buffer: LogBuffer) -> HandlerResult {
    if !ensure_admin(&bot, &msg, &cfg).await? {
        return Ok(());
    }

    let loading = handlers::send_html(&bot, msg.chat.id, text::LOGS_LOADING).await?;
    let snapshot = log_buffer.snapshot();
    let (body, truncated) = logs_reply_body(&snapshot);

    bot.edit_message_text(msg.chat.id, loading.id, format!("{}{}", LOGS_HEADER, body))
        .reply_markup(keyboards::close_logs_keyboard())
        .await?;

    if truncated {
        bot.send_document(
            msg.chat.id,
            InputFile::memory(snapshot.into_bytes()).file_name("botlog.txt"),
        )
        .await?;
    }
    Ok(())
}

/// Text shown under the logs header and whether it was cut short
fn logs_reply_body(snapshot: &str) -> (&str, bool) {
    let logs = snapshot.trim();
    if logs.is_empty() {
        return (text::LOGS_EMPTY, false);
    }

    let body = utils::tail_utf16(logs, MAX_MESSAGE_LEN - LOGS_HEADER.encode_utf16().count());
    (body, body.len() < logs.len())
}

/// Restart the bot process in place
pub async fn restart(bot: Bot, msg: Message, cfg: Arc<BotConfig>, update: Update) -> HandlerResult {
    if !ensure_admin(&bot, &msg, &cfg).await? {
        return Ok(());
    }

    let notice = handlers::send_html(&bot, msg.chat.id, text::RESTARTING).await?;
    tokio::time::sleep(RESTART_NOTICE_DELAY).await;
    handlers::edit_html(&bot, &notice, text::STARTED).await?;

    // Confirm this update so the new process does not receive /restart again
    if let Err(e) = bot.get_updates().offset(update.id + 1).limit(1).timeout(0).await {
        tracing::warn!("Could not acknowledge restart update: {}", e);
    }

    tracing::info!("Restart requested by {:?}", msg.from().map(|u| u.id));
    let err = restart_process();
    tracing::error!("Restart failed: {}", err);
    handlers::send_html(&bot, msg.chat.id, &format!("<b>❌ Restart failed:</b> {}", err)).await?;
    Ok(())
}

/// Replace the current process with a fresh copy of itself
///
/// Only returns on failure.
#[cfg(unix)]
fn restart_process() -> std::io::Error {
    use std::os::unix::process::CommandExt;

    let exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(e) => return e,
    };
    std::process::Command::new(exe)
        .args(std::env::args_os().skip(1))
        .exec()
}

#[cfg(not(unix))]
fn restart_process() -> std::io::Error {
    let exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(e) => return e,
    };
    match std::process::Command::new(exe)
        .args(std::env::args_os().skip(1))
        .spawn()
    {
        Ok(_) => std::process::exit(0),
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logs_reply_body_empty() {
        assert_eq!(logs_reply_body("  \n"), (text::LOGS_EMPTY, false));
    }

    #[test]
    fn test_logs_reply_body_short() {
        let (body, truncated) = logs_reply_body("INFO a\nINFO b\n");
        assert_eq!(body, "INFO a\nINFO b");
        assert!(!truncated);
    }

    #[test]
    fn test_logs_reply_body_truncates_to_message_limit() {
        let logs: String = (0..1000).map(|i| format!("INFO line {}\n", i)).collect();
        let (body, truncated) = logs_reply_body(&logs);
        assert!(truncated);
        assert!(body.encode_utf16().count() + LOGS_HEADER.encode_utf16().count() <= MAX_MESSAGE_LEN);
        assert!(body.ends_with("INFO line 999"));
        assert!(body.starts_with("INFO line"));
    }

    #[test]
    fn test_logs_reply_body_counts_utf16_units() {
        let logs: String = (0..2000)
            .map(|i| format!("INFO Downloaded 🎵🎶🎵 {}\n", i))
            .collect();
        let (body, truncated) = logs_reply_body(&logs);
        assert!(truncated);
        let message = format!("{}{}", LOGS_HEADER, body);
        assert!(message.encode_utf16().count() <= MAX_MESSAGE_LEN);
        assert!(body.ends_with("🎵 1999"));
    }
}
