//! Shared handler helpers
//!
//! Message formatting (captions, reports, welcome texts), HTML send/edit
//! shortcuts, the progress reporter task, and activity tracking.

use crate::constants::{BOT_NAME, SEPARATOR};
use crate::utils;
use activity::{ActivityStats, ActivityStore};
use chrono::Utc;
use downloader::{MediaInfo, MediaKind, Platform, Progress};
use std::time::Duration;
use teloxide::{
    prelude::*,
    types::{MessageId, ParseMode},
    utils::html::escape,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Send an HTML message without link previews
pub async fn send_html(bot: &Bot, chat_id: ChatId, text: &str) -> Result<Message, teloxide::RequestError> {
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .disable_web_page_preview(true)
        .await
}

/// Replace the text of a message with HTML
pub async fn edit_html(bot: &Bot, message: &Message, text: &str) -> Result<Message, teloxide::RequestError> {
    bot.edit_message_text(message.chat.id, message.id, text)
        .parse_mode(ParseMode::Html)
        .disable_web_page_preview(true)
        .await
}

/// Record the sender's activity; failures are logged and swallowed
pub async fn track_activity(msg: Message, store: ActivityStore) {
    let Some(user) = msg.from().filter(|u| !u.is_bot) else {
        return;
    };
    let user_id = user.id.0 as i64;

    match tokio::task::spawn_blocking(move || store.record(user_id, false, Utc::now())).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => tracing::warn!("Failed to record activity for {}: {}", user_id, e),
        Err(e) => tracing::warn!("Activity task failed: {}", e),
    }
}

/// Background task mirroring download progress into a status message
pub struct ProgressReporter {
    handle: JoinHandle<()>,
}

impl ProgressReporter {
    /// Edit `message_id` with rendered progress until stopped
    ///
    /// Edits happen at most once per `interval`; only the latest snapshot is shown.
    pub fn spawn(
        bot: Bot,
        chat_id: ChatId,
        message_id: MessageId,
        mut rx: watch::Receiver<Option<Progress>>,
        interval: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut last_text = String::new();

            while rx.changed().await.is_ok() {
                let snapshot = *rx.borrow_and_update();
                let Some(progress) = snapshot else {
                    continue;
                };

                let text = utils::format_progress(&progress);
                if text != last_text {
                    if let Err(e) = bot.edit_message_text(chat_id, message_id, &text).await {
                        tracing::debug!("Error updating progress: {}", e);
                    }
                    last_text = text;
                }

                tokio::time::sleep(interval).await;
            }
        });
        Self { handle }
    }

    /// Cancel the task and wait until it has finished, so no edit lands afterwards
    pub async fn stop(self) {
        self.handle.abort();
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                tracing::warn!("Progress task failed: {}", e);
            }
        }
    }
}

/// HTML reference to whoever asked for the download
///
/// Users are mentioned by id; anonymous senders fall back to the chat.
pub fn requester_html(
    user: Option<(u64, &str)>,
    chat_title: Option<&str>,
    chat_username: Option<&str>,
) -> String {
    match user {
        Some((id, name)) => format!("<a href=\"tg://user?id={}\">{}</a>", id, escape(name.trim())),
        None => {
            let title = escape(chat_title.unwrap_or("this group"));
            match chat_username {
                Some(username) => format!("<a href=\"https://t.me/{}\">{}</a>", username, title),
                None => title,
            }
        }
    }
}

/// Requester of a message, see [`requester_html`]
pub fn requester_from_message(msg: &Message) -> String {
    let user = msg
        .from()
        .filter(|_| msg.sender_chat().is_none())
        .map(|u| (u.id.0, u.full_name()));

    requester_html(
        user.as_ref().map(|(id, name)| (*id, name.as_str())),
        msg.chat.title(),
        msg.chat.username(),
    )
}

/// Prompt shown when a download command has no usable link
pub fn missing_link_text(platform: Platform, kind: MediaKind) -> String {
    let what = match (platform, kind) {
        (Platform::Instagram, _) => "an Instagram Reels link",
        (Platform::TikTok, _) => "a TikTok video link",
        (Platform::Spotify, _) => "a Spotify track URL",
        (Platform::YouTube, MediaKind::Audio) => "a YouTube link to convert",
        (Platform::YouTube, MediaKind::Video) => "a YouTube video link",
        (Platform::Facebook, _) => "a Facebook video link",
        (Platform::Pinterest, _) => "a Pinterest video link",
    };
    format!("<b>Please provide {} ❌</b>", what)
}

/// Caption for a downloaded video
pub fn video_caption(platform: Platform, info: &MediaInfo, source_url: &str, requester: &str) -> String {
    let url = info.webpage_url.as_deref().unwrap_or(source_url);
    let mut caption = format!(
        "🎥 <b>Title</b>: <b>{}</b>\n{}\n",
        escape(info.title_or_default()),
        SEPARATOR
    );

    if platform.shows_stats() {
        let views = info
            .view_count
            .map(|v| v.to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        caption.push_str(&format!("👁️‍🗨️ <b>Views</b>: <b>{} views</b>\n", views));
    }

    caption.push_str(&format!(
        "🔗 <b>Url</b>: <a href=\"{}\">Watch On {}</a>\n",
        escape(url),
        platform
    ));

    if platform.shows_stats() {
        caption.push_str(&format!(
            "⏱️ <b>Duration</b>: <b>{}</b>\n",
            utils::format_duration(info.duration.unwrap_or(0.0))
        ));
    }

    caption.push_str(&format!("{}\n<b>Downloaded By</b>: {}", SEPARATOR, requester));
    caption
}

/// Caption for an audio file
pub fn audio_caption(title: &str, artist: &str, duration: &str, requester: &str) -> String {
    format!(
        "🎵 <b>Title:</b> <code>{}</code>\n\
        {}\n\
        👤 <b>Artist:</b> <code>{}</code>\n\
        ⏱️ <b>Duration:</b> <code>{}</code>\n\
        {}\n\
        <b>Downloaded By</b> {}",
        escape(title),
        SEPARATOR,
        escape(artist),
        escape(duration),
        SEPARATOR,
        requester
    )
}

/// Usage report for `/stats`
pub fn format_stats(stats: &ActivityStats) -> String {
    format!(
        "<b>📊 Bot Usage Report\n\
        ━━━━━━━━━━━\n\
        🚀 User Engagements:\n\
        - Daily Starts: {}\n\
        - Weekly Starts: {}\n\
        - Monthly Starts: {}\n\
        - Annual Starts: {}\n\n\
        📈 Total Metrics:\n\
        - Total Groups: {}\n\
        - Users Registered: {}</b>",
        stats.daily,
        stats.weekly,
        stats.monthly,
        stats.yearly,
        stats.total_groups,
        stats.total_records
    )
}

/// Welcome message for `/start` and the "Back" button
pub fn welcome_text(full_name: &str, bot_id: u64, updates_url: &str) -> String {
    format!(
        "<b>Hi {}! Welcome To This Bot...</b>\n\
        <b>━━━━━━━━━━━━━━━━━━━━━━━━━━</b>\n\
        <b><a href=\"tg://user?id={}\">{}</a></b>: The ultimate toolkit on Telegram, offering Facebook, Instagram, TikTok, YouTube, Pinterest and Spotify downloads. Simplify your tasks with ease!\n\
        <b>━━━━━━━━━━━━━━━━━━━━━━━━━━</b>\n\
        <b>Don't Forget To <a href=\"{}\">Join Here</a> For Updates!</b>",
        escape(full_name),
        bot_id,
        BOT_NAME,
        escape(updates_url)
    )
}

/// Usage text for `/help` and the "Help" button
pub fn help_text(updates_url: &str) -> String {
    format!(
        "<b>🎥 Social Media and Music Downloader</b>\n\
        ━━━━━━━━━━━━━━━━━━━━━━\n\
        <b>USAGE:</b>\n\
        Download videos and tracks from popular platforms using these commands:\n\n\
        ➢ <b>/fb [Video URL]</b> - Download a Facebook video.\n\
        \u{20}  - Example: <code>/fb https://www.facebook.com/share/v/18VH1yNXoq/</code>\n\
        \u{20}  - Note: Private Facebook videos cannot be downloaded.\n\n\
        ➢ <b>/in [Reel URL]</b> - Download an Instagram reel.\n\
        \u{20}  - Note: 18+ Instagram Reels cannot be downloaded.\n\n\
        ➢ <b>/tt [Video URL]</b> - Download a TikTok video.\n\n\
        ➢ <b>/pin [Video URL]</b> - Download a Pinterest video.\n\
        \u{20}  - Example: <code>/pin https://pin.it/6GoDMRwmE</code>\n\n\
        ➢ <b>/sp [Track URL]</b> - Download a Spotify track.\n\
        \u{20}  - Example: <code>/sp https://open.spotify.com/track/7ouBSPZKQpm7zQz2leJXta</code>\n\n\
        ➢ <b>/yt [Video URL]</b> - Download a YouTube video.\n\
        \u{20}  - Example: <code>/yt https://youtu.be/In8bfGnXavw</code>\n\n\
        ➢ <b>/song [Video URL]</b> - Download a YouTube video as an MP3 file.\n\
        \u{20}  - Example: <code>/song https://youtu.be/In8bfGnXavw</code>\n\n\
        Commands also work with the <code>.</code> and <code>!</code> prefixes.\n\n\
        <b>NOTE:</b> Provide a valid public URL for each platform to download successfully.\n\n\
        🔔 For Bot Update News: <a href=\"{}\">Join Now</a>",
        escape(updates_url)
    )
}

/// Text for the "About Me" button
pub fn about_text(developer_url: &str, updates_url: &str) -> String {
    format!(
        "<b>Name:</b> {}\n\
        <b>Version:</b> {}\n\n\
        <b>Development Team:</b>\n\
        - <b>Creator:</b> <a href=\"{}\">Developer 👨‍💻</a>\n\
        <b>Technical Stack:</b>\n\
        - <b>Language:</b> Rust 🦀\n\
        - <b>Libraries:</b> teloxide, tokio 📚\n\
        - <b>Database:</b> SQLite 🗄\n\n\
        <b>About:</b> {} The ultimate toolkit on Telegram for social media and music downloads.\n\n\
        🔔 For Bot Update News: <a href=\"{}\">Join Now</a>",
        BOT_NAME,
        env!("CARGO_PKG_VERSION"),
        escape(developer_url),
        BOT_NAME,
        escape(updates_url)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> MediaInfo {
        MediaInfo {
            title: Some("Cats & Dogs".into()),
            webpage_url: Some("https://www.tiktok.com/@u/video/1".into()),
            view_count: Some(1200),
            duration: Some(75.0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_progress_reporter_stop_waits_for_task() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let reporter = ProgressReporter {
            handle: tokio::spawn(async move {
                loop {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            }),
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        reporter.stop().await;
        let after_stop = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_requester_html() {
        assert_eq!(
            requester_html(Some((42, "Jo <Admin>")), None, None),
            "<a href=\"tg://user?id=42\">Jo &lt;Admin&gt;</a>"
        );
        assert_eq!(
            requester_html(None, Some("Rustaceans"), Some("rustgroup")),
            "<a href=\"https://t.me/rustgroup\">Rustaceans</a>"
        );
        assert_eq!(requester_html(None, None, None), "this group");
    }

    fn group_message(extra: &str) -> Message {
        let json = format!(
            r#"{{
                "message_id": 7,
                "date": 1700000000,
                "chat": {{"id": -1001234, "type": "supergroup", "title": "Rustaceans", "username": "rustgroup"}},
                "text": "/fb https://fb.watch/abc"{}
            }}"#,
            extra
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_requester_from_user_message() {
        let msg = group_message(r#", "from": {"id": 42, "is_bot": false, "first_name": "Jo"}"#);
        assert_eq!(requester_from_message(&msg), "<a href=\"tg://user?id=42\">Jo</a>");
    }

    #[test]
    fn test_requester_from_anonymous_admin() {
        let msg = group_message(
            r#", "from": {"id": 1087968824, "is_bot": true, "first_name": "Group", "username": "GroupAnonymousBot"},
                "sender_chat": {"id": -1001234, "type": "supergroup", "title": "Rustaceans", "username": "rustgroup"}"#,
        );
        assert_eq!(
            requester_from_message(&msg),
            "<a href=\"https://t.me/rustgroup\">Rustaceans</a>"
        );
    }

    #[test]
    fn test_video_caption_with_stats() {
        let caption = video_caption(Platform::TikTok, &info(), "https://vm.tiktok.com/x", "someone");
        assert!(caption.contains("<b>Cats &amp; Dogs</b>"));
        assert!(caption.contains("<b>1200 views</b>"));
        assert!(caption.contains("Watch On TikTok"));
        assert!(caption.contains("https://www.tiktok.com/@u/video/1"));
        assert!(caption.contains("<b>1:15</b>"));
        assert!(caption.ends_with("<b>Downloaded By</b>: someone"));
    }

    #[test]
    fn test_video_caption_without_stats() {
        let mut info = info();
        info.webpage_url = None;
        let caption = video_caption(Platform::Instagram, &info, "https://instagram.com/reel/x", "me");
        assert!(!caption.contains("Views"));
        assert!(!caption.contains("Duration"));
        assert!(caption.contains("href=\"https://instagram.com/reel/x\""));
    }

    #[test]
    fn test_audio_caption() {
        let caption = audio_caption("Song", "A, B", "3m 35s", "me");
        assert!(caption.contains("<code>Song</code>"));
        assert!(caption.contains("<code>A, B</code>"));
        assert!(caption.contains("<code>3m 35s</code>"));
    }

    #[test]
    fn test_format_stats() {
        let text = format_stats(&ActivityStats {
            daily: 1,
            weekly: 2,
            monthly: 3,
            yearly: 4,
            total_groups: 5,
            total_records: 6,
        });
        assert!(text.contains("- Daily Starts: 1"));
        assert!(text.contains("- Annual Starts: 4"));
        assert!(text.contains("- Total Groups: 5"));
        assert!(text.contains("- Users Registered: 6"));
    }

    #[test]
    fn test_missing_link_text() {
        assert_eq!(
            missing_link_text(Platform::Facebook, MediaKind::Video),
            "<b>Please provide a Facebook video link ❌</b>"
        );
        assert!(missing_link_text(Platform::YouTube, MediaKind::Audio).contains("convert"));
    }

    #[test]
    fn test_welcome_text_escapes_name() {
        let text = welcome_text("<b>x</b>", 7, "https://t.me/updates");
        assert!(text.contains("Hi &lt;b&gt;x&lt;/b&gt;!"));
        assert!(text.contains("tg://user?id=7"));
    }
}
