//! Download commands (/fb, /in, /tt, /pin, /yt, /song, /sp)
//!
//! Every request follows the same shape: throttle, extract the link, post a
//! status message, download into a private workspace while the status shows
//! progress, then upload and remove the status. Failures replace the status
//! text instead.

use crate::constants::{text, PROGRESS_INTERVAL_SECS, SPOTIFY_PROGRESS_INTERVAL_SECS};
use crate::error::{BotError, UserMessage};
use crate::handlers;
use crate::rate_limit;
use crate::types::HandlerResult;
use crate::utils;
use downloader::{
    extract_url, progress, sanitize_filename, spotify_track_id, DownloadError, Downloader,
    MediaKind, Platform, SpotifyClient, TempWorkspace,
};
use std::time::Duration;
use teloxide::{
    prelude::*,
    types::{InputFile, ParseMode},
    utils::html::escape,
    RequestError,
};

/// Telegram rejects audio thumbnails above 200 KB
const MAX_THUMB_SIZE: u64 = 200 * 1024;

/// Why a request ended without an upload
enum Abort {
    /// Expected outcome with a fixed reply
    Notice(&'static str),
    Failed(BotError),
}

impl From<BotError> for Abort {
    fn from(err: BotError) -> Self {
        Abort::Failed(err)
    }
}

impl From<DownloadError> for Abort {
    fn from(err: DownloadError) -> Self {
        Abort::Failed(err.into())
    }
}

impl From<RequestError> for Abort {
    fn from(err: RequestError) -> Self {
        Abort::Failed(err.into())
    }
}

impl From<std::io::Error> for Abort {
    fn from(err: std::io::Error) -> Self {
        Abort::Failed(DownloadError::from(err).into())
    }
}

/// Download a Facebook video
pub async fn facebook(bot: Bot, msg: Message, downloader: Downloader, args: String) -> HandlerResult {
    ytdlp_command(bot, msg, downloader, args, Platform::Facebook, MediaKind::Video).await
}

/// Download an Instagram reel
pub async fn instagram(bot: Bot, msg: Message, downloader: Downloader, args: String) -> HandlerResult {
    ytdlp_command(bot, msg, downloader, args, Platform::Instagram, MediaKind::Video).await
}

/// Download a TikTok video
pub async fn tiktok(bot: Bot, msg: Message, downloader: Downloader, args: String) -> HandlerResult {
    ytdlp_command(bot, msg, downloader, args, Platform::TikTok, MediaKind::Video).await
}

/// Download a Pinterest video
pub async fn pinterest(bot: Bot, msg: Message, downloader: Downloader, args: String) -> HandlerResult {
    ytdlp_command(bot, msg, downloader, args, Platform::Pinterest, MediaKind::Video).await
}

/// Download a YouTube video
pub async fn youtube(bot: Bot, msg: Message, downloader: Downloader, args: String) -> HandlerResult {
    ytdlp_command(bot, msg, downloader, args, Platform::YouTube, MediaKind::Video).await
}

/// Download a YouTube video as MP3
pub async fn song(bot: Bot, msg: Message, downloader: Downloader, args: String) -> HandlerResult {
    ytdlp_command(bot, msg, downloader, args, Platform::YouTube, MediaKind::Audio).await
}

/// Download a Spotify track through the mirror service
pub async fn spotify(bot: Bot, msg: Message, downloader: Downloader, args: String) -> HandlerResult {
    if !allow_request(&bot, &msg).await? {
        return Ok(());
    }

    let Some(client) = downloader.spotify().cloned() else {
        handlers::send_html(&bot, msg.chat.id, text::SPOTIFY_DISABLED).await?;
        return Ok(());
    };

    let Some(url) = extract_url(&args).map(str::to_string) else {
        let prompt = handlers::missing_link_text(Platform::Spotify, MediaKind::Audio);
        handlers::send_html(&bot, msg.chat.id, &prompt).await?;
        return Ok(());
    };

    let status = handlers::send_html(&bot, msg.chat.id, text::SEARCHING_MUSIC).await?;
    let result = send_spotify_track(&bot, &msg, &status, &downloader, &client, &url).await;
    finish(&bot, &status, result).await
}

async fn ytdlp_command(
    bot: Bot,
    msg: Message,
    downloader: Downloader,
    args: String,
    platform: Platform,
    kind: MediaKind,
) -> HandlerResult {
    if !allow_request(&bot, &msg).await? {
        return Ok(());
    }

    let Some(url) = extract_url(&args).map(str::to_string) else {
        let prompt = handlers::missing_link_text(platform, kind);
        handlers::send_html(&bot, msg.chat.id, &prompt).await?;
        return Ok(());
    };

    tracing::info!("{} {:?} request from chat {}: {}", platform, kind, msg.chat.id, url);
    let searching = match kind {
        MediaKind::Video => text::SEARCHING_VIDEO,
        MediaKind::Audio => text::SEARCHING_MUSIC,
    };
    let status = handlers::send_html(&bot, msg.chat.id, searching).await?;
    let result = send_ytdlp_media(&bot, &msg, &status, &downloader, &url, platform, kind).await;
    finish(&bot, &status, result).await
}

/// Apply the per-user throttle, replying when the user is too fast
async fn allow_request(bot: &Bot, msg: &Message) -> Result<bool, RequestError> {
    let Some(user) = msg.from() else {
        return Ok(true);
    };

    if rate_limit::check_rate_limit(user.id.0) {
        return Ok(true);
    }

    tracing::debug!("Rate limited user: {}", user.id);
    bot.send_message(msg.chat.id, text::RATE_LIMITED).await?;
    Ok(false)
}

/// Workspace directory name, unique per request
fn workspace_key(msg: &Message) -> String {
    format!("{}_{}", msg.chat.id.0, msg.id.0)
}

/// Remove the status on success, otherwise show why the request stopped
async fn finish(bot: &Bot, status: &Message, result: Result<(), Abort>) -> HandlerResult {
    match result {
        Ok(()) => {
            if let Err(e) = bot.delete_message(status.chat.id, status.id).await {
                tracing::debug!("Could not delete status message: {}", e);
            }
        }
        Err(Abort::Notice(notice)) => {
            handlers::edit_html(bot, status, notice).await?;
        }
        Err(Abort::Failed(e)) => {
            tracing::error!("Download in chat {} failed: {}", status.chat.id, e);
            let reply = format!("{}\n{}", text::DOWNLOAD_ERROR, escape(&e.user_message()));
            handlers::edit_html(bot, status, &reply).await?;
        }
    }
    Ok(())
}

async fn send_ytdlp_media(
    bot: &Bot,
    msg: &Message,
    status: &Message,
    downloader: &Downloader,
    url: &str,
    platform: Platform,
    kind: MediaKind,
) -> Result<(), Abort> {
    let workspace = downloader.workspace(&workspace_key(msg)).await?;

    let (tx, rx) = progress::channel();
    let reporter = handlers::ProgressReporter::spawn(
        bot.clone(),
        status.chat.id,
        status.id,
        rx,
        Duration::from_secs(PROGRESS_INTERVAL_SECS),
    );
    let fetched = downloader.fetch_media(url, &workspace, platform, kind, &tx).await;
    reporter.stop().await;
    let info = fetched?;

    let path = info.path().ok_or(DownloadError::NoOutput)?.to_path_buf();
    handlers::edit_html(bot, status, text::UPLOADING).await?;
    let requester = handlers::requester_from_message(msg);
    let chat_id = msg.chat.id;

    match kind {
        MediaKind::Video => {
            let caption = handlers::video_caption(platform, &info, url, &requester);
            let mut request = bot
                .send_video(chat_id, InputFile::file(path))
                .caption(caption)
                .parse_mode(ParseMode::Html)
                .supports_streaming(true);
            if let Some(duration) = info.duration {
                request = request.duration(duration as u32);
            }
            if let (Some(width), Some(height)) = (info.width, info.height) {
                request = request.width(width).height(height);
            }
            request.await?;
        }
        MediaKind::Audio => {
            let title = info.title_or_default();
            let artist = info.uploader.as_deref().unwrap_or("Unknown Artist");
            let duration = utils::format_duration(info.duration.unwrap_or(0.0));
            let caption = handlers::audio_caption(title, artist, &duration, &requester);
            let file = InputFile::file(path).file_name(format!("{}.mp3", sanitize_filename(title)));

            let mut request = bot
                .send_audio(chat_id, file)
                .caption(caption)
                .parse_mode(ParseMode::Html)
                .title(title)
                .performer(artist);
            if let Some(duration) = info.duration {
                request = request.duration(duration as u32);
            }
            request.await?;
        }
    }

    tracing::info!("Uploaded {} {:?} to chat {}", platform, kind, chat_id);
    Ok(())
}

async fn send_spotify_track(
    bot: &Bot,
    msg: &Message,
    status: &Message,
    downloader: &Downloader,
    client: &SpotifyClient,
    url: &str,
) -> Result<(), Abort> {
    let track_id = spotify_track_id(url).ok_or(Abort::Notice(text::SPOTIFY_INVALID))?;

    let track = match client.track(&track_id).await {
        Ok(track) => track,
        Err(e) => {
            tracing::warn!("Spotify lookup for {} failed: {}", track_id, e);
            return Err(Abort::Notice(text::SPOTIFY_NOT_FOUND));
        }
    };

    let link = client
        .resolve_audio_link(url)
        .await?
        .ok_or(Abort::Notice(text::SPOTIFY_INVALID))?;

    let workspace = downloader.workspace(&workspace_key(msg)).await?;
    let cover = fetch_cover(client, &workspace, track.cover_url()).await;
    let audio_path = workspace.file(&format!("{}.mp3", sanitize_filename(&track.name)));

    let (tx, rx) = progress::channel();
    let reporter = handlers::ProgressReporter::spawn(
        bot.clone(),
        status.chat.id,
        status.id,
        rx,
        Duration::from_secs(SPOTIFY_PROGRESS_INTERVAL_SECS),
    );
    let fetched = client
        .fetch_to_file(&link, &audio_path, downloader.max_filesize(), Some(&tx))
        .await;
    reporter.stop().await;
    fetched?;

    handlers::edit_html(bot, status, text::UPLOADING).await?;
    let artists = track.artist_names();
    let caption = handlers::audio_caption(
        &track.name,
        &artists,
        &utils::format_duration_ms(track.duration_ms),
        &handlers::requester_from_message(msg),
    );

    let mut request = bot
        .send_audio(msg.chat.id, InputFile::file(audio_path))
        .caption(caption)
        .parse_mode(ParseMode::Html)
        .title(track.name.as_str())
        .performer(artists.as_str())
        .duration((track.duration_ms / 1000) as u32);
    if let Some(cover) = cover {
        request = request.thumb(InputFile::file(cover));
    }
    request.await?;

    tracing::info!("Uploaded Spotify track {} to chat {}", track_id, msg.chat.id);
    Ok(())
}

/// Download the album cover for use as the audio thumbnail, if any
async fn fetch_cover(
    client: &SpotifyClient,
    workspace: &TempWorkspace,
    cover_url: Option<&str>,
) -> Option<std::path::PathBuf> {
    let url = cover_url?;
    let path = workspace.file("cover.jpg");

    match client.fetch_to_file(url, &path, MAX_THUMB_SIZE, None).await {
        Ok(_) => Some(path),
        Err(e) => {
            tracing::debug!("Cover download failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_conversions() {
        assert!(matches!(
            Abort::from(DownloadError::NoOutput),
            Abort::Failed(BotError::DownloadError(DownloadError::NoOutput))
        ));

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert!(matches!(
            Abort::from(io),
            Abort::Failed(BotError::DownloadError(_))
        ));
    }
}
