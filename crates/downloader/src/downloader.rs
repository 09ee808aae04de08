use crate::error::{DownloadError, DownloadResult};
use crate::ffmpeg;
use crate::platform::{MediaKind, Platform};
use crate::progress::ProgressSender;
use crate::spotify::{SpotifyClient, SpotifyCredentials};
use crate::workspace::TempWorkspace;
use crate::ytdlp::{MediaInfo, YtDlp};
use std::path::{Path, PathBuf};
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Settings for [`Downloader`]
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Root directory for per-request workspaces
    pub temp_dir: PathBuf,
    pub ytdlp_bin: String,
    pub ffmpeg_bin: String,
    /// Largest file the bot may upload, in bytes
    pub max_filesize: u64,
    pub spotify: Option<SpotifyCredentials>,
    /// Mirror endpoint resolving Spotify tracks to audio links
    pub spotify_download_api: String,
}

/// Facade over all download backends
#[derive(Clone)]
pub struct Downloader {
    ytdlp: YtDlp,
    ffmpeg_bin: String,
    temp_dir: PathBuf,
    max_filesize: u64,
    spotify: Option<SpotifyClient>,
}

impl Downloader {
    /// Build the downloader and its shared HTTP client
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed
    pub fn new(config: DownloaderConfig) -> DownloadResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(15))
            .build()?;

        let spotify = config
            .spotify
            .map(|creds| SpotifyClient::new(http.clone(), creds, config.spotify_download_api.clone()));

        if spotify.is_none() {
            tracing::warn!("Spotify credentials not set, /sp is disabled");
        }

        Ok(Self {
            ytdlp: YtDlp::new(config.ytdlp_bin, config.max_filesize),
            ffmpeg_bin: config.ffmpeg_bin,
            temp_dir: config.temp_dir,
            max_filesize: config.max_filesize,
            spotify,
        })
    }

    /// Upload limit in bytes
    pub fn max_filesize(&self) -> u64 {
        self.max_filesize
    }

    /// Spotify client, when credentials are configured
    pub fn spotify(&self) -> Option<&SpotifyClient> {
        self.spotify.as_ref()
    }

    /// Create a scratch directory for one request
    pub async fn workspace(&self, key: &str) -> std::io::Result<TempWorkspace> {
        TempWorkspace::create(&self.temp_dir, key).await
    }

    /// Download a video or audio through yt-dlp into `workspace`
    ///
    /// The returned info's path points at the file ready for upload.
    pub async fn fetch_media(
        &self,
        url: &str,
        workspace: &TempWorkspace,
        platform: Platform,
        kind: MediaKind,
        progress: &ProgressSender,
    ) -> DownloadResult<MediaInfo> {
        let mut info = self
            .ytdlp
            .download(url, workspace.path(), platform, kind, progress)
            .await?;

        let path = info.path().map(Path::to_path_buf).ok_or(DownloadError::NoOutput)?;
        let path = if platform.needs_remux() && kind == MediaKind::Video {
            ffmpeg::remux(&self.ffmpeg_bin, &path).await
        } else {
            path
        };

        self.ensure_within_limit(&path).await?;
        info.filepath = Some(path);
        Ok(info)
    }

    /// Fail with [`DownloadError::TooLarge`] if `path` exceeds the upload limit
    pub async fn ensure_within_limit(&self, path: &Path) -> DownloadResult<u64> {
        let size = tokio::fs::metadata(path).await?.len();
        if size > self.max_filesize {
            return Err(DownloadError::TooLarge {
                size,
                limit: self.max_filesize,
            });
        }
        Ok(size)
    }
}
