//! Media download adapters
//!
//! This crate wraps the external tools the bot relays to: yt-dlp for
//! video/audio sites, ffmpeg for container fixes, and the Spotify Web API
//! plus a mirror service for tracks. It handles temp workspaces, progress
//! reporting, and error logging.

pub mod downloader;
pub mod error;
pub mod ffmpeg;
pub mod platform;
pub mod progress;
pub mod spotify;
pub mod utils;
pub mod workspace;
pub mod ytdlp;

pub use downloader::{Downloader, DownloaderConfig};
pub use error::{DownloadError, DownloadResult};
pub use platform::{MediaKind, Platform};
pub use progress::{Progress, ProgressSender};
pub use spotify::{SpotifyClient, SpotifyCredentials, Track};
pub use utils::{extract_url, sanitize_filename, spotify_track_id};
pub use workspace::TempWorkspace;
pub use ytdlp::{MediaInfo, YtDlp};
