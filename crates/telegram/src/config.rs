//! Environment-driven bot configuration

use crate::constants::MAX_UPLOAD_SIZE;
use crate::error::{BotError, BotResult};
use downloader::{DownloaderConfig, SpotifyCredentials};
use std::path::PathBuf;

const DEFAULT_DATABASE_PATH: &str = "user_activity.db";
const DEFAULT_TEMP_DIR: &str = "temp";
const DEFAULT_SPOTIFY_DOWNLOAD_API: &str = "https://tele-social.vercel.app/down";
const DEFAULT_UPDATES_URL: &str = "https://t.me/ModVipRM";
const DEFAULT_DEVELOPER_URL: &str = "https://t.me/abirxdhackz";

/// Settings read from the environment at start-up
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    /// Telegram user ids allowed to use admin commands
    pub admin_ids: Vec<u64>,
    pub database_path: PathBuf,
    pub temp_dir: PathBuf,
    pub ytdlp_bin: String,
    pub ffmpeg_bin: String,
    pub spotify: Option<SpotifyCredentials>,
    pub spotify_download_api: String,
    /// Channel linked from "Updates" buttons
    pub updates_url: String,
    /// Profile linked from "Developer" buttons
    pub developer_url: String,
    /// Emit console logs as JSON
    pub log_json: bool,
}

impl BotConfig {
    /// Read configuration from process environment variables
    ///
    /// # Errors
    /// Returns an error if the token is missing or `ADMIN_IDS` is malformed
    pub fn from_env() -> BotResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(get: F) -> BotResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let bot_token = var("BOT_TOKEN")
            .or_else(|| var("TELOXIDE_TOKEN"))
            .ok_or_else(|| BotError::Config("BOT_TOKEN is not set".to_string()))?;

        let admin_ids = match var("ADMIN_IDS") {
            Some(raw) => parse_admin_ids(&raw)?,
            None => Vec::new(),
        };

        let spotify = match (var("SPOTIFY_CLIENT_ID"), var("SPOTIFY_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(SpotifyCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        Ok(Self {
            bot_token,
            admin_ids,
            database_path: PathBuf::from(or("DATABASE_PATH", DEFAULT_DATABASE_PATH)),
            temp_dir: PathBuf::from(or("TEMP_DIR", DEFAULT_TEMP_DIR)),
            ytdlp_bin: or("YTDLP_BIN", "yt-dlp"),
            ffmpeg_bin: or("FFMPEG_BIN", "ffmpeg"),
            spotify,
            spotify_download_api: or("SPOTIFY_DOWNLOAD_API", DEFAULT_SPOTIFY_DOWNLOAD_API),
            updates_url: or("UPDATES_URL", DEFAULT_UPDATES_URL),
            developer_url: or("DEVELOPER_URL", DEFAULT_DEVELOPER_URL),
            log_json: var("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }

    /// Whether `user_id` may run admin commands
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// Settings for the download backends
    pub fn downloader_config(&self) -> DownloaderConfig {
        DownloaderConfig {
            temp_dir: self.temp_dir.clone(),
            ytdlp_bin: self.ytdlp_bin.clone(),
            ffmpeg_bin: self.ffmpeg_bin.clone(),
            max_filesize: MAX_UPLOAD_SIZE,
            spotify: self.spotify.clone(),
            spotify_download_api: self.spotify_download_api.clone(),
        }
    }
}

/// Parse a comma-separated list of user ids, skipping blanks
pub fn parse_admin_ids(raw: &str) -> BotResult<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .map_err(|_| BotError::Config(format!("invalid admin id in ADMIN_IDS: {}", s)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_admin_ids() {
        assert_eq!(parse_admin_ids("1,2, 3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_admin_ids(" 443809517 ,").unwrap(), vec![443809517]);
        assert!(parse_admin_ids("").unwrap().is_empty());
        assert!(parse_admin_ids("12,abc").is_err());
        assert!(parse_admin_ids("-5").is_err());
    }

    #[test]
    fn test_defaults() {
        let cfg = BotConfig::from_lookup(lookup(&[("BOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(cfg.bot_token, "123:abc");
        assert!(cfg.admin_ids.is_empty());
        assert_eq!(cfg.database_path, PathBuf::from("user_activity.db"));
        assert_eq!(cfg.temp_dir, PathBuf::from("temp"));
        assert_eq!(cfg.ytdlp_bin, "yt-dlp");
        assert!(cfg.spotify.is_none());
        assert!(!cfg.log_json);
        assert!(!cfg.is_admin(1));
    }

    #[test]
    fn test_missing_token() {
        assert!(BotConfig::from_lookup(lookup(&[])).is_err());
        assert!(BotConfig::from_lookup(lookup(&[("BOT_TOKEN", "   ")])).is_err());

        let cfg = BotConfig::from_lookup(lookup(&[("TELOXIDE_TOKEN", "t")])).unwrap();
        assert_eq!(cfg.bot_token, "t");
    }

    #[test]
    fn test_full_config() {
        let cfg = BotConfig::from_lookup(lookup(&[
            ("BOT_TOKEN", "t"),
            ("ADMIN_IDS", "10,20"),
            ("SPOTIFY_CLIENT_ID", "id"),
            ("SPOTIFY_CLIENT_SECRET", "secret"),
            ("TEMP_DIR", "/tmp/media"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert!(cfg.is_admin(20));
        assert!(!cfg.is_admin(30));
        assert_eq!(
            cfg.spotify,
            Some(SpotifyCredentials {
                client_id: "id".into(),
                client_secret: "secret".into()
            })
        );
        assert!(cfg.log_json);

        let dl = cfg.downloader_config();
        assert_eq!(dl.temp_dir, PathBuf::from("/tmp/media"));
        assert_eq!(dl.max_filesize, MAX_UPLOAD_SIZE);
    }

    #[test]
    fn test_spotify_requires_both_credentials() {
        let cfg = BotConfig::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("SPOTIFY_CLIENT_ID", "id")]))
            .unwrap();
        assert!(cfg.spotify.is_none());
    }
}
