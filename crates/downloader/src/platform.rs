//! Supported media platforms and their yt-dlp profiles

use std::fmt;

/// A platform the bot can fetch from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Facebook,
    Instagram,
    TikTok,
    YouTube,
    Pinterest,
    Spotify,
}

/// What the user asked to receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Audio,
}

impl Platform {
    /// Human readable platform name used in captions
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
            Platform::TikTok => "TikTok",
            Platform::YouTube => "YouTube",
            Platform::Pinterest => "Pinterest",
            Platform::Spotify => "Spotify",
        }
    }

    /// yt-dlp arguments selecting format and post-processing
    ///
    /// Spotify is not handled by yt-dlp and yields no arguments.
    pub fn ytdlp_args(&self, kind: MediaKind) -> Vec<&'static str> {
        if kind == MediaKind::Audio {
            return vec![
                "-f",
                "bestaudio/best",
                "--extract-audio",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "0",
            ];
        }

        match self {
            Platform::Facebook => vec![
                "-f",
                "bestvideo+bestaudio/best",
                "--merge-output-format",
                "mp4",
            ],
            Platform::YouTube => vec![
                "-f",
                "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
                "--merge-output-format",
                "mp4",
            ],
            Platform::TikTok => vec!["-f", "best[ext=mp4]/best"],
            Platform::Instagram | Platform::Pinterest => vec!["-f", "best"],
            Platform::Spotify => Vec::new(),
        }
    }

    /// Whether the merged file should be remuxed to repair container metadata
    pub fn needs_remux(&self) -> bool {
        matches!(self, Platform::Facebook)
    }

    /// Whether captions include view count and duration
    pub fn shows_stats(&self) -> bool {
        matches!(
            self,
            Platform::Facebook | Platform::TikTok | Platform::YouTube
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_profile_extracts_mp3() {
        let args = Platform::YouTube.ytdlp_args(MediaKind::Audio);
        assert!(args.contains(&"--extract-audio"));
        assert!(args.contains(&"mp3"));
    }

    #[test]
    fn test_video_profiles() {
        let fb = Platform::Facebook.ytdlp_args(MediaKind::Video);
        assert_eq!(fb[1], "bestvideo+bestaudio/best");
        assert!(fb.contains(&"--merge-output-format"));

        let ig = Platform::Instagram.ytdlp_args(MediaKind::Video);
        assert_eq!(ig, vec!["-f", "best"]);

        assert!(Platform::Spotify.ytdlp_args(MediaKind::Video).is_empty());
    }

    #[test]
    fn test_caption_flags() {
        assert!(Platform::Facebook.needs_remux());
        assert!(!Platform::TikTok.needs_remux());
        assert!(Platform::TikTok.shows_stats());
        assert!(!Platform::Instagram.shows_stats());
        assert!(!Platform::Pinterest.shows_stats());
    }
}
