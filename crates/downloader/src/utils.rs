//! Utility functions for links and filenames

use reqwest::Url;

/// Maximum length (in characters) of a sanitized filename stem
const MAX_FILENAME_CHARS: usize = 50;

/// Extract the URL argument from command arguments
///
/// Only the first whitespace-separated token is considered and it must be an
/// absolute `http` or `https` URL with a host.
pub fn extract_url(args: &str) -> Option<&str> {
    let candidate = args.split_whitespace().next()?;
    let url = Url::parse(candidate).ok()?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(candidate),
        _ => None,
    }
}

/// Extract the track id from a Spotify track link
///
/// Handles `https://open.spotify.com/track/<id>?si=...` and the localized
/// `https://open.spotify.com/intl-de/track/<id>` form.
pub fn spotify_track_id(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    if !url.host_str()?.ends_with("spotify.com") {
        return None;
    }

    let mut segments = url.path_segments()?;
    segments.find(|s| *s == "track")?;
    let id = segments.next()?;

    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(id.to_string())
    } else {
        None
    }
}

/// Turn a media title into a safe filename stem
pub fn sanitize_filename(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .filter(|c| !c.is_control())
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .take(MAX_FILENAME_CHARS)
        .collect();

    let cleaned = cleaned.trim_matches(|c| c == '_' || c == '.').to_string();
    if cleaned.is_empty() {
        "media".to_string()
    } else {
        cleaned
    }
}
