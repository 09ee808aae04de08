//! Utility functions for formatting and parsing

use crate::constants::COMMAND_PREFIXES;
use downloader::Progress;

/// Number of cells in the textual progress bar
const PROGRESS_BAR_CELLS: usize = 20;

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes = bytes as f64;
    let unit_index = (bytes.ln() / 1024_f64.ln()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes / 1024_f64.powi(unit_index as i32);
    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Format speed (bytes/sec) in MB/s
pub fn format_speed(bytes_per_sec: f64) -> String {
    format!("{:.2} MB/s", bytes_per_sec / 1024.0 / 1024.0)
}

/// Format a duration in seconds as `m:ss`
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Format a duration in milliseconds as `Xm Ys`
pub fn format_duration_ms(ms: u64) -> String {
    let seconds = ms / 1000;
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Render a 20-cell bar for a percentage
pub fn progress_bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 5.0) as usize).min(PROGRESS_BAR_CELLS);
    format!(
        "{}{}",
        "▓".repeat(filled),
        "░".repeat(PROGRESS_BAR_CELLS - filled)
    )
}

/// Render a progress snapshot for the status message
pub fn format_progress(progress: &Progress) -> String {
    let percent = progress.percent().unwrap_or(0.0);
    let total = progress
        .total
        .map(format_bytes)
        .unwrap_or_else(|| "?".to_string());

    format!(
        "📥 Download Progress 📥\n\n\
        {}\n\n\
        🚧 Percentage: {:.2}%\n\
        ⚡️ Speed: {}\n\
        📶 Downloaded: {} of {}",
        progress_bar(percent),
        percent,
        format_speed(progress.speed.unwrap_or(0.0)),
        format_bytes(progress.downloaded),
        total
    )
}

/// Map command aliases onto their canonical names
pub fn canonical_command(name: &str) -> &str {
    match name {
        "send" => "broadcast",
        "report" | "status" => "stats",
        "reboot" | "reload" => "restart",
        other => other,
    }
}

/// Rewrite a command with any accepted prefix into `/name args` form
///
/// Returns `None` when the text is not a command.
pub fn normalize_command(text: &str) -> Option<String> {
    let mut chars = text.chars();
    let prefix = chars.next()?;
    if !COMMAND_PREFIXES.contains(&prefix) {
        return None;
    }

    let rest = chars.as_str();
    let split = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let (head, tail) = rest.split_at(split);
    let (name, mention) = match head.split_once('@') {
        Some((name, mention)) => (name, Some(mention)),
        None => (head, None),
    };

    if name.is_empty() {
        return None;
    }

    let name = name.to_lowercase();
    let mut normalized = format!("/{}", canonical_command(&name));
    if let Some(mention) = mention {
        normalized.push('@');
        normalized.push_str(mention);
    }
    normalized.push_str(tail);
    Some(normalized)
}

/// Whether `text` starts like a command: a prefix followed by a word
///
/// Unlike [`normalize_command`], punctuation such as `!!!` does not count.
pub fn looks_like_command(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(prefix) = chars.next() else {
        return false;
    };
    if !COMMAND_PREFIXES.contains(&prefix) {
        return false;
    }

    let rest = chars.as_str();
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '@')
        .unwrap_or(rest.len());
    let name = &rest[..end];
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Tail of `text` fitting in `max_units` UTF-16 code units, starting on a
/// line boundary when possible
///
/// Telegram measures message length in UTF-16 code units.
pub fn tail_utf16(text: &str, max_units: usize) -> &str {
    let mut units = 0;
    let mut start = text.len();
    for (i, c) in text.char_indices().rev() {
        units += c.len_utf16();
        if units > max_units {
            break;
        }
        start = i;
    }

    if start == 0 {
        return text;
    }

    let tail = &text[start..];
    match tail.find('\n') {
        Some(nl) if nl + 1 < tail.len() => &tail[nl + 1..],
        _ => tail,
    }
}
