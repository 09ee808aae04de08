//! Download progress snapshots
//!
//! Producers publish the latest snapshot on a `watch` channel; the bot side
//! decides how often to render it.

use tokio::sync::watch;

/// Channel end used by downloaders to publish progress
pub type ProgressSender = watch::Sender<Option<Progress>>;

/// A point-in-time view of a running download
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Bytes received so far
    pub downloaded: u64,
    /// Expected size, when known
    pub total: Option<u64>,
    /// Current speed in bytes per second, when known
    pub speed: Option<f64>,
}

impl Progress {
    /// Completion percentage in `0.0..=100.0`, if the total is known
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => {
                Some((self.downloaded as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
            }
            _ => None,
        }
    }
}

/// Create a progress channel with no snapshot yet
pub fn channel() -> (ProgressSender, watch::Receiver<Option<Progress>>) {
    watch::channel(None)
}

/// Parse a yt-dlp `--newline` progress line
///
/// Example: `[download]  45.2% of ~ 10.00MiB at  500.00KiB/s ETA 00:10`
pub fn parse_ytdlp_line(line: &str) -> Option<Progress> {
    let rest = line.trim().strip_prefix("[download]")?;
    let tokens: Vec<&str> = rest.split_whitespace().collect();

    let percent: f64 = tokens.first()?.strip_suffix('%')?.parse().ok()?;

    let total = tokens
        .iter()
        .position(|t| *t == "of")
        .and_then(|i| {
            let next = tokens.get(i + 1)?;
            if *next == "~" {
                tokens.get(i + 2).copied()
            } else {
                Some(*next)
            }
        })
        .and_then(|size| parse_size(size.trim_start_matches('~')));

    let speed = tokens
        .iter()
        .position(|t| *t == "at")
        .and_then(|i| tokens.get(i + 1))
        .and_then(|s| s.strip_suffix("/s"))
        .and_then(parse_size)
        .map(|bytes| bytes as f64);

    let downloaded = total
        .map(|t| (t as f64 * percent / 100.0) as u64)
        .unwrap_or(0);

    Some(Progress {
        downloaded,
        total,
        speed,
    })
}

/// Parse a size such as `10.00MiB` or `512KB` into bytes
pub fn parse_size(text: &str) -> Option<u64> {
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let value: f64 = number.parse().ok()?;

    let multiplier = match unit {
        "B" | "" => 1.0,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "KB" | "kB" => 1000.0,
        "MB" => 1000.0 * 1000.0,
        "GB" => 1000.0 * 1000.0 * 1000.0,
        _ => return None,
    };

    Some((value * multiplier) as u64)
}
