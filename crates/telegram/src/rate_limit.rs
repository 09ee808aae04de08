//! Per-user throttle for download requests
//!
//! Each download spawns yt-dlp or an HTTP transfer, so a user may start at
//! most one every `RATE_LIMIT_SECONDS`.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::constants::RATE_LIMIT_SECONDS;

/// Entries older than this are dropped by `cleanup`
const STALE_AFTER: Duration = Duration::from_secs(600);

/// Thread-safe limiter keyed by user id
pub struct RateLimiter {
    last_request: RwLock<HashMap<u64, Instant>>,
    interval: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_secs(RATE_LIMIT_SECONDS))
    }
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_request: RwLock::new(HashMap::new()),
            interval,
        }
    }

    /// Time the user still has to wait, or `None` if they may proceed
    ///
    /// A successful check records `now` as the user's latest request.
    pub fn check_at(&self, user_id: u64, now: Instant) -> Option<Duration> {
        {
            let last = self.last_request.read().unwrap_or_else(|e| e.into_inner());
            if let Some(&prev) = last.get(&user_id) {
                let elapsed = now.saturating_duration_since(prev);
                if elapsed < self.interval {
                    return Some(self.interval - elapsed);
                }
            }
        }

        let mut last = self.last_request.write().unwrap_or_else(|e| e.into_inner());
        last.insert(user_id, now);
        if last.len() > 1024 {
            last.retain(|_, prev| now.saturating_duration_since(*prev) < STALE_AFTER);
        }
        None
    }

    /// `check_at` with the current time
    pub fn check(&self, user_id: u64) -> Option<Duration> {
        self.check_at(user_id, Instant::now())
    }
}

/// Global rate limiter instance
static RATE_LIMITER: std::sync::OnceLock<RateLimiter> = std::sync::OnceLock::new();

/// Get the global rate limiter
pub fn rate_limiter() -> &'static RateLimiter {
    RATE_LIMITER.get_or_init(RateLimiter::default)
}

/// Returns `true` if the user may start a download now
pub fn check_rate_limit(user_id: u64) -> bool {
    rate_limiter().check(user_id).is_none()
}
