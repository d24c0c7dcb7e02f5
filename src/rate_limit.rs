use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::RateLimitConfig;

/// Per-client-IP submission limiter using a fixed window.
pub struct SubmissionRateLimiter {
    /// ip -> (count, window_start)
    entries: DashMap<IpAddr, (u32, Instant)>,
    limit: u32,
    window: Duration,
}

impl SubmissionRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            entries: DashMap::new(),
            limit: config.max_submissions,
            window: Duration::from_secs(config.window_secs),
        }
    }

    /// Check if request is allowed. Returns Ok(()) or Err with retry-after seconds.
    pub fn check(&self, ip: IpAddr) -> Result<(), u64> {
        let now = Instant::now();

        let mut entry = self.entries.entry(ip).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > self.window {
            *count = 1;
            *start = now;
            return Ok(());
        }

        if *count >= self.limit {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(self.window.as_secs().saturating_sub(elapsed).max(1));
        }

        *count += 1;
        Ok(())
    }

    /// Remove entries whose window has expired.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let window = self.window;
        self.entries.retain(|_, (_, start)| now.duration_since(*start) <= window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.entries.len()
    }
}
