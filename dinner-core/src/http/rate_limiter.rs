//! Per-host rate limiting for HTTP requests.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Per-host rate limiter to stay inside third-party API quotas.
pub struct RateLimiter {
    /// Minimum delay between requests to the same host.
    min_delay: Duration,
    /// Next time a request to each host may start.
    next_slot: DashMap<String, Instant>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given minimum delay between requests.
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            next_slot: DashMap::new(),
        }
    }

    /// Wait until a request to `host` is allowed.
    ///
    /// Concurrent callers each reserve their own slot, so parallel image
    /// lookups against one host are spread out instead of bursting.
    pub async fn wait(&self, host: &str) {
        if self.min_delay.is_zero() {
            return;
        }

        let now = Instant::now();
        let start = {
            let mut slot = self.next_slot.entry(host.to_string()).or_insert(now);
            let start = (*slot).max(now);
            *slot = start + self.min_delay;
            start
        };

        if start > now {
            sleep(start - now).await;
        }
    }

    /// Get the number of hosts we've tracked.
    pub fn tracked_hosts(&self) -> usize {
        self.next_slot.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_delay_never_tracks() {
        let limiter = RateLimiter::new(Duration::ZERO);
        limiter.wait("api.example.com").await;
        assert_eq!(limiter.tracked_hosts(), 0);
    }

    #[tokio::test]
    async fn second_request_waits() {
        let limiter = RateLimiter::new(Duration::from_millis(30));
        let started = Instant::now();
        limiter.wait("api.example.com").await;
        limiter.wait("api.example.com").await;
        assert!(started.elapsed() >= Duration::from_millis(30));
        assert_eq!(limiter.tracked_hosts(), 1);
    }
}
