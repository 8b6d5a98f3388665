use crate::models::config::RateLimitConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Fixed-window request counter keyed by client identity.
///
/// Each key gets its own window that opens on the first request and resets
/// once `window` has elapsed. The lock is never held across an await point.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    /// Counts one request for `key`. On rejection returns how long until the
    /// key's window resets.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let mut windows = self.windows.lock();
        let entry = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.saturating_duration_since(entry.started) >= self.window {
            entry.count = 0;
            entry.started = now;
        }

        if entry.count >= self.max_requests {
            let elapsed = now.saturating_duration_since(entry.started);
            return Err(self.window.saturating_sub(elapsed));
        }

        entry.count += 1;
        Ok(())
    }

    /// Drops every window that has expired. Returns the number evicted.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        before - windows.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixth_request_in_window_is_rejected() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();

        for i in 0..5 {
            assert!(limiter.check_at("10.0.0.1", start + Duration::from_secs(i)).is_ok());
        }

        let retry = limiter
            .check_at("10.0.0.1", start + Duration::from_secs(10))
            .unwrap_err();
        assert_eq!(retry, Duration::from_secs(50));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check_at("a", now).is_ok());
        assert!(limiter.check_at("a", now).is_err());
        assert!(limiter.check_at("b", now).is_ok());
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_at("k", start).is_ok());
        assert!(limiter.check_at("k", start).is_ok());
        assert!(limiter.check_at("k", start + Duration::from_secs(59)).is_err());
        assert!(limiter.check_at("k", start + Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn rejected_requests_do_not_extend_the_window() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_at("k", start).is_ok());
        for s in 1..60 {
            assert!(limiter.check_at("k", start + Duration::from_secs(s)).is_err());
        }
        assert!(limiter.check_at("k", start + Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn sweep_evicts_only_expired_windows() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();

        limiter.check_at("old", start).unwrap();
        limiter.check_at("fresh", start + Duration::from_secs(30)).unwrap();
        assert_eq!(limiter.tracked_keys(), 2);

        assert_eq!(limiter.sweep_at(start + Duration::from_secs(61)), 1);
        assert_eq!(limiter.tracked_keys(), 1);
        assert!(limiter.check_at("fresh", start + Duration::from_secs(61)).is_ok());
    }
}
