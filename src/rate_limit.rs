use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// In-memory sliding-window limiter for login attempts, keyed by bucket
/// (e.g. `"login:<hashed username>"`).
pub struct RateLimiter {
    entries: Mutex<HashMap<String, Vec<Instant>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        RateLimiter {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Instant>>> {
        // A panic while holding the map leaves plain timestamps behind; keep going.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record an attempt and return true if it is under `max_attempts` within `window`.
    pub fn check_and_record(&self, key: &str, max_attempts: u64, window: Duration) -> bool {
        let mut map = self.lock();
        let now = Instant::now();

        let attempts = map.entry(key.to_string()).or_default();
        attempts.retain(|t| now.duration_since(*t) < window);

        if (attempts.len() as u64) < max_attempts {
            attempts.push(now);
            true
        } else {
            false
        }
    }

    /// Forget a bucket, e.g. after a successful login.
    pub fn reset(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Drop buckets whose newest attempt is older than `max_age`.
    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.lock().retain(|_, attempts| {
            attempts.retain(|t| now.duration_since(*t) < max_age);
            !attempts.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_max_attempts() {
        let limiter = RateLimiter::new();
        let window = Duration::from_secs(60);
        assert!(limiter.check_and_record("login:a", 2, window));
        assert!(limiter.check_and_record("login:a", 2, window));
        assert!(!limiter.check_and_record("login:a", 2, window));
        assert!(limiter.check_and_record("login:b", 2, window));
    }

    #[test]
    fn reset_clears_bucket() {
        let limiter = RateLimiter::new();
        let window = Duration::from_secs(60);
        assert!(limiter.check_and_record("k", 1, window));
        assert!(!limiter.check_and_record("k", 1, window));
        limiter.reset("k");
        assert!(limiter.check_and_record("k", 1, window));
    }

    #[test]
    fn cleanup_drops_stale_buckets() {
        let limiter = RateLimiter::new();
        assert!(limiter.check_and_record("k", 1, Duration::from_secs(60)));
        limiter.cleanup(Duration::ZERO);
        assert!(limiter.check_and_record("k", 1, Duration::from_secs(60)));
    }
}
