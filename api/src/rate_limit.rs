//! Rate limiting buckets: per-tenant+user general traffic (100/15
//! min), per-tenant schedule generation (10/h), per-tenant conflict check
//! (50/5 min), per-IP public (100/min). Admin principals bypass the
//! general bucket. A fixed-window counter per key, guarded the same way
//! `db::cache::InMemoryCache` guards its map -- a single `Mutex<HashMap>`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct RateLimiter {
    window: Duration,
    limit: u32,
    buckets: Mutex<HashMap<String, (Instant, u32)>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            window,
            limit,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `Ok(())` if `key` has headroom in the current window, or
    /// `Err(retry_after_secs)` once the limit is hit.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let mut buckets = self.buckets.lock().unwrap();
        let now = Instant::now();
        let entry = buckets.entry(key.to_string()).or_insert((now, 0));

        if now.duration_since(entry.0) >= self.window {
            *entry = (now, 0);
        }

        if entry.1 >= self.limit {
            let elapsed = now.duration_since(entry.0);
            let retry_after = self.window.saturating_sub(elapsed).as_secs().max(1);
            return Err(retry_after);
        }

        entry.1 += 1;
        Ok(())
    }
}

pub struct RateLimiters {
    pub general: RateLimiter,
    pub generation: RateLimiter,
    pub conflict_check: RateLimiter,
    pub public: RateLimiter,
}

impl Default for RateLimiters {
    fn default() -> Self {
        Self {
            general: RateLimiter::new(100, Duration::from_secs(15 * 60)),
            generation: RateLimiter::new(10, Duration::from_secs(60 * 60)),
            conflict_check: RateLimiter::new(50, Duration::from_secs(5 * 60)),
            public: RateLimiter::new(100, Duration::from_secs(60)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_rejects() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.check("tenant-1").is_ok());
        assert!(limiter.check("tenant-1").is_ok());
        assert!(limiter.check("tenant-1").is_err());
    }

    #[test]
    fn buckets_are_independent_per_key() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("tenant-1").is_ok());
        assert!(limiter.check("tenant-2").is_ok());
    }
}
