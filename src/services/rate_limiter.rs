use crate::error::{AppError, AppResult, ErrorCode};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;
use uuid::Uuid;

/// A token bucket for one API key. Process-local: the bucket table is not
/// shared across instances, matching the accepted spec choice of per-key
/// monotonic-time accounting without cross-instance coordination.
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, capacity: f64, refill_rate_per_sec: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate_per_sec).min(capacity);
        self.last_refill = now;
    }

    fn try_consume(&mut self, capacity: f64, refill_rate_per_sec: f64, cost: f64) -> bool {
        self.refill(capacity, refill_rate_per_sec);
        if self.tokens >= cost {
            self.tokens -= cost;
            true
        } else {
            false
        }
    }

    fn time_until_available(&self, refill_rate_per_sec: f64, cost: f64) -> f64 {
        if self.tokens >= cost {
            0.0
        } else {
            (cost - self.tokens) / refill_rate_per_sec
        }
    }
}

/// Per-key token bucket rate limiter. `requests_per_minute` sets both
/// capacity and refill rate, matching a simple uniform-refill bucket.
pub struct RateLimiter {
    buckets: Mutex<HashMap<Uuid, Bucket>>,
    requests_per_minute: f64,
}

impl RateLimiter {
    pub fn new(requests_per_minute: f64) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            requests_per_minute,
        }
    }

    fn refill_rate_per_sec(&self) -> f64 {
        self.requests_per_minute / 60.0
    }

    /// Consumes one token for `api_key_id`, returning `RATE_LIMIT_EXCEEDED`
    /// with a `retry_after_seconds` hint when the bucket is empty.
    pub fn check(&self, api_key_id: Uuid) -> AppResult<()> {
        let capacity = self.requests_per_minute;
        let refill_rate = self.refill_rate_per_sec();

        let mut buckets = self.buckets.lock().expect("rate limiter bucket lock poisoned");
        let bucket = buckets.entry(api_key_id).or_insert_with(|| Bucket::new(capacity));

        if bucket.try_consume(capacity, refill_rate, 1.0) {
            return Ok(());
        }

        let retry_after = bucket.time_until_available(refill_rate, 1.0);
        Err(AppError::domain_with_details(
            ErrorCode::RateLimitExceeded,
            "rate limit exceeded",
            json!({
                "retry_after_seconds": (retry_after * 100.0).round() / 100.0,
                "limit_rpm": self.requests_per_minute,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_allows_up_to_capacity() {
        let limiter = RateLimiter::new(3.0);
        let key = Uuid::new_v4();
        assert!(limiter.check(key).is_ok());
        assert!(limiter.check(key).is_ok());
        assert!(limiter.check(key).is_ok());
        let err = limiter.check(key).unwrap_err();
        assert_eq!(err.code(), ErrorCode::RateLimitExceeded);
    }

    #[test]
    fn test_separate_keys_have_separate_buckets() {
        let limiter = RateLimiter::new(1.0);
        let key_a = Uuid::new_v4();
        let key_b = Uuid::new_v4();
        assert!(limiter.check(key_a).is_ok());
        assert!(limiter.check(key_b).is_ok());
    }

    #[test]
    fn test_refills_over_time() {
        let limiter = RateLimiter::new(600.0);
        let key = Uuid::new_v4();
        for _ in 0..600 {
            limiter.check(key).unwrap();
        }
        assert!(limiter.check(key).is_err());
        sleep(Duration::from_millis(50));
        assert!(limiter.check(key).is_ok());
    }
}
