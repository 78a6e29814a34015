//! Token bucket that paces outbound price-history requests.
//!
//! All fetch tasks of a run share one bucket, so the configured budget holds
//! regardless of how many tickers are in flight.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

/// A requests-per-minute token bucket.
///
/// Capacity is one second's worth of requests (at least one), refilled
/// continuously.
#[derive(Debug)]
pub struct RateLimiter {
    name: String,
    capacity: f64,
    per_ms: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    pub fn new(name: impl Into<String>, requests_per_minute: u32) -> Self {
        let rpm = requests_per_minute.max(1) as f64;
        let capacity = (rpm / 60.0).ceil().max(1.0);

        Self {
            name: name.into(),
            capacity,
            per_ms: rpm / 60_000.0,
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                refilled_at: Instant::now(),
            }),
        }
    }

    /// Wait until a request may be sent.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                self.refill(&mut bucket);
                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return;
                }
                let missing = 1.0 - bucket.tokens;
                Duration::from_millis((missing / self.per_ms).ceil() as u64)
            };

            let wait = wait.clamp(Duration::from_millis(5), Duration::from_secs(1));
            debug!(limiter = %self.name, wait_ms = wait.as_millis() as u64, "Rate limited, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Burst size: requests that may go out back to back.
    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(bucket.refilled_at).as_secs_f64() * 1000.0;
        bucket.tokens = (bucket.tokens + elapsed_ms * self.per_ms).min(self.capacity);
        bucket.refilled_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_is_one_second_of_budget() {
        assert_eq!(RateLimiter::new("test", 300).capacity(), 5);
        assert_eq!(RateLimiter::new("test", 10).capacity(), 1);
        assert_eq!(RateLimiter::new("test", 0).capacity(), 1);
    }

    #[tokio::test]
    async fn test_burst_up_to_capacity_is_immediate() {
        let limiter = RateLimiter::new("test", 300);
        let started = Instant::now();
        for _ in 0..limiter.capacity() {
            limiter.acquire().await;
        }
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_acquire_waits_for_refill() {
        let limiter = RateLimiter::new("test", 6000); // 100 req/sec
        for _ in 0..limiter.capacity() {
            limiter.acquire().await;
        }

        let started = Instant::now();
        limiter.acquire().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
