// ledgerflow-core/src/domain/currency/limiter.rs

use std::time::{Duration, Instant};

/// Token bucket used to stay under the rate provider's request limit.
///
/// `acquire` reserves a token and returns how long the caller has to wait before
/// using it. The bucket is pure bookkeeping: it never sleeps itself.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    // Negative when tokens are reserved ahead of time.
    tokens: f64,
    last: Option<Instant>,
}

impl TokenBucket {
    /// `burst` requests may go out back to back, then `per_second` on average.
    pub fn new(per_second: f64, burst: u32) -> Self {
        let capacity = f64::from(burst.max(1));
        Self {
            capacity,
            refill_per_sec: per_second.max(f64::MIN_POSITIVE),
            tokens: capacity,
            last: None,
        }
    }

    pub fn acquire(&mut self, now: Instant) -> Duration {
        if let Some(last) = self.last {
            let elapsed = now.saturating_duration_since(last).as_secs_f64();
            self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        }
        self.last = Some(now);
        self.tokens -= 1.0;

        if self.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-self.tokens / self.refill_per_sec)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_per_second() {
        let mut bucket = TokenBucket::new(1.0, 1);
        let t0 = Instant::now();

        assert_eq!(bucket.acquire(t0), Duration::ZERO);
        assert_eq!(bucket.acquire(t0), Duration::from_secs(1));
        // Second reservation already queued: the third waits two seconds.
        assert_eq!(bucket.acquire(t0), Duration::from_secs(2));
    }

    #[test]
    fn test_refill_after_idle() {
        let mut bucket = TokenBucket::new(1.0, 1);
        let t0 = Instant::now();

        assert_eq!(bucket.acquire(t0), Duration::ZERO);
        assert_eq!(bucket.acquire(t0 + Duration::from_secs(5)), Duration::ZERO);
    }

    #[test]
    fn test_burst() {
        let mut bucket = TokenBucket::new(2.0, 3);
        let t0 = Instant::now();

        for _ in 0..3 {
            assert_eq!(bucket.acquire(t0), Duration::ZERO);
        }
        assert_eq!(bucket.acquire(t0), Duration::from_millis(500));
    }

    #[test]
    fn test_idle_does_not_exceed_capacity() {
        let mut bucket = TokenBucket::new(1.0, 2);
        let t0 = Instant::now();
        let later = t0 + Duration::from_secs(60);

        assert_eq!(bucket.acquire(t0), Duration::ZERO);
        assert_eq!(bucket.acquire(later), Duration::ZERO);
        assert_eq!(bucket.acquire(later), Duration::ZERO);
        assert_eq!(bucket.acquire(later), Duration::from_secs(1));
    }
}
