use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use crate::fetcher::errors::FetchError;

/// Per-domain outbound admission control.
///
/// One token bucket per target domain: capacity equals the per-minute cap
/// and tokens refill continuously at that rate. A caller over budget sleeps
/// until a token accrues; domains never contend with each other, and the
/// bucket's shard lock is released before sleeping.
#[derive(Debug)]
pub struct DomainLimiter {
    buckets: DashMap<String, TokenBucket>,
    capacity: f64,
    refill_per_sec: f64,
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn refill(&mut self, capacity: f64, refill_per_sec: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_per_sec).min(capacity);
        self.last_refill = now;
    }
}

impl DomainLimiter {
    pub fn new(per_minute: u32) -> Self {
        Self::with_rate(per_minute, Duration::from_secs(60))
    }

    /// Bucket of `capacity` tokens refilling fully over `per`.
    pub fn with_rate(capacity: u32, per: Duration) -> Self {
        let capacity = f64::from(capacity.max(1));
        Self {
            buckets: DashMap::new(),
            capacity,
            refill_per_sec: capacity / per.as_secs_f64().max(0.001),
        }
    }

    /// Take one token for `domain`, waiting for refill when the bucket is
    /// empty. Fails with `AdmissionDenied` when the wait would cross
    /// `deadline`.
    pub async fn acquire(&self, domain: &str, deadline: Instant) -> Result<(), FetchError> {
        loop {
            let wait = {
                let mut entry =
                    self.buckets
                        .entry(domain.to_string())
                        .or_insert_with(|| TokenBucket {
                            tokens: self.capacity,
                            last_refill: Instant::now(),
                        });
                let bucket = entry.value_mut();
                bucket.refill(self.capacity, self.refill_per_sec);

                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return Ok(());
                }

                // Time until one full token accrues; lock drops before sleep.
                Duration::from_secs_f64((1.0 - bucket.tokens) / self.refill_per_sec)
            };

            if Instant::now() + wait > deadline {
                let retry_after_secs = wait.as_secs().max(1);
                debug!(domain, ?wait, "domain budget exhausted past the deadline");
                return Err(FetchError::AdmissionDenied { retry_after_secs });
            }

            debug!(domain, ?wait, "domain budget exhausted, waiting for refill");
            tokio::time::sleep(wait).await;
            // Re-check: another task may have taken the refilled token.
        }
    }
}
