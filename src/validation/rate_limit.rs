//! Sliding-window rate limiting
//!
//! Keys are `operation:entity_id`. The in-process limiter keeps a log of
//! hit timestamps per key; a shared store can be plugged in through the
//! [`RateLimiter`] trait without touching call sites.

use crate::config::RateLimit;
use crate::core::{Clock, CoordinatorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Counter store for sliding-window limits
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record a hit for `key` if fewer than `max` hits fall inside `window`.
    /// Returns whether the hit was allowed.
    async fn check_and_increment(&self, key: &str, window: Duration, max: u32) -> bool;

    /// Forget keys with no hits left inside their window; returns how many.
    /// Stores that expire keys on their own keep the default.
    async fn prune(&self) -> usize {
        0
    }
}

/// Build the limiter key for an operation on an entity
pub fn rate_key(operation: &str, id: &str) -> String {
    format!("{}:{}", operation, id)
}

/// Count one `operation` on entity `id` against `limit`
pub async fn enforce(
    limiter: &dyn RateLimiter,
    operation: &'static str,
    id: &str,
    limit: RateLimit,
) -> Result<()> {
    let key = rate_key(operation, id);
    if limiter
        .check_and_increment(&key, limit.window(), limit.max)
        .await
    {
        return Ok(());
    }
    log::warn!(
        "Rate limit hit for {} ({} per {:?})",
        key,
        limit.max,
        limit.window()
    );
    Err(CoordinatorError::RateLimited { operation, key })
}

#[derive(Debug, Default)]
struct HitLog {
    window: chrono::Duration,
    hits: VecDeque<DateTime<Utc>>,
}

impl HitLog {
    fn evict(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        while self.hits.front().is_some_and(|t| *t <= cutoff) {
            self.hits.pop_front();
        }
    }
}

/// In-process sliding-window log
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    clock: Arc<dyn Clock>,
    logs: Mutex<HashMap<String, HitLog>>,
}

impl InMemoryRateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            logs: Mutex::new(HashMap::new()),
        }
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.logs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check_and_increment(&self, key: &str, window: Duration, max: u32) -> bool {
        let now = self.clock.now();
        let window =
            chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::days(3650));

        let mut logs = self.logs.lock().unwrap_or_else(|e| e.into_inner());
        let log = logs.entry(key.to_string()).or_default();
        log.window = window;
        log.evict(now);

        if log.hits.len() >= max as usize {
            return false;
        }

        log.hits.push_back(now);
        true
    }

    async fn prune(&self) -> usize {
        let now = self.clock.now();
        let mut logs = self.logs.lock().unwrap_or_else(|e| e.into_inner());
        let before = logs.len();
        logs.retain(|_, log| {
            log.evict(now);
            !log.hits.is_empty()
        });
        before - logs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;

    #[tokio::test]
    async fn test_sliding_window() {
        let clock = Arc::new(ManualClock::default());
        let limiter = InMemoryRateLimiter::new(clock.clone());
        let window = Duration::from_secs(30);

        for _ in 0..5 {
            assert!(limiter.check_and_increment("sign:tx1", window, 5).await);
        }
        assert!(!limiter.check_and_increment("sign:tx1", window, 5).await);

        // Other keys are independent
        assert!(limiter.check_and_increment("sign:tx2", window, 5).await);

        clock.advance(chrono::Duration::seconds(31));
        assert!(limiter.check_and_increment("sign:tx1", window, 5).await);
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[tokio::test]
    async fn test_rejected_hits_are_not_counted() {
        let clock = Arc::new(ManualClock::default());
        let limiter = InMemoryRateLimiter::new(clock.clone());
        let window = Duration::from_secs(60);

        assert!(limiter.check_and_increment("k", window, 1).await);
        clock.advance(chrono::Duration::seconds(40));
        assert!(!limiter.check_and_increment("k", window, 1).await);
        clock.advance(chrono::Duration::seconds(21));
        assert!(limiter.check_and_increment("k", window, 1).await);
    }

    #[tokio::test]
    async fn test_prune_drops_idle_keys() {
        let clock = Arc::new(ManualClock::default());
        let limiter = InMemoryRateLimiter::new(clock.clone());

        limiter
            .check_and_increment("short", Duration::from_secs(30), 5)
            .await;
        limiter
            .check_and_increment("long", Duration::from_secs(600), 5)
            .await;
        assert_eq!(limiter.prune().await, 0);

        clock.advance(chrono::Duration::seconds(31));
        assert_eq!(limiter.prune().await, 1);
        assert_eq!(limiter.tracked_keys(), 1);

        clock.advance(chrono::Duration::minutes(10));
        assert_eq!(limiter.prune().await, 1);
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn test_enforce_maps_to_rate_limited() {
        let clock = Arc::new(ManualClock::default());
        let limiter = InMemoryRateLimiter::new(clock);
        let limit = RateLimit::new(1, 60);

        assert!(enforce(&limiter, "tx_sign", "tx1", limit).await.is_ok());
        match enforce(&limiter, "tx_sign", "tx1", limit).await {
            Err(CoordinatorError::RateLimited { operation, key }) => {
                assert_eq!(operation, "tx_sign");
                assert_eq!(key, "tx_sign:tx1");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rate_key() {
        assert_eq!(rate_key("tx_create", "abc"), "tx_create:abc");
    }
}
