//! Conversion rate limiting
//!
//! A sliding-window limiter bounding how many conversions may start within
//! a time window. The converter owns one limiter and consults it before each
//! file; a denied file is reported as a per-file error and the batch moves on.
//!
//! # Example
//!
//! ```rust
//! use snapconvert_core::rate_limit::{RateLimitConfig, SlidingWindowLimiter};
//! use std::time::Duration;
//!
//! let mut limiter = SlidingWindowLimiter::new(RateLimitConfig::strict(2, Duration::from_secs(60)));
//! assert!(limiter.try_acquire());
//! assert!(limiter.try_acquire());
//! assert!(!limiter.try_acquire());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Rate limiter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum conversions per window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// Create a rate limit of `max_requests` per `window`
    #[must_use] pub fn strict(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    /// Per-minute rate limit
    #[must_use] pub fn per_minute(max: u32) -> Self {
        Self::strict(max, Duration::from_secs(60))
    }

    /// A limit that never denies
    #[must_use] pub fn unlimited() -> Self {
        Self::strict(u32::MAX, Duration::from_secs(1))
    }
}

/// Rate limit status
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitStatus {
    /// Conversions still allowed in the current window
    pub available: u32,
    /// Maximum conversions per window
    pub max: u32,
    /// Time until the oldest recorded conversion leaves the window
    pub reset_in: Duration,
}

/// Sliding window rate limiter
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    window: VecDeque<Instant>,
    config: RateLimitConfig,
}

impl SlidingWindowLimiter {
    /// Create a new sliding window limiter
    #[must_use] pub fn new(config: RateLimitConfig) -> Self {
        Self {
            window: VecDeque::new(),
            config,
        }
    }

    /// Active configuration
    #[must_use] pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Try to acquire permission for one conversion now
    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Try to acquire permission at a given instant
    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        self.evict(now);

        if self.window.len() < self.config.max_requests as usize {
            self.window.push_back(now);
            true
        } else {
            false
        }
    }

    /// Get current count in window
    pub fn current_count(&mut self) -> usize {
        self.evict(Instant::now());
        self.window.len()
    }

    /// Get rate limit status
    pub fn status(&mut self) -> RateLimitStatus {
        let now = Instant::now();
        self.evict(now);

        let used = u32::try_from(self.window.len()).unwrap_or(u32::MAX);
        let reset_in = self
            .window
            .front()
            .map(|oldest| (*oldest + self.config.window).saturating_duration_since(now))
            .unwrap_or(Duration::ZERO);

        RateLimitStatus {
            available: self.config.max_requests.saturating_sub(used),
            max: self.config.max_requests,
            reset_in,
        }
    }

    /// Forget all recorded conversions
    pub fn reset(&mut self) {
        self.window.clear();
    }

    fn evict(&mut self, now: Instant) {
        // Use checked subtraction to avoid panic on underflow
        let Some(cutoff) = now.checked_sub(self.config.window) else {
            return;
        };
        while self.window.front().is_some_and(|&t| t <= cutoff) {
            self.window.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sliding_window_basic() {
        let mut limiter = SlidingWindowLimiter::new(RateLimitConfig::strict(3, Duration::from_secs(1)));

        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire()); // Should be rate limited
    }

    #[test]
    fn test_window_slides() {
        let mut limiter = SlidingWindowLimiter::new(RateLimitConfig::strict(2, Duration::from_secs(10)));
        let start = Instant::now();

        assert!(limiter.try_acquire_at(start));
        assert!(limiter.try_acquire_at(start + Duration::from_secs(1)));
        assert!(!limiter.try_acquire_at(start + Duration::from_secs(5)));

        // First entry has left the window
        assert!(limiter.try_acquire_at(start + Duration::from_secs(10)));
        assert!(!limiter.try_acquire_at(start + Duration::from_secs(10)));
    }

    #[test]
    fn test_reset() {
        let mut limiter = SlidingWindowLimiter::new(RateLimitConfig::strict(1, Duration::from_secs(60)));

        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        limiter.reset();
        assert!(limiter.try_acquire());
    }

    #[test]
    fn test_status() {
        let mut limiter = SlidingWindowLimiter::new(RateLimitConfig::per_minute(10));
        assert!(limiter.try_acquire());

        let status = limiter.status();
        assert_eq!(status.max, 10);
        assert_eq!(status.available, 9);
        assert!(status.reset_in <= Duration::from_secs(60));
        assert_eq!(limiter.current_count(), 1);
    }

    #[test]
    fn test_unlimited() {
        let mut limiter = SlidingWindowLimiter::new(RateLimitConfig::unlimited());
        for _ in 0..1000 {
            assert!(limiter.try_acquire());
        }
    }
}
