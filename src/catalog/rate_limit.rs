//! Call-count rate limiting for catalog requests.
//!
//! Tracks the instants of recent calls in a sliding window and blocks the
//! caller until a new call fits in the budget.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Configuration for the sliding window limiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum calls allowed within `window`.
    pub max_calls: usize,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: 200,
            window: Duration::from_secs(30),
        }
    }
}

/// Sliding window call limiter.
pub struct SlidingWindowLimiter {
    calls: Mutex<VecDeque<Instant>>,
    config: RateLimitConfig,
}

impl SlidingWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let config = RateLimitConfig {
            max_calls: config.max_calls.max(1),
            window: config.window,
        };
        Self {
            calls: Mutex::new(VecDeque::with_capacity(config.max_calls)),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(RateLimitConfig::default())
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Drop calls that left the window.
    fn prune(calls: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(front) = calls.front() {
            if now.saturating_duration_since(*front) >= window {
                calls.pop_front();
            } else {
                break;
            }
        }
    }

    /// Records a call at `now` if the budget allows it.
    ///
    /// Returns `Err(wait)` with the time until the oldest call in the window
    /// expires otherwise.
    pub fn try_acquire_at(&self, now: Instant) -> Result<(), Duration> {
        let mut calls = self.calls.lock().unwrap();
        Self::prune(&mut calls, now, self.config.window);

        if calls.len() >= self.config.max_calls {
            let wait = match calls.front() {
                Some(oldest) => self
                    .config
                    .window
                    .saturating_sub(now.saturating_duration_since(*oldest)),
                None => self.config.window,
            };
            return Err(wait);
        }

        calls.push_back(now);
        Ok(())
    }

    /// Blocks until a call fits in the window, then records it.
    pub fn acquire(&self) {
        loop {
            match self.try_acquire_at(Instant::now()) {
                Ok(()) => return,
                Err(wait) => {
                    debug!(
                        wait_ms = wait.as_millis() as u64,
                        "Catalog rate limit reached, waiting"
                    );
                    std::thread::sleep(wait);
                }
            }
        }
    }

    /// Number of calls currently inside the window.
    pub fn calls_in_window(&self) -> usize {
        let mut calls = self.calls.lock().unwrap();
        Self::prune(&mut calls, Instant::now(), self.config.window);
        calls.len()
    }
}
