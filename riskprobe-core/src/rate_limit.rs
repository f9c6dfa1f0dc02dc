//! Advisory sliding-window rate limiter.
//!
//! Runs client-side and protects nothing server-side; it only keeps one tab
//! from hammering the collection endpoint. Records are keyed by an arbitrary
//! identifier and expire one window after they started.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

/// Millisecond wall clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by `chrono`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Manually advanced clock for tests and replays.
///
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed within one window
    pub max_requests: u32,
    pub window: Duration,
    /// Minimum spacing between opportunistic cleanups
    pub cleanup_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_millis(60_000),
            cleanup_interval: Duration::from_millis(60_000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowRecord {
    count: u32,
    started_at_ms: u64,
}

/// Per-identifier request counter.
#[derive(Debug)]
pub struct RateLimiter<C: Clock = SystemClock> {
    config: RateLimitConfig,
    clock: C,
    records: HashMap<String, WindowRecord>,
    last_cleanup_ms: u64,
}

impl RateLimiter<SystemClock> {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for RateLimiter<SystemClock> {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(config: RateLimitConfig, clock: C) -> Self {
        let last_cleanup_ms = clock.now_ms();
        Self {
            config,
            clock,
            records: HashMap::new(),
            last_cleanup_ms,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn window_ms(&self) -> u64 {
        self.config.window.as_millis() as u64
    }

    /// Count a request for `id` and report whether it is allowed.
    ///
    /// A missing or expired record restarts the window at count 1. Otherwise
    /// the count is incremented and the request is allowed while the count
    /// stays within `max_requests`.
    pub fn check_rate_limit(&mut self, id: &str) -> bool {
        let now = self.clock.now_ms();
        self.maybe_cleanup(now);

        let window_ms = self.window_ms();
        let max = self.config.max_requests;

        let fresh = WindowRecord {
            count: 1,
            started_at_ms: now,
        };
        let record = self.records.entry(id.to_string()).or_insert(WindowRecord {
            count: 0,
            ..fresh
        });

        if record.count == 0 || now.saturating_sub(record.started_at_ms) >= window_ms {
            *record = fresh;
            return true;
        }

        record.count = record.count.saturating_add(1);
        let allowed = record.count <= max;
        if !allowed {
            warn!(id, count = record.count, max, "Rate limit exceeded");
        }
        allowed
    }

    /// Requests left for `id` in its current window.
    pub fn remaining(&self, id: &str) -> u32 {
        let now = self.clock.now_ms();
        match self.records.get(id) {
            Some(record) if now.saturating_sub(record.started_at_ms) < self.window_ms() => {
                self.config.max_requests.saturating_sub(record.count)
            }
            _ => self.config.max_requests,
        }
    }

    /// Drop every record whose window has elapsed. Returns how many were removed.
    pub fn cleanup(&mut self) -> usize {
        let now = self.clock.now_ms();
        self.cleanup_at(now)
    }

    fn cleanup_at(&mut self, now: u64) -> usize {
        let window_ms = self.window_ms();
        let before = self.records.len();
        self.records
            .retain(|_, record| now.saturating_sub(record.started_at_ms) < window_ms);
        self.last_cleanup_ms = now;

        let removed = before - self.records.len();
        if removed > 0 {
            debug!(removed, remaining = self.records.len(), "Rate limiter cleanup");
        }
        removed
    }

    fn maybe_cleanup(&mut self, now: u64) {
        let interval_ms = self.config.cleanup_interval.as_millis() as u64;
        if now.saturating_sub(self.last_cleanup_ms) >= interval_ms {
            self.cleanup_at(now);
        }
    }

    /// Number of identifiers currently tracked.
    pub fn tracked(&self) -> usize {
        self.records.len()
    }
}
