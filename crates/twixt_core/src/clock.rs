//! Time sources
//!
//! Tween time is measured in milliseconds as `f64`. A scheduler asks its
//! [`Clock`] for the current time whenever a tick is not given one explicitly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// A millisecond time source. Successive readings must never decrease.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> f64;
}

/// Milliseconds elapsed since the clock was created
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Wall-clock milliseconds since the Unix epoch.
///
/// Not strictly monotonic: an OS clock adjustment can step it backwards. A
/// backwards step only delays tweens, since progress is clamped at zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same reading, so a test or simulation can keep one copy
/// and hand another to a scheduler.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start_ms.to_bits())),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, now_ms: f64) {
        self.bits.store(now_ms.to_bits(), Ordering::Release);
    }

    /// Move forward by `delta_ms` and return the new reading
    pub fn advance(&self, delta_ms: f64) -> f64 {
        let now = self.now_ms() + delta_ms;
        self.set(now);
        now
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}
