//! Time sources.
//!
//! Everything time-dependent reads milliseconds from a [`Clock`] so sessions can be
//! replayed deterministically. Durations come from `now_ms`; `wall_time` is only used
//! to stamp results.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin. Never goes backwards.
    fn now_ms(&self) -> u64;

    fn wall_time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Monotonic clock counting from its construction. Wall-clock adjustments do not
/// affect measured answer times.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    /// The manual time read as milliseconds since the Unix epoch.
    fn wall_time(&self) -> DateTime<Utc> {
        i64::try_from(self.now_ms())
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or_default()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    fn wall_time(&self) -> DateTime<Utc> {
        (**self).wall_time()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new(1_000);
        let other = clock.clone();
        clock.advance(250);
        assert_eq!(other.now_ms(), 1_250);
        other.set(5);
        assert_eq!(clock.now_ms(), 5);
    }

    #[test]
    fn test_system_clock_is_monotonic_from_origin() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = clock.now_ms();
        assert!(a < 1_000);
        assert!(b >= a + 5);
        assert!(clock.wall_time().timestamp() > 0);
    }

    #[test]
    fn test_manual_wall_time_follows_manual_ms() {
        let clock = ManualClock::new(1_700_000_000_123);
        assert_eq!(clock.wall_time().timestamp_millis(), 1_700_000_000_123);
        clock.set(u64::MAX);
        assert_eq!(clock.wall_time(), DateTime::<Utc>::default());
    }
}
