//! Clock implementations.

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use time::{Duration, OffsetDateTime};

use crate::core::traits::Clock;

/// The wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A manually driven clock for simulations and tests.
///
/// Clones share the same elapsed time, so the host can keep one handle to advance the clock
/// while the routing table holds another.
#[derive(Debug, Clone)]
pub struct SimClock {
    epoch: OffsetDateTime,
    // Nanoseconds elapsed since the epoch.
    elapsed: Arc<AtomicI64>,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock {
    /// Creates a new clock starting at the unix epoch.
    pub fn new() -> Self {
        Self::starting_at(OffsetDateTime::UNIX_EPOCH)
    }

    /// Creates a new clock starting at the supplied instant.
    pub fn starting_at(epoch: OffsetDateTime) -> Self {
        Self {
            epoch,
            elapsed: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Returns the time elapsed since the clock's epoch.
    pub fn elapsed(&self) -> Duration {
        Duration::nanoseconds(self.elapsed.load(Ordering::Acquire))
    }

    /// Moves the clock forward (or backward for negative durations), saturating at the bounds
    /// of what the clock can represent.
    pub fn advance(&self, by: Duration) {
        let by = i64::try_from(by.whole_nanoseconds()).unwrap_or(if by.is_negative() {
            i64::MIN
        } else {
            i64::MAX
        });

        // The closure always returns `Some`, the update can't fail.
        let _ = self
            .elapsed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |elapsed| {
                Some(elapsed.saturating_add(by))
            });
    }
}

impl Clock for SimClock {
    fn now(&self) -> OffsetDateTime {
        self.epoch + self.elapsed()
    }
}
