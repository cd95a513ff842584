// SPDX-License-Identifier: MPL-2.0
//! Wall-clock sources.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::application::port::TimeSource;

/// System wall clock in seconds since the UNIX epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> f64 {
        // A clock set before 1970 reads as zero
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0.0, |elapsed| elapsed.as_secs_f64())
    }
}

/// Manually driven clock.
///
/// Clones share the same reading, so a test can keep one handle while the
/// controller owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    bits: Arc<AtomicU64>,
}

impl ManualTimeSource {
    #[must_use]
    pub fn new(start_secs: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start_secs.to_bits())),
        }
    }

    pub fn set(&self, secs: f64) {
        self.bits.store(secs.to_bits(), Ordering::SeqCst);
    }

    /// Moves the clock forward by `secs`.
    pub fn advance(&self, secs: f64) {
        self.set(self.now() + secs);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_time_is_after_epoch() {
        assert!(SystemTimeSource.now() > 1_000_000_000.0);
    }

    #[test]
    fn manual_clones_share_reading() {
        let clock = ManualTimeSource::new(10.0);
        let other = clock.clone();
        clock.advance(0.5);
        assert_eq!(other.now(), 10.5);
        other.set(2.0);
        assert_eq!(clock.now(), 2.0);
    }

    #[test]
    fn manual_default_reads_zero() {
        assert_eq!(ManualTimeSource::default().now(), 0.0);
    }
}
