// SPDX-License-Identifier: MPL-2.0
//! Wall-clock to media-time mapping.
//!
//! While running, media time is `now - global_start_time`. Pause, buffering
//! and seeking suspend the clock: the last computed position is frozen and,
//! once every suspension has cleared, the origin is re-anchored so media time
//! continues from that frozen position instead of jumping ahead by the time
//! spent suspended.
//!
//! ```text
//!  wall ──●────────────●━━━━━━━━━━━━━━━●──────────▶
//!       start       suspend         resume
//!  media  0 ───────▶ 0.5 (frozen) ─── 0.5 ───────▶
//! ```
//!
//! Suspension reasons are tracked separately so overlapping suspensions
//! (pausing while buffering) thaw the clock only once, when the last one
//! clears.

/// Why the clock is not advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendReason {
    /// The user paused playback.
    Paused,
    /// The decoder ran out of queued frames.
    Buffering,
    /// A seek is in flight.
    Seeking,
}

impl SuspendReason {
    const fn bit(self) -> u8 {
        match self {
            Self::Paused => 0b001,
            Self::Buffering => 0b010,
            Self::Seeking => 0b100,
        }
    }
}

/// Playback clock driven by an external wall-clock reading.
///
/// The clock never reads time itself; every operation takes `now` so the
/// owner controls which instant a transition happens at.
#[derive(Debug, Clone, Default)]
pub struct PlaybackClock {
    /// Wall-clock instant such that `media_time = now - global_start_time`.
    global_start_time: f64,

    /// Wall-clock instant the clock froze at, while suspended.
    hang_time: Option<f64>,

    /// Last computed media position in seconds.
    current_time: f64,

    /// Active suspension reasons.
    suspended: u8,
}

impl PlaybackClock {
    /// Creates a clock at position zero, running from wall-clock zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the clock from position zero at `now`, clearing any suspension.
    pub fn start(&mut self, now: f64) {
        self.global_start_time = now;
        self.current_time = 0.0;
        self.hang_time = None;
        self.suspended = 0;
    }

    /// Re-anchors a running clock so the current position maps to `now`.
    ///
    /// No-op while suspended; resuming anchors the clock itself.
    pub fn anchor(&mut self, now: f64) {
        if !self.is_suspended() {
            self.global_start_time = now - self.current_time;
        }
    }

    /// Suspends the clock for `reason`.
    ///
    /// Returns true if this call froze a running clock.
    pub fn suspend(&mut self, reason: SuspendReason, now: f64) -> bool {
        let froze = !self.is_suspended();
        if froze {
            self.hang_time = Some(now);
        }
        self.suspended |= reason.bit();
        froze
    }

    /// Clears the suspension for `reason`.
    ///
    /// When this was the last active reason the clock resumes from its frozen
    /// position and the wall-clock time spent suspended is returned.
    pub fn resume(&mut self, reason: SuspendReason, now: f64) -> Option<f64> {
        if self.suspended & reason.bit() == 0 {
            return None;
        }
        self.suspended &= !reason.bit();
        if self.is_suspended() {
            return None;
        }

        self.global_start_time = now - self.current_time;
        let stalled = self.hang_time.take().map(|hang| (now - hang).max(0.0));
        Some(stalled.unwrap_or(0.0))
    }

    /// Moves the media position to `target_secs`.
    ///
    /// Meant to be paired with a [`SuspendReason::Seeking`] suspension: the
    /// clock resumes from the target once the decoder confirms the seek.
    pub fn seek(&mut self, target_secs: f64, now: f64) {
        self.current_time = target_secs;
        if !self.is_suspended() {
            self.global_start_time = now - target_secs;
        }
    }

    /// Recomputes the media position from `now`.
    ///
    /// Returns the frozen position while suspended.
    pub fn sample(&mut self, now: f64) -> f64 {
        if !self.is_suspended() {
            self.current_time = now - self.global_start_time;
        }
        self.current_time
    }

    /// Resets the clock to position zero with no suspension.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Last computed media position in seconds.
    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Wall-clock origin of the media timeline.
    #[must_use]
    pub fn global_start_time(&self) -> f64 {
        self.global_start_time
    }

    /// Wall-clock instant the clock froze at, if suspended.
    #[must_use]
    pub fn hang_time(&self) -> Option<f64> {
        self.hang_time
    }

    /// Returns true while any suspension is active.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended != 0
    }

    /// Returns true while `reason` holds the clock.
    #[must_use]
    pub fn is_suspended_by(&self, reason: SuspendReason) -> bool {
        self.suspended & reason.bit() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn clock_starts_at_zero() {
        let mut clock = PlaybackClock::new();
        clock.start(100.0);
        assert!(clock.sample(100.0).abs() < EPS);
        assert!((clock.sample(101.25) - 1.25).abs() < EPS);
        assert!(!clock.is_suspended());
    }

    #[test]
    fn suspension_freezes_position() {
        let mut clock = PlaybackClock::new();
        clock.start(10.0);
        clock.sample(10.5);
        assert!(clock.suspend(SuspendReason::Buffering, 10.5));

        assert!((clock.sample(12.0) - 0.5).abs() < EPS);
        assert_eq!(clock.hang_time(), Some(10.5));
    }

    #[test]
    fn resume_preserves_continuity() {
        let mut clock = PlaybackClock::new();
        clock.start(0.0);
        let before = clock.sample(0.5);
        clock.suspend(SuspendReason::Buffering, 0.5);

        let stalled = clock.resume(SuspendReason::Buffering, 1.2);
        assert!((stalled.unwrap() - 0.7).abs() < EPS);
        assert!((clock.current_time() - before).abs() < EPS);

        // Continues from 0.5, not from 1.2
        assert!((clock.sample(1.3) - 0.6).abs() < EPS);
    }

    #[test]
    fn overlapping_suspensions_resume_once() {
        let mut clock = PlaybackClock::new();
        clock.start(0.0);
        clock.sample(1.0);
        clock.suspend(SuspendReason::Buffering, 1.0);
        assert!(!clock.suspend(SuspendReason::Paused, 2.0));

        assert_eq!(clock.resume(SuspendReason::Paused, 3.0), None);
        assert!(clock.is_suspended_by(SuspendReason::Buffering));
        assert!((clock.sample(3.5) - 1.0).abs() < EPS);

        let stalled = clock.resume(SuspendReason::Buffering, 4.0).unwrap();
        assert!((stalled - 3.0).abs() < EPS);
        assert!((clock.sample(5.0) - 2.0).abs() < EPS);
    }

    #[test]
    fn resume_without_suspend_is_ignored() {
        let mut clock = PlaybackClock::new();
        clock.start(0.0);
        assert_eq!(clock.resume(SuspendReason::Seeking, 5.0), None);
        assert!((clock.sample(5.0) - 5.0).abs() < EPS);
    }

    #[test]
    fn seek_moves_frozen_position() {
        let mut clock = PlaybackClock::new();
        clock.start(0.0);
        clock.sample(2.0);
        clock.suspend(SuspendReason::Seeking, 2.0);
        clock.seek(7.5, 2.0);

        assert!((clock.sample(3.0) - 7.5).abs() < EPS);
        clock.resume(SuspendReason::Seeking, 3.0);
        assert!((clock.sample(4.0) - 8.5).abs() < EPS);
    }

    #[test]
    fn anchor_keeps_running_position() {
        let mut clock = PlaybackClock::new();
        clock.start(0.0);
        clock.sample(3.0);
        clock.anchor(10.0);
        assert!((clock.sample(10.0) - 3.0).abs() < EPS);
    }

    #[test]
    fn anchor_is_ignored_while_suspended() {
        let mut clock = PlaybackClock::new();
        clock.start(0.0);
        clock.sample(3.0);
        clock.suspend(SuspendReason::Paused, 3.0);
        clock.anchor(10.0);
        assert!((clock.global_start_time() - 0.0).abs() < EPS);
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut clock = PlaybackClock::new();
        clock.start(5.0);
        clock.sample(9.0);
        clock.suspend(SuspendReason::Paused, 9.0);
        clock.reset();

        assert!(clock.current_time().abs() < EPS);
        assert!(!clock.is_suspended());
        assert_eq!(clock.hang_time(), None);
    }
}
