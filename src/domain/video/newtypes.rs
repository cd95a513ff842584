// SPDX-License-Identifier: MPL-2.0
//! Video playback newtypes.
//!
//! This module provides type-safe wrappers for engine tuning values,
//! ensuring they are always within valid ranges.

// =============================================================================
// Frame Queue Depth
// =============================================================================

/// Frame queue bounds (decoded frames held ahead of presentation).
pub mod frame_queue_bounds {
    /// Minimum queue depth.
    pub const MIN: usize = 2;
    /// Maximum queue depth.
    pub const MAX: usize = 120;
    /// Default queue depth.
    pub const DEFAULT: usize = 16;
}

/// Number of decoded frames a decoder buffers before reporting "full".
///
/// A decoder whose queue reaches this depth stops decoding until frames are
/// grabbed; a drained queue is what the playback engine sees as an empty
/// video buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameQueueDepth(usize);

impl FrameQueueDepth {
    /// Creates a new queue depth, clamping to valid range.
    #[must_use]
    pub fn new(value: usize) -> Self {
        Self(value.clamp(frame_queue_bounds::MIN, frame_queue_bounds::MAX))
    }

    /// Returns the value as usize.
    #[must_use]
    pub fn value(self) -> usize {
        self.0
    }
}

impl Default for FrameQueueDepth {
    fn default() -> Self {
        Self(frame_queue_bounds::DEFAULT)
    }
}

// =============================================================================
// Audio Queue Depth
// =============================================================================

/// Audio queue bounds (decoded audio chunks waiting to be drained).
pub mod audio_queue_bounds {
    /// Minimum queue depth.
    pub const MIN: usize = 4;
    /// Maximum queue depth.
    pub const MAX: usize = 1024;
    /// Default queue depth.
    pub const DEFAULT: usize = 64;
}

/// Number of audio chunks a decoder holds before it stops decoding.
///
/// Audio is not rendered, but a full audio queue still blocks decode
/// progress until the playback engine drains it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioQueueDepth(usize);

impl AudioQueueDepth {
    /// Creates a new queue depth, clamping to valid range.
    #[must_use]
    pub fn new(value: usize) -> Self {
        Self(value.clamp(audio_queue_bounds::MIN, audio_queue_bounds::MAX))
    }

    /// Returns the value as usize.
    #[must_use]
    pub fn value(self) -> usize {
        self.0
    }
}

impl Default for AudioQueueDepth {
    fn default() -> Self {
        Self(audio_queue_bounds::DEFAULT)
    }
}

// =============================================================================
// Tick Rate
// =============================================================================

/// Tick rate bounds in Hz.
pub mod tick_rate_bounds {
    /// Minimum ticks per second.
    pub const MIN: u32 = 1;
    /// Maximum ticks per second.
    pub const MAX: u32 = 240;
    /// Default ticks per second.
    pub const DEFAULT: u32 = 60;
}

/// Rate at which a host drives the playback tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRate(u32);

impl TickRate {
    /// Creates a new tick rate, clamping to valid range.
    #[must_use]
    pub fn new(hz: u32) -> Self {
        Self(hz.clamp(tick_rate_bounds::MIN, tick_rate_bounds::MAX))
    }

    /// Returns the rate in Hz.
    #[must_use]
    pub fn hz(self) -> u32 {
        self.0
    }

    /// Returns the interval between ticks in seconds.
    #[must_use]
    pub fn interval_secs(self) -> f64 {
        1.0 / f64::from(self.0)
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self(tick_rate_bounds::DEFAULT)
    }
}
