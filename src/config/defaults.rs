// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! This module serves as the single source of truth for default values
//! used across the crate. Constants are organized by category.
//!
//! # Categories
//!
//! - **Decoder queues**: Frame and audio queue depths of the decoder engine
//! - **Tick rate**: Rate at which the headless driver ticks the controller
//! - **Diagnostics**: Playback event ring capacity

use crate::domain::diagnostics::buffer_capacity_bounds;
use crate::domain::video::{audio_queue_bounds, frame_queue_bounds, tick_rate_bounds};

// ==========================================================================
// Decoder Queue Defaults
// ==========================================================================

/// Default number of decoded frames buffered ahead of presentation.
pub const DEFAULT_FRAME_QUEUE_CAPACITY: usize = frame_queue_bounds::DEFAULT;

/// Minimum frame queue depth.
pub const MIN_FRAME_QUEUE_CAPACITY: usize = frame_queue_bounds::MIN;

/// Maximum frame queue depth.
pub const MAX_FRAME_QUEUE_CAPACITY: usize = frame_queue_bounds::MAX;

/// Default number of decoded audio chunks held before the decoder stalls.
pub const DEFAULT_AUDIO_QUEUE_CAPACITY: usize = audio_queue_bounds::DEFAULT;

/// Minimum audio queue depth.
pub const MIN_AUDIO_QUEUE_CAPACITY: usize = audio_queue_bounds::MIN;

/// Maximum audio queue depth.
pub const MAX_AUDIO_QUEUE_CAPACITY: usize = audio_queue_bounds::MAX;

// ==========================================================================
// Tick Rate Defaults
// ==========================================================================

/// Default tick rate (in Hz).
pub const DEFAULT_TICK_RATE_HZ: u32 = tick_rate_bounds::DEFAULT;

/// Minimum tick rate (in Hz).
pub const MIN_TICK_RATE_HZ: u32 = tick_rate_bounds::MIN;

/// Maximum tick rate (in Hz).
pub const MAX_TICK_RATE_HZ: u32 = tick_rate_bounds::MAX;

// ==========================================================================
// Diagnostics Defaults
// ==========================================================================

/// Default number of playback events kept for export.
pub const DEFAULT_DIAGNOSTICS_BUFFER_CAPACITY: usize = buffer_capacity_bounds::DEFAULT;

/// Minimum diagnostics buffer capacity.
pub const MIN_DIAGNOSTICS_BUFFER_CAPACITY: usize = buffer_capacity_bounds::MIN;

/// Maximum diagnostics buffer capacity.
pub const MAX_DIAGNOSTICS_BUFFER_CAPACITY: usize = buffer_capacity_bounds::MAX;

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    // Decoder queue validation
    assert!(MIN_FRAME_QUEUE_CAPACITY >= 2);
    assert!(MAX_FRAME_QUEUE_CAPACITY >= MIN_FRAME_QUEUE_CAPACITY);
    assert!(DEFAULT_FRAME_QUEUE_CAPACITY >= MIN_FRAME_QUEUE_CAPACITY);
    assert!(DEFAULT_FRAME_QUEUE_CAPACITY <= MAX_FRAME_QUEUE_CAPACITY);
    assert!(MIN_AUDIO_QUEUE_CAPACITY > 0);
    assert!(MAX_AUDIO_QUEUE_CAPACITY >= MIN_AUDIO_QUEUE_CAPACITY);
    assert!(DEFAULT_AUDIO_QUEUE_CAPACITY >= MIN_AUDIO_QUEUE_CAPACITY);
    assert!(DEFAULT_AUDIO_QUEUE_CAPACITY <= MAX_AUDIO_QUEUE_CAPACITY);

    // Tick rate validation
    assert!(MIN_TICK_RATE_HZ > 0);
    assert!(MAX_TICK_RATE_HZ >= MIN_TICK_RATE_HZ);
    assert!(DEFAULT_TICK_RATE_HZ >= MIN_TICK_RATE_HZ);
    assert!(DEFAULT_TICK_RATE_HZ <= MAX_TICK_RATE_HZ);

    // Diagnostics validation
    assert!(MIN_DIAGNOSTICS_BUFFER_CAPACITY > 0);
    assert!(MAX_DIAGNOSTICS_BUFFER_CAPACITY >= MIN_DIAGNOSTICS_BUFFER_CAPACITY);
    assert!(DEFAULT_DIAGNOSTICS_BUFFER_CAPACITY >= MIN_DIAGNOSTICS_BUFFER_CAPACITY);
    assert!(DEFAULT_DIAGNOSTICS_BUFFER_CAPACITY <= MAX_DIAGNOSTICS_BUFFER_CAPACITY);
};
