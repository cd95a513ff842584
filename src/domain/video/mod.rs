// SPDX-License-Identifier: MPL-2.0
//! Video session domain types.
//!
//! This module contains the value types exchanged between the playback
//! engine and decoder adapters. They carry no infrastructure concerns.

pub mod format;
pub mod newtypes;
pub mod session;

// Re-export commonly used types
pub use format::{MediaLength, PixelFormat, VideoFormat, UNKNOWN_LENGTH_SECS};
pub use newtypes::{
    audio_queue_bounds, frame_queue_bounds, tick_rate_bounds, AudioQueueDepth, FrameQueueDepth,
    TickRate,
};
pub use session::{DecoderId, DecoderState};
