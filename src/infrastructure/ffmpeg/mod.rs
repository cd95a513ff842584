// SPDX-License-Identifier: MPL-2.0
//! `FFmpeg` adapter implementing the [`DecoderEngine`] port trait.
//!
//! [`FfmpegEngine`] runs one decode thread per session. The thread opens the
//! file, converts video frames to packed RGB24 and sends them, together with
//! raw decoded audio, over bounded `tokio` channels that the engine reads
//! without blocking.
//!
//! # Design Notes
//!
//! - `FFmpeg` contexts are created and dropped on the decode thread; only
//!   plain buffers cross threads
//! - Commands (start, seek, stop) go over an unbounded channel; a full frame
//!   or audio channel blocks the thread, which is the backpressure
//! - Channel capacities come from [`FrameQueueDepth`] and [`AudioQueueDepth`]
//! - Every seek bumps a generation counter; output tagged with an older one
//!   is dropped on arrival
//! - Frames are released in display order: a grab returns the newest frame
//!   due at the last reported video time and recycles older ones
//!
//! [`DecoderEngine`]: crate::application::port::DecoderEngine
//! [`FrameQueueDepth`]: crate::domain::video::FrameQueueDepth
//! [`AudioQueueDepth`]: crate::domain::video::AudioQueueDepth

mod engine;
mod shared;
mod worker;

use std::sync::Once;

use crate::error::{Error, Result};

pub use engine::FfmpegEngine;

static FFMPEG_INIT: Once = Once::new();

/// Initializes `FFmpeg` once per process and lowers its log level to errors.
///
/// # Errors
///
/// Returns an error if `FFmpeg` fails to initialize.
pub fn init_ffmpeg() -> Result<()> {
    let mut init_result: Result<()> = Ok(());

    FFMPEG_INIT.call_once(|| {
        if let Err(e) = ffmpeg_next::init() {
            init_result = Err(Error::Io(format!("FFmpeg initialization failed: {e}")));
            return;
        }

        // SAFETY: av_log_set_level is thread-safe and only affects logging
        unsafe {
            ffmpeg_next::ffi::av_log_set_level(ffmpeg_next::ffi::AV_LOG_ERROR);
        }
    });

    init_result
}
