// SPDX-License-Identifier: MPL-2.0
//! Decoder engine port definition.
//!
//! This module defines the [`DecoderEngine`] trait: the narrow request/response
//! contract through which the playback engine drives an external decoder.
//! Infrastructure adapters (like `FFmpeg`) implement this trait.
//!
//! # Design Notes
//!
//! - Sessions are addressed by [`DecoderId`]; an engine may host several
//! - Every query is non-blocking and safe to call once per rendered frame
//! - Frame and audio buffers stay owned by the engine; callers copy out and
//!   then release them explicitly
//! - Audio is exposed only so callers can relieve backpressure

use std::path::Path;

use crate::domain::error::VideoError;
use crate::domain::video::{DecoderId, DecoderState, VideoFormat};

/// One decoded audio chunk, borrowed from the engine until freed.
#[derive(Debug, Clone, Copy)]
pub struct AudioChunk<'a> {
    /// Raw sample bytes, layout defined by the engine.
    pub data: &'a [u8],
    /// Presentation time of the chunk in seconds.
    pub time_secs: f64,
}

impl AudioChunk<'_> {
    /// Size of the chunk in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the chunk carries no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// =============================================================================
// DecoderEngine Trait
// =============================================================================

/// Port for a polled video decoder engine.
///
/// # Lifecycle
///
/// 1. [`create`](Self::create) or [`create_async`](Self::create_async) a session
/// 2. Poll [`state`](Self::state) until `Initialized` (async) or read it once (sync)
/// 3. [`start_decoding`](Self::start_decoding)
/// 4. Each tick: query buffer/EOF/seek flags, [`grab_video_frame`](Self::grab_video_frame)
///    and [`release_video_frame`](Self::release_video_frame),
///    [`set_video_time`](Self::set_video_time)
/// 5. [`destroy`](Self::destroy) or [`schedule_destroy`](Self::schedule_destroy)
///
/// Calls addressing an unknown or destroyed session are no-ops; queries on
/// them report `DecoderState::Destroyed`, empty buffers and no frames.
pub trait DecoderEngine {
    /// Opens a media source and returns once metadata is available or the
    /// open has failed.
    fn create(&mut self, path: &Path) -> DecoderId;

    /// Starts opening a media source and returns immediately.
    ///
    /// The session reports `Uninitialized` until the open completes.
    fn create_async(&mut self, path: &Path) -> DecoderId;

    /// Current lifecycle state of the session.
    fn state(&self, id: DecoderId) -> DecoderState;

    /// Frame geometry and length; `None` before the session is initialized.
    fn format(&self, id: DecoderId) -> Option<VideoFormat>;

    /// Starts producing frames. Only meaningful in `Initialized`.
    fn start_decoding(&mut self, id: DecoderId);

    /// Releases the session and waits for in-flight work to stop.
    fn destroy(&mut self, id: DecoderId);

    /// Releases the session without waiting; used at teardown so a transfer
    /// in flight on the engine side is never invalidated mid-copy.
    fn schedule_destroy(&mut self, id: DecoderId);

    /// Requests a seek to `secs`.
    fn set_seek_time(&mut self, id: DecoderId, secs: f64);

    /// Tells the engine the current media time so it can pace frame release.
    fn set_video_time(&mut self, id: DecoderId, secs: f64);

    /// True when the engine has buffered as many frames as it will hold.
    fn is_video_buffer_full(&self, id: DecoderId) -> bool;

    /// True when no decoded frame is queued.
    fn is_video_buffer_empty(&self, id: DecoderId) -> bool;

    /// True once the end of the media source has been reached.
    fn is_eof(&self, id: DecoderId) -> bool;

    /// True once the last requested seek has completed.
    fn is_seek_over(&self, id: DecoderId) -> bool;

    /// Returns the next frame due for display, if any.
    ///
    /// The returned bytes are owned by the engine and remain valid only until
    /// [`release_video_frame`](Self::release_video_frame).
    fn grab_video_frame(&mut self, id: DecoderId) -> Option<&[u8]>;

    /// Returns the grabbed frame's slot to the engine.
    fn release_video_frame(&mut self, id: DecoderId);

    /// Returns the next decoded audio chunk, if any.
    fn audio_data(&mut self, id: DecoderId) -> Option<AudioChunk<'_>>;

    /// Frees the chunk returned by [`audio_data`](Self::audio_data).
    fn free_audio_data(&mut self, id: DecoderId);

    /// Classified reason for an `InitFailed` session, if known.
    fn failure(&self, _id: DecoderId) -> Option<VideoError> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_chunk_reports_length() {
        let bytes = [0u8; 16];
        let chunk = AudioChunk {
            data: &bytes,
            time_secs: 1.5,
        };
        assert_eq!(chunk.len(), 16);
        assert!(!chunk.is_empty());
    }
}
