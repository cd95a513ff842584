// SPDX-License-Identifier: MPL-2.0
//! Owned decoder session.
//!
//! [`DecoderHandle`] owns a [`DecoderEngine`] and at most one session on it.
//! It enforces the session lifecycle (no double loads, decoding only from
//! `Initialized`, destroy only from `Decoding`) and guarantees the session is
//! released when the handle is dropped, whatever state playback is in.

use std::fmt;
use std::path::Path;

use crate::application::port::{AudioChunk, DecoderEngine};
use crate::domain::error::VideoError;
use crate::domain::video::{DecoderId, DecoderState, VideoFormat};

/// Why a load request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRejection {
    /// The current session already holds open media.
    SessionLive(DecoderState),
    /// An asynchronous open is still in progress.
    AsyncPending,
}

impl fmt::Display for LoadRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionLive(state) => write!(f, "session already {:?}", state),
            Self::AsyncPending => write!(f, "asynchronous load in progress"),
        }
    }
}

/// Exclusive owner of one decoder session.
pub struct DecoderHandle<E: DecoderEngine> {
    engine: E,
    session: Option<DecoderId>,
    format: Option<VideoFormat>,
}

impl<E: DecoderEngine> DecoderHandle<E> {
    /// Wraps an engine with no open session.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            session: None,
            format: None,
        }
    }

    /// Identifier of the current session, if any.
    pub fn id(&self) -> Option<DecoderId> {
        self.session
    }

    /// Lifecycle state of the current session.
    ///
    /// Reports `Uninitialized` when no session exists.
    pub fn state(&self) -> DecoderState {
        self.session
            .map_or(DecoderState::Uninitialized, |id| self.engine.state(id))
    }

    /// Format captured when the session initialized.
    pub fn format(&self) -> Option<VideoFormat> {
        self.format
    }

    /// Classified failure reason of an `InitFailed` session.
    pub fn failure(&self) -> Option<VideoError> {
        self.session.and_then(|id| self.engine.failure(id))
    }

    fn ensure_loadable(&self) -> Result<(), LoadRejection> {
        let state = self.state();
        if state.is_live() {
            return Err(LoadRejection::SessionLive(state));
        }
        if self.session.is_some() && state == DecoderState::Uninitialized {
            return Err(LoadRejection::AsyncPending);
        }
        Ok(())
    }

    /// Drops a failed or destroyed session before a fresh load.
    fn discard_stale_session(&mut self) {
        if let Some(id) = self.session.take() {
            self.engine.schedule_destroy(id);
        }
        self.format = None;
    }

    /// Opens `path` synchronously.
    ///
    /// Returns the state the session settled in (`Initialized` on success).
    ///
    /// # Errors
    ///
    /// Refuses without side effects while a session is live or pending.
    pub fn create(&mut self, path: &Path) -> Result<DecoderState, LoadRejection> {
        self.ensure_loadable()?;
        self.discard_stale_session();

        let id = self.engine.create(path);
        self.session = Some(id);
        let state = self.engine.state(id);
        if state == DecoderState::Initialized {
            self.format = self.engine.format(id);
        }
        Ok(state)
    }

    /// Starts opening `path` without waiting.
    ///
    /// # Errors
    ///
    /// Refuses without side effects while a session is live or pending.
    pub fn create_async(&mut self, path: &Path) -> Result<DecoderId, LoadRejection> {
        self.ensure_loadable()?;
        self.discard_stale_session();

        let id = self.engine.create_async(path);
        self.session = Some(id);
        Ok(id)
    }

    /// Reads the format of a session that finished opening asynchronously.
    pub fn capture_format(&mut self) -> Option<VideoFormat> {
        if self.format.is_none() {
            self.format = self.session.and_then(|id| self.engine.format(id));
        }
        self.format
    }

    /// Starts decoding. Only valid from `Initialized`.
    pub fn start_decoding(&mut self) -> bool {
        match self.session {
            Some(id) if self.engine.state(id) == DecoderState::Initialized => {
                self.engine.start_decoding(id);
                true
            }
            _ => false,
        }
    }

    /// Destroys the session. Only valid from `Decoding`.
    pub fn destroy(&mut self) -> bool {
        match self.session {
            Some(id) if self.engine.state(id) == DecoderState::Decoding => {
                self.engine.destroy(id);
                self.session = None;
                self.format = None;
                true
            }
            _ => false,
        }
    }

    pub fn set_seek_time(&mut self, secs: f64) {
        if let Some(id) = self.session {
            self.engine.set_seek_time(id, secs);
        }
    }

    pub fn set_video_time(&mut self, secs: f64) {
        if let Some(id) = self.session {
            self.engine.set_video_time(id, secs);
        }
    }

    pub fn is_video_buffer_full(&self) -> bool {
        self.session
            .is_some_and(|id| self.engine.is_video_buffer_full(id))
    }

    pub fn is_video_buffer_empty(&self) -> bool {
        self.session
            .is_some_and(|id| self.engine.is_video_buffer_empty(id))
    }

    pub fn is_eof(&self) -> bool {
        self.session.is_some_and(|id| self.engine.is_eof(id))
    }

    pub fn is_seek_over(&self) -> bool {
        self.session.is_some_and(|id| self.engine.is_seek_over(id))
    }

    /// Polls for a frame due for display. Never blocks.
    pub fn grab_video_frame(&mut self) -> Option<&[u8]> {
        let id = self.session?;
        self.engine.grab_video_frame(id)
    }

    pub fn release_video_frame(&mut self) {
        if let Some(id) = self.session {
            self.engine.release_video_frame(id);
        }
    }

    /// Polls for a decoded audio chunk. Never blocks.
    pub fn audio_data(&mut self) -> Option<AudioChunk<'_>> {
        let id = self.session?;
        self.engine.audio_data(id)
    }

    pub fn free_audio_data(&mut self) {
        if let Some(id) = self.session {
            self.engine.free_audio_data(id);
        }
    }
}

impl<E: DecoderEngine> Drop for DecoderHandle<E> {
    fn drop(&mut self) {
        if let Some(id) = self.session.take() {
            self.engine.schedule_destroy(id);
        }
    }
}

impl<E: DecoderEngine> fmt::Debug for DecoderHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderHandle")
            .field("session", &self.session)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}
