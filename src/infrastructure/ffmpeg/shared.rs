// SPDX-License-Identifier: MPL-2.0
//! Messages and status shared between an engine and one decode thread.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::error::VideoError;
use crate::domain::video::{DecoderState, VideoFormat};

/// Commands sent to the decode thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum DecoderCommand {
    /// Begin decoding; sent once the session is initialized.
    Start,

    /// Jump to `target_secs`. Output tagged with an older generation is stale.
    Seek { target_secs: f64, generation: u64 },

    /// Exit the thread.
    Stop,
}

/// Decoded RGB24 frame with its presentation time.
#[derive(Debug)]
pub(super) struct VideoFrame {
    pub pts_secs: f64,
    pub generation: u64,
    pub data: Vec<u8>,
}

/// Decoded audio, first plane only.
#[derive(Debug)]
pub(super) struct AudioPacket {
    pub time_secs: f64,
    pub generation: u64,
    pub data: Vec<u8>,
}

/// Status written by the decode thread and read by the engine.
#[derive(Debug)]
pub(super) struct SessionStatus {
    pub state: DecoderState,
    pub format: Option<VideoFormat>,
    pub failure: Option<VideoError>,
    /// Generation of the latest seek request.
    pub generation: u64,
    /// True from a seek request until the first frame of its generation.
    pub seeking: bool,
    pub eof: bool,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            state: DecoderState::Uninitialized,
            format: None,
            failure: None,
            generation: 0,
            seeking: false,
            eof: false,
        }
    }
}

impl SessionStatus {
    /// Whether `generation` is still the latest seek.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

pub(super) type SharedStatus = Arc<Mutex<SessionStatus>>;

pub(super) fn new_status() -> SharedStatus {
    Arc::new(Mutex::new(SessionStatus::default()))
}

/// Locks the status, recovering it if the decode thread panicked while holding it.
pub(super) fn lock(status: &Mutex<SessionStatus>) -> MutexGuard<'_, SessionStatus> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}
