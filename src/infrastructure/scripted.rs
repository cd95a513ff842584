// SPDX-License-Identifier: MPL-2.0
//! Deterministic in-memory decoder engine.
//!
//! [`ScriptedEngine`] implements [`DecoderEngine`] without touching any media
//! file. Its buffer flags, queued frames and load outcomes are driven through
//! a paired [`ScriptControl`], which also records every request the engine
//! received. Used by tests and benchmarks to reproduce exact tick sequences.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::application::port::{AudioChunk, DecoderEngine};
use crate::domain::error::VideoError;
use crate::domain::video::{DecoderId, DecoderState, VideoFormat};

#[derive(Debug)]
struct ScriptedSession {
    path: PathBuf,
    state: DecoderState,
    format: Option<VideoFormat>,
    failure: Option<VideoError>,
    /// Outcome applied when a held asynchronous load completes.
    pending: Option<Result<VideoFormat, VideoError>>,
}

#[derive(Debug)]
struct ScriptState {
    next_id: u64,
    sessions: HashMap<DecoderId, ScriptedSession>,

    next_format: Option<VideoFormat>,
    fail_next: bool,
    hold_async: bool,

    frames: VecDeque<Vec<u8>>,
    audio: VecDeque<(Vec<u8>, f64)>,
    buffer_full: bool,
    buffer_empty: bool,
    eof: bool,
    seek_over: bool,

    created: usize,
    seek_requests: Vec<f64>,
    video_times: Vec<f64>,
    destroyed: Vec<DecoderId>,
    scheduled: Vec<DecoderId>,
    released_frames: usize,
    freed_audio: usize,
}

impl Default for ScriptState {
    fn default() -> Self {
        Self {
            next_id: 1,
            sessions: HashMap::new(),
            next_format: None,
            fail_next: false,
            hold_async: false,
            frames: VecDeque::new(),
            audio: VecDeque::new(),
            buffer_full: false,
            buffer_empty: false,
            eof: false,
            seek_over: true,
            created: 0,
            seek_requests: Vec::new(),
            video_times: Vec::new(),
            destroyed: Vec::new(),
            scheduled: Vec::new(),
            released_frames: 0,
            freed_audio: 0,
        }
    }
}

impl ScriptState {
    fn open_outcome(&mut self) -> Result<VideoFormat, VideoError> {
        if std::mem::take(&mut self.fail_next) {
            return Err(VideoError::CorruptedFile);
        }
        self.next_format.ok_or(VideoError::NoVideoStream)
    }

    fn new_session(&mut self, path: &Path) -> (DecoderId, &mut ScriptedSession) {
        let id = DecoderId::new(self.next_id);
        self.next_id += 1;
        self.created += 1;
        let session = self.sessions.entry(id).or_insert(ScriptedSession {
            path: path.to_path_buf(),
            state: DecoderState::Uninitialized,
            format: None,
            failure: None,
            pending: None,
        });
        (id, session)
    }

    fn is_open(&self, id: DecoderId) -> bool {
        self.sessions.get(&id).is_some_and(|s| s.state.is_live())
    }
}

impl ScriptedSession {
    fn settle(&mut self, outcome: Result<VideoFormat, VideoError>) {
        match outcome {
            Ok(format) => {
                self.state = DecoderState::Initialized;
                self.format = Some(format);
            }
            Err(err) => {
                self.state = DecoderState::InitFailed;
                self.failure = Some(err);
            }
        }
    }
}

fn lock(shared: &Mutex<ScriptState>) -> MutexGuard<'_, ScriptState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory engine driven by a [`ScriptControl`].
#[derive(Debug)]
pub struct ScriptedEngine {
    shared: Arc<Mutex<ScriptState>>,
    grabbed: Option<Vec<u8>>,
    audio: Option<(Vec<u8>, f64)>,
}

/// Script and inspection handle for a [`ScriptedEngine`].
#[derive(Debug, Clone)]
pub struct ScriptControl {
    shared: Arc<Mutex<ScriptState>>,
}

impl ScriptedEngine {
    /// Creates an engine and its control handle.
    ///
    /// Loads fail with [`VideoError::NoVideoStream`] until a format is set
    /// with [`ScriptControl::set_next_format`].
    #[allow(clippy::new_ret_no_self)]
    #[must_use]
    pub fn new() -> (Self, ScriptControl) {
        let shared = Arc::new(Mutex::new(ScriptState::default()));
        let engine = Self {
            shared: Arc::clone(&shared),
            grabbed: None,
            audio: None,
        };
        (engine, ScriptControl { shared })
    }
}

impl DecoderEngine for ScriptedEngine {
    fn create(&mut self, path: &Path) -> DecoderId {
        let mut state = lock(&self.shared);
        let outcome = state.open_outcome();
        let (id, session) = state.new_session(path);
        session.settle(outcome);
        id
    }

    fn create_async(&mut self, path: &Path) -> DecoderId {
        let mut state = lock(&self.shared);
        let outcome = state.open_outcome();
        let hold = state.hold_async;
        let (id, session) = state.new_session(path);
        if hold {
            session.pending = Some(outcome);
        } else {
            session.settle(outcome);
        }
        id
    }

    fn state(&self, id: DecoderId) -> DecoderState {
        lock(&self.shared)
            .sessions
            .get(&id)
            .map_or(DecoderState::Destroyed, |s| s.state)
    }

    fn format(&self, id: DecoderId) -> Option<VideoFormat> {
        lock(&self.shared).sessions.get(&id).and_then(|s| s.format)
    }

    fn start_decoding(&mut self, id: DecoderId) {
        if let Some(session) = lock(&self.shared).sessions.get_mut(&id) {
            if session.state == DecoderState::Initialized {
                session.state = DecoderState::Decoding;
            }
        }
    }

    fn destroy(&mut self, id: DecoderId) {
        let mut state = lock(&self.shared);
        if state.sessions.remove(&id).is_some() {
            state.destroyed.push(id);
        }
        self.grabbed = None;
        self.audio = None;
    }

    fn schedule_destroy(&mut self, id: DecoderId) {
        let mut state = lock(&self.shared);
        if state.sessions.remove(&id).is_some() {
            state.scheduled.push(id);
        }
    }

    fn set_seek_time(&mut self, id: DecoderId, secs: f64) {
        let mut state = lock(&self.shared);
        if state.is_open(id) {
            state.seek_requests.push(secs);
            state.seek_over = false;
        }
    }

    fn set_video_time(&mut self, id: DecoderId, secs: f64) {
        let mut state = lock(&self.shared);
        if state.is_open(id) {
            state.video_times.push(secs);
        }
    }

    fn is_video_buffer_full(&self, id: DecoderId) -> bool {
        let state = lock(&self.shared);
        state.is_open(id) && state.buffer_full
    }

    fn is_video_buffer_empty(&self, id: DecoderId) -> bool {
        let state = lock(&self.shared);
        !state.is_open(id) || state.buffer_empty
    }

    fn is_eof(&self, id: DecoderId) -> bool {
        let state = lock(&self.shared);
        state.is_open(id) && state.eof
    }

    fn is_seek_over(&self, id: DecoderId) -> bool {
        let state = lock(&self.shared);
        state.is_open(id) && state.seek_over
    }

    fn grab_video_frame(&mut self, id: DecoderId) -> Option<&[u8]> {
        if self.grabbed.is_none() {
            let mut state = lock(&self.shared);
            if !state.is_open(id) {
                return None;
            }
            self.grabbed = state.frames.pop_front();
        }
        self.grabbed.as_deref()
    }

    fn release_video_frame(&mut self, _id: DecoderId) {
        if self.grabbed.take().is_some() {
            lock(&self.shared).released_frames += 1;
        }
    }

    fn audio_data(&mut self, id: DecoderId) -> Option<AudioChunk<'_>> {
        if self.audio.is_none() {
            let mut state = lock(&self.shared);
            if !state.is_open(id) {
                return None;
            }
            self.audio = state.audio.pop_front();
        }
        self.audio.as_ref().map(|(data, time_secs)| AudioChunk {
            data,
            time_secs: *time_secs,
        })
    }

    fn free_audio_data(&mut self, _id: DecoderId) {
        if self.audio.take().is_some() {
            lock(&self.shared).freed_audio += 1;
        }
    }

    fn failure(&self, id: DecoderId) -> Option<VideoError> {
        lock(&self.shared)
            .sessions
            .get(&id)
            .and_then(|s| s.failure.clone())
    }
}

impl ScriptControl {
    fn state(&self) -> MutexGuard<'_, ScriptState> {
        lock(&self.shared)
    }

    // =========================================================================
    // Scripting
    // =========================================================================

    /// Format reported by subsequent successful loads.
    pub fn set_next_format(&self, format: VideoFormat) {
        self.state().next_format = Some(format);
    }

    /// Makes the next load fail with [`VideoError::CorruptedFile`].
    pub fn fail_next_load(&self) {
        self.state().fail_next = true;
    }

    /// Holds asynchronous loads in `Uninitialized` until
    /// [`complete_async_loads`](Self::complete_async_loads).
    pub fn set_async_pending(&self, hold: bool) {
        self.state().hold_async = hold;
    }

    /// Settles every held asynchronous load with its scripted outcome.
    pub fn complete_async_loads(&self) {
        for session in self.state().sessions.values_mut() {
            if let Some(outcome) = session.pending.take() {
                session.settle(outcome);
            }
        }
    }

    /// Queues a frame for `grab_video_frame`.
    pub fn push_frame(&self, data: Vec<u8>) {
        self.state().frames.push_back(data);
    }

    /// Queues an audio chunk for `audio_data`.
    pub fn push_audio(&self, data: Vec<u8>, time_secs: f64) {
        self.state().audio.push_back((data, time_secs));
    }

    pub fn set_buffer_full(&self, full: bool) {
        self.state().buffer_full = full;
    }

    pub fn set_buffer_empty(&self, empty: bool) {
        self.state().buffer_empty = empty;
    }

    pub fn set_eof(&self, eof: bool) {
        self.state().eof = eof;
    }

    /// Overrides seek completion. Every seek request clears it.
    pub fn set_seek_over(&self, over: bool) {
        self.state().seek_over = over;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Sessions created so far, failed ones included.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.state().created
    }

    /// Path the session was opened with.
    #[must_use]
    pub fn session_path(&self, id: DecoderId) -> Option<PathBuf> {
        self.state().sessions.get(&id).map(|s| s.path.clone())
    }

    #[must_use]
    pub fn seek_requests(&self) -> Vec<f64> {
        self.state().seek_requests.clone()
    }

    #[must_use]
    pub fn video_times(&self) -> Vec<f64> {
        self.state().video_times.clone()
    }

    /// Sessions released with a blocking destroy.
    #[must_use]
    pub fn destroyed(&self) -> Vec<DecoderId> {
        self.state().destroyed.clone()
    }

    /// Sessions released through `schedule_destroy`.
    #[must_use]
    pub fn scheduled_destroys(&self) -> Vec<DecoderId> {
        self.state().scheduled.clone()
    }

    #[must_use]
    pub fn released_frames(&self) -> usize {
        self.state().released_frames
    }

    #[must_use]
    pub fn freed_audio(&self) -> usize {
        self.state().freed_audio
    }

    #[must_use]
    pub fn queued_frames(&self) -> usize {
        self.state().frames.len()
    }
}
