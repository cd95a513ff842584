// SPDX-License-Identifier: MPL-2.0
//! [`DecoderEngine`] implementation over per-session decode threads.

use std::collections::HashMap;
use std::path::Path;
use std::sync::MutexGuard;
use std::thread::JoinHandle;

use tokio::sync::{mpsc, oneshot};

use super::shared::{self, AudioPacket, DecoderCommand, SessionStatus, SharedStatus, VideoFrame};
use super::worker::{self, WorkerChannels};
use crate::application::port::{AudioChunk, DecoderEngine};
use crate::domain::error::VideoError;
use crate::domain::video::{AudioQueueDepth, DecoderId, DecoderState, FrameQueueDepth, VideoFormat};

/// Engine side of one session.
struct SessionSlot {
    status: SharedStatus,
    commands: mpsc::UnboundedSender<DecoderCommand>,
    frames: mpsc::Receiver<VideoFrame>,
    audio: mpsc::Receiver<AudioPacket>,
    recycle: mpsc::UnboundedSender<Vec<u8>>,
    /// Oldest queued frame, taken off the channel but not due yet.
    lookahead: Option<VideoFrame>,
    /// Media time last reported by the player.
    video_time: f64,
    /// Generation of the latest seek; older output is discarded.
    generation: u64,
    worker: Option<JoinHandle<()>>,
}

impl SessionSlot {
    /// Creates the engine side of a session plus the channels for its thread.
    fn with_channels(
        frame_capacity: usize,
        audio_capacity: usize,
    ) -> (Self, WorkerChannels, oneshot::Receiver<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = mpsc::channel(frame_capacity);
        let (audio_tx, audio_rx) = mpsc::channel(audio_capacity);
        let (recycle_tx, recycle_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let slot = Self {
            status: shared::new_status(),
            commands: command_tx,
            frames: frame_rx,
            audio: audio_rx,
            recycle: recycle_tx,
            lookahead: None,
            video_time: 0.0,
            generation: 0,
            worker: None,
        };
        let channels = WorkerChannels {
            commands: command_rx,
            frames: frame_tx,
            audio: audio_tx,
            recycled: recycle_rx,
            ready: ready_tx,
        };
        (slot, channels, ready_rx)
    }

    fn send(&self, command: DecoderCommand) {
        if self.commands.send(command).is_err() {
            log::debug!("decode thread already exited, dropped {:?}", command);
        }
    }

    /// Whether the decode thread is gone (or never started).
    fn worker_exited(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Session state; a thread that exited before opening counts as failed.
    fn state(&self) -> DecoderState {
        let state = shared::lock(&self.status).state;
        if state == DecoderState::Uninitialized && self.worker_exited() {
            DecoderState::InitFailed
        } else {
            state
        }
    }

    fn failure(&self) -> Option<VideoError> {
        let status = shared::lock(&self.status);
        if status.failure.is_some() {
            return status.failure.clone();
        }
        (status.state == DecoderState::Uninitialized && self.worker_exited())
            .then(|| VideoError::Other("decode thread exited before opening".to_string()))
    }

    fn queued_frames(&self) -> usize {
        self.frames.len() + usize::from(self.lookahead.is_some())
    }

    /// Pops the newest frame not after the reported video time.
    ///
    /// Older due frames are late and frames decoded before the latest seek are
    /// stale; both go back to the thread's buffer pool.
    fn take_due_frame(&mut self) -> Option<VideoFrame> {
        let mut due: Option<VideoFrame> = None;
        while let Some(frame) = self
            .lookahead
            .take()
            .or_else(|| self.frames.try_recv().ok())
        {
            if frame.generation != self.generation {
                self.recycle_buffer(frame.data);
                continue;
            }
            if frame.pts_secs > self.video_time {
                self.lookahead = Some(frame);
                break;
            }
            if let Some(late) = due.replace(frame) {
                self.recycle_buffer(late.data);
            }
        }
        due
    }

    fn next_audio(&mut self) -> Option<AudioPacket> {
        loop {
            let packet = self.audio.try_recv().ok()?;
            if packet.generation == self.generation {
                return Some(packet);
            }
        }
    }

    fn recycle_buffer(&self, buffer: Vec<u8>) {
        // A closed pool means the thread is gone; the buffer is just dropped
        let _ = self.recycle.send(buffer);
    }

    /// Discards everything queued ahead of a seek.
    ///
    /// Draining also unblocks a thread waiting on a full queue.
    fn flush(&mut self) {
        if let Some(frame) = self.lookahead.take() {
            self.recycle_buffer(frame.data);
        }
        while let Ok(frame) = self.frames.try_recv() {
            self.recycle_buffer(frame.data);
        }
        while self.audio.try_recv().is_ok() {}
    }

    /// Tells the thread to exit and marks the session destroyed.
    fn signal_stop(&self) {
        shared::lock(&self.status).state = DecoderState::Destroyed;
        self.send(DecoderCommand::Stop);
    }
}

/// `FFmpeg`-backed decoder engine.
///
/// # Example
///
/// ```ignore
/// use tickplay::application::port::DecoderEngine;
/// use tickplay::infrastructure::ffmpeg::FfmpegEngine;
///
/// let mut engine = FfmpegEngine::default();
/// let id = engine.create(Path::new("video.mp4"));
/// engine.start_decoding(id);
/// ```
pub struct FfmpegEngine {
    sessions: HashMap<DecoderId, SessionSlot>,
    next_id: u64,
    frame_capacity: usize,
    audio_capacity: usize,
    grabbed: Option<(DecoderId, VideoFrame)>,
    audio: Option<(DecoderId, AudioPacket)>,
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new(FrameQueueDepth::default(), AudioQueueDepth::default())
    }
}

impl FfmpegEngine {
    #[must_use]
    pub fn new(frame_queue: FrameQueueDepth, audio_queue: AudioQueueDepth) -> Self {
        Self {
            sessions: HashMap::new(),
            next_id: 1,
            frame_capacity: frame_queue.value(),
            audio_capacity: audio_queue.value(),
            grabbed: None,
            audio: None,
        }
    }

    fn status(&self, id: DecoderId) -> Option<MutexGuard<'_, SessionStatus>> {
        self.sessions
            .get(&id)
            .map(|slot| shared::lock(&slot.status))
    }

    fn spawn(&mut self, path: &Path) -> (DecoderId, oneshot::Receiver<()>) {
        let id = DecoderId::new(self.next_id);
        self.next_id += 1;

        let (mut slot, channels, ready) =
            SessionSlot::with_channels(self.frame_capacity, self.audio_capacity);
        let thread_status = slot.status.clone();
        let thread_path = path.to_path_buf();
        let worker = std::thread::Builder::new()
            .name(format!("tickplay-{id}"))
            .spawn(move || worker::run(thread_path, thread_status, channels));

        match worker {
            Ok(handle) => slot.worker = Some(handle),
            Err(e) => {
                log::warn!("failed to spawn decode thread: {}", e);
                let mut status = shared::lock(&slot.status);
                status.state = DecoderState::InitFailed;
                status.failure = Some(VideoError::Other(e.to_string()));
            }
        }

        self.sessions.insert(id, slot);
        (id, ready)
    }

    fn remove(&mut self, id: DecoderId) -> Option<SessionSlot> {
        if self.grabbed.as_ref().is_some_and(|(held, _)| *held == id) {
            self.grabbed = None;
        }
        if self.audio.as_ref().is_some_and(|(held, _)| *held == id) {
            self.audio = None;
        }
        let slot = self.sessions.remove(&id)?;
        slot.signal_stop();
        Some(slot)
    }
}

impl DecoderEngine for FfmpegEngine {
    fn create(&mut self, path: &Path) -> DecoderId {
        let (id, ready) = self.spawn(path);
        // Errors when the thread exits without reporting; state() covers that
        let _ = ready.blocking_recv();
        id
    }

    fn create_async(&mut self, path: &Path) -> DecoderId {
        self.spawn(path).0
    }

    fn state(&self, id: DecoderId) -> DecoderState {
        self.sessions
            .get(&id)
            .map_or(DecoderState::Destroyed, SessionSlot::state)
    }

    fn format(&self, id: DecoderId) -> Option<VideoFormat> {
        self.status(id).and_then(|status| status.format)
    }

    fn start_decoding(&mut self, id: DecoderId) {
        let Some(slot) = self.sessions.get(&id) else {
            return;
        };
        {
            let mut status = shared::lock(&slot.status);
            if status.state != DecoderState::Initialized {
                return;
            }
            status.state = DecoderState::Decoding;
        }
        slot.send(DecoderCommand::Start);
    }

    fn destroy(&mut self, id: DecoderId) {
        let Some(mut slot) = self.remove(id) else {
            return;
        };
        let handle = slot.worker.take();
        // Dropping the receivers wakes a thread blocked on a full queue
        drop(slot);
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::warn!("decode thread for {} panicked", id);
            }
        }
    }

    fn schedule_destroy(&mut self, id: DecoderId) {
        // Dropping the handle detaches the thread; it exits on the stop command
        drop(self.remove(id));
    }

    fn set_seek_time(&mut self, id: DecoderId, secs: f64) {
        let Some(slot) = self.sessions.get_mut(&id) else {
            return;
        };
        if !shared::lock(&slot.status).state.is_live() {
            return;
        }

        slot.generation += 1;
        let generation = slot.generation;
        {
            let mut status = shared::lock(&slot.status);
            status.generation = generation;
            status.seeking = true;
            status.eof = false;
        }
        slot.flush();
        slot.send(DecoderCommand::Seek {
            target_secs: secs,
            generation,
        });
    }

    fn set_video_time(&mut self, id: DecoderId, secs: f64) {
        if let Some(slot) = self.sessions.get_mut(&id) {
            slot.video_time = secs;
        }
    }

    fn is_video_buffer_full(&self, id: DecoderId) -> bool {
        self.sessions
            .get(&id)
            .is_some_and(|slot| slot.queued_frames() >= self.frame_capacity)
    }

    fn is_video_buffer_empty(&self, id: DecoderId) -> bool {
        self.sessions
            .get(&id)
            .is_none_or(|slot| slot.queued_frames() == 0)
    }

    fn is_eof(&self, id: DecoderId) -> bool {
        self.status(id).is_some_and(|status| status.eof)
    }

    fn is_seek_over(&self, id: DecoderId) -> bool {
        self.status(id).is_some_and(|status| !status.seeking)
    }

    fn grab_video_frame(&mut self, id: DecoderId) -> Option<&[u8]> {
        if self.grabbed.as_ref().is_some_and(|(held, _)| *held != id) {
            return None;
        }
        if self.grabbed.is_none() {
            let frame = self.sessions.get_mut(&id)?.take_due_frame()?;
            self.grabbed = Some((id, frame));
        }
        self.grabbed.as_ref().map(|(_, frame)| frame.data.as_slice())
    }

    fn release_video_frame(&mut self, id: DecoderId) {
        let Some((held, frame)) = self.grabbed.take() else {
            return;
        };
        if held != id {
            self.grabbed = Some((held, frame));
            return;
        }
        if let Some(slot) = self.sessions.get(&id) {
            slot.recycle_buffer(frame.data);
        }
    }

    fn audio_data(&mut self, id: DecoderId) -> Option<AudioChunk<'_>> {
        if self.audio.as_ref().is_some_and(|(held, _)| *held != id) {
            return None;
        }
        if self.audio.is_none() {
            let packet = self.sessions.get_mut(&id)?.next_audio()?;
            self.audio = Some((id, packet));
        }
        self.audio.as_ref().map(|(_, packet)| AudioChunk {
            data: &packet.data,
            time_secs: packet.time_secs,
        })
    }

    fn free_audio_data(&mut self, id: DecoderId) {
        if self.audio.as_ref().is_some_and(|(held, _)| *held == id) {
            self.audio = None;
        }
    }

    fn failure(&self, id: DecoderId) -> Option<VideoError> {
        self.sessions.get(&id).and_then(SessionSlot::failure)
    }
}

impl Drop for FfmpegEngine {
    fn drop(&mut self) {
        for (_, slot) in self.sessions.drain() {
            slot.signal_stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(pts_secs: f64, generation: u64) -> VideoFrame {
        VideoFrame {
            pts_secs,
            generation,
            data: vec![0; 3],
        }
    }

    /// An engine holding one session with no decode thread behind it.
    fn engine_with_session(
        frame_capacity: usize,
        state: DecoderState,
    ) -> (FfmpegEngine, DecoderId, WorkerChannels) {
        let mut engine = FfmpegEngine::new(
            FrameQueueDepth::new(frame_capacity),
            AudioQueueDepth::default(),
        );
        let (slot, channels, _ready) =
            SessionSlot::with_channels(frame_capacity, engine.audio_capacity);
        shared::lock(&slot.status).state = state;
        let id = DecoderId::new(1);
        engine.sessions.insert(id, slot);
        (engine, id, channels)
    }

    #[test]
    fn unknown_session_reports_destroyed() {
        let mut engine = FfmpegEngine::default();
        let ghost = DecoderId::new(7);

        assert_eq!(engine.state(ghost), DecoderState::Destroyed);
        assert!(engine.is_video_buffer_empty(ghost));
        assert!(!engine.is_seek_over(ghost));
        assert!(engine.grab_video_frame(ghost).is_none());
        assert!(engine.audio_data(ghost).is_none());
        engine.destroy(ghost);
    }

    #[test]
    fn missing_file_fails_to_initialize() {
        let temp_dir = tempfile::tempdir().expect("should create temp dir");
        let mut engine = FfmpegEngine::default();

        let id = engine.create(&temp_dir.path().join("absent.mp4"));
        assert_eq!(engine.state(id), DecoderState::InitFailed);
        assert!(engine.failure(id).is_some());
        assert_eq!(engine.format(id), None);
    }

    #[test]
    fn garbage_file_fails_to_initialize() {
        let temp_dir = tempfile::tempdir().expect("should create temp dir");
        let path = temp_dir.path().join("fake.mp4");
        std::fs::write(&path, b"not a video").expect("write fixture");

        let mut engine = FfmpegEngine::default();
        let id = engine.create(&path);
        assert_eq!(engine.state(id), DecoderState::InitFailed);
        engine.schedule_destroy(id);
        assert_eq!(engine.state(id), DecoderState::Destroyed);
    }

    #[test]
    fn thread_exiting_before_open_reports_init_failed() {
        let (mut engine, id, channels) = engine_with_session(4, DecoderState::Uninitialized);
        let WorkerChannels { ready, .. } = channels;
        let (crash_tx, crash_rx) = oneshot::channel::<()>();
        let handle = std::thread::spawn(move || {
            let _ready = ready;
            let _ = crash_rx.blocking_recv();
            panic!("decoder crashed while opening");
        });
        if let Some(slot) = engine.sessions.get_mut(&id) {
            slot.worker = Some(handle);
        }

        assert_eq!(engine.state(id), DecoderState::Uninitialized);
        assert!(engine.failure(id).is_none());

        crash_tx.send(()).unwrap();
        while !engine.sessions[&id].worker_exited() {
            std::thread::yield_now();
        }
        assert_eq!(engine.state(id), DecoderState::InitFailed);
        assert!(matches!(engine.failure(id), Some(VideoError::Other(_))));
        engine.destroy(id);
    }

    #[test]
    fn blocking_open_returns_when_thread_dies() {
        let (ready_tx, ready_rx) = oneshot::channel::<()>();
        let handle = std::thread::spawn(move || {
            let _ready = ready_tx;
            panic!("decoder crashed while opening");
        });

        assert!(ready_rx.blocking_recv().is_err());
        assert!(handle.join().is_err());
    }

    #[test]
    fn due_frame_skips_late_ones() {
        let (mut engine, id, mut channels) = engine_with_session(8, DecoderState::Decoding);
        for pts in [0.0, 0.04, 0.08, 0.12] {
            channels.frames.try_send(frame(pts, 0)).unwrap();
        }
        engine.set_video_time(id, 0.09);

        let data = engine.grab_video_frame(id).unwrap().to_vec();
        assert_eq!(data, vec![0; 3]);
        assert!((engine.grabbed.as_ref().unwrap().1.pts_secs - 0.08).abs() < 1e-9);
        assert_eq!(engine.sessions[&id].queued_frames(), 1);

        // Two late frames went back to the pool, then the grabbed one
        engine.release_video_frame(id);
        let mut returned = 0;
        while channels.recycled.try_recv().is_ok() {
            returned += 1;
        }
        assert_eq!(returned, 3);
    }

    #[test]
    fn no_frame_is_due_before_its_time() {
        let (mut engine, id, channels) = engine_with_session(8, DecoderState::Decoding);
        channels.frames.try_send(frame(1.0, 0)).unwrap();
        engine.set_video_time(id, 0.5);

        assert!(engine.grab_video_frame(id).is_none());
        assert!(!engine.is_video_buffer_empty(id));
        assert_eq!(engine.sessions[&id].queued_frames(), 1);
    }

    #[test]
    fn buffer_queries_count_queued_frames() {
        let (engine, id, channels) = engine_with_session(2, DecoderState::Decoding);
        assert!(engine.is_video_buffer_empty(id));
        assert!(!engine.is_video_buffer_full(id));

        channels.frames.try_send(frame(0.0, 0)).unwrap();
        assert!(!engine.is_video_buffer_empty(id));
        assert!(!engine.is_video_buffer_full(id));

        channels.frames.try_send(frame(0.04, 0)).unwrap();
        assert!(engine.is_video_buffer_full(id));
    }

    #[test]
    fn seek_discards_stale_output_and_notifies_thread() {
        let (mut engine, id, mut channels) = engine_with_session(4, DecoderState::Decoding);
        channels.frames.try_send(frame(0.0, 0)).unwrap();
        channels.frames.try_send(frame(0.04, 0)).unwrap();

        engine.set_seek_time(id, 3.0);
        assert!(engine.is_video_buffer_empty(id));
        assert!(!engine.is_seek_over(id));
        assert_eq!(
            channels.commands.try_recv().ok(),
            Some(DecoderCommand::Seek {
                target_secs: 3.0,
                generation: 1
            })
        );

        // A frame sent before the thread saw the seek is dropped
        channels.frames.try_send(frame(0.08, 0)).unwrap();
        channels.frames.try_send(frame(3.0, 1)).unwrap();
        engine.set_video_time(id, 3.0);
        assert!(engine.grab_video_frame(id).is_some());
        assert!((engine.grabbed.as_ref().unwrap().1.pts_secs - 3.0).abs() < 1e-9);
        assert_eq!(engine.sessions[&id].queued_frames(), 0);
    }

    #[test]
    fn seek_is_ignored_once_destroyed() {
        let (mut engine, id, mut channels) = engine_with_session(4, DecoderState::Destroyed);
        engine.set_seek_time(id, 1.0);
        assert!(channels.commands.try_recv().is_err());
        assert!(engine.is_seek_over(id));
    }

    #[test]
    fn start_decoding_sends_start_once() {
        let (mut engine, id, mut channels) = engine_with_session(4, DecoderState::Initialized);
        engine.start_decoding(id);
        engine.start_decoding(id);

        assert_eq!(engine.state(id), DecoderState::Decoding);
        assert_eq!(channels.commands.try_recv().ok(), Some(DecoderCommand::Start));
        assert!(channels.commands.try_recv().is_err());
    }

    #[test]
    fn stale_audio_is_skipped() {
        let (mut engine, id, channels) = engine_with_session(4, DecoderState::Decoding);
        engine.set_seek_time(id, 2.0);
        for (time_secs, generation) in [(0.5, 0), (2.0, 1)] {
            channels
                .audio
                .try_send(AudioPacket {
                    time_secs,
                    generation,
                    data: vec![1, 2],
                })
                .unwrap();
        }

        let chunk = engine.audio_data(id).unwrap();
        assert!((chunk.time_secs - 2.0).abs() < 1e-9);
        engine.free_audio_data(id);
        assert!(engine.audio_data(id).is_none());
    }

    #[test]
    fn destroy_stops_the_thread() {
        let (mut engine, id, mut channels) = engine_with_session(4, DecoderState::Decoding);
        engine.destroy(id);

        assert_eq!(engine.state(id), DecoderState::Destroyed);
        assert_eq!(channels.commands.try_recv().ok(), Some(DecoderCommand::Stop));
        assert!(channels.frames.try_send(frame(0.0, 0)).is_err());
    }
}
