// SPDX-License-Identifier: MPL-2.0
//! Public playback control surface.
//!
//! [`PlaybackController`] owns one decoder session, the tick state machine,
//! the presentation sink and a wall-clock source. Commands validate their
//! preconditions against the session state and silently do nothing when they
//! do not hold; nothing here returns an error to the caller.

use std::path::Path;

use tokio::sync::mpsc;

use crate::application::port::{DecoderEngine, FrameSink, TimeSource};
use crate::diagnostics::{
    BufferCapacity, DiagnosticEventKind, DiagnosticsLog, PipelineStats,
};
use crate::domain::video::{DecoderState, MediaLength, VideoFormat};

use super::clock::SuspendReason;
use super::decoder::{DecoderHandle, LoadRejection};
use super::frame_transfer::FrameTransferPipeline;
use super::state::{PlaybackFlags, PlaybackStateMachine, TickOutcome};

/// Notification delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// An asynchronous load finished, successfully or not.
    AsyncLoaded { success: bool },
}

/// Real-time playback controller.
pub struct PlaybackController<E, S, T>
where
    E: DecoderEngine,
    S: FrameSink,
    T: TimeSource,
{
    decoder: DecoderHandle<E>,
    machine: PlaybackStateMachine,
    pipeline: FrameTransferPipeline,
    sink: S,
    time: T,
    subscribers: Vec<mpsc::UnboundedSender<PlaybackEvent>>,
    diagnostics: DiagnosticsLog,
}

impl<E, S, T> PlaybackController<E, S, T>
where
    E: DecoderEngine,
    S: FrameSink,
    T: TimeSource,
{
    /// Creates an idle controller with the default diagnostics capacity.
    pub fn new(engine: E, sink: S, time: T) -> Self {
        Self::with_diagnostics_capacity(engine, sink, time, BufferCapacity::default())
    }

    pub fn with_diagnostics_capacity(
        engine: E,
        sink: S,
        time: T,
        capacity: BufferCapacity,
    ) -> Self {
        Self {
            decoder: DecoderHandle::new(engine),
            machine: PlaybackStateMachine::new(),
            pipeline: FrameTransferPipeline::new(),
            sink,
            time,
            subscribers: Vec::new(),
            diagnostics: DiagnosticsLog::new(capacity),
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Opens `path` and waits for its metadata.
    ///
    /// Returns false if a session is already live or pending, or if the
    /// source could not be opened.
    pub fn load(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.record(DiagnosticEventKind::LoadRequested {
            asynchronous: false,
        });

        let state = match self.decoder.create(path) {
            Ok(state) => state,
            Err(rejection) => {
                self.reject_load(path, rejection);
                return false;
            }
        };

        let loaded = state == DecoderState::Initialized;
        if loaded {
            if let Some(format) = self.decoder.format() {
                self.pipeline.configure(&format);
            }
            log::info!("loaded {}", path.display());
        } else {
            log::warn!("failed to load {}: {}", path.display(), self.failure_message());
        }
        self.record_load_finished(loaded);
        loaded
    }

    /// Starts opening `path` in the background.
    ///
    /// Completion is observed by [`tick`](Self::tick) and announced with
    /// [`PlaybackEvent::AsyncLoaded`]. A refused request is announced as a
    /// failed load right away.
    pub fn load_async(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.record(DiagnosticEventKind::LoadRequested { asynchronous: true });

        if let Err(rejection) = self.decoder.create_async(path) {
            self.reject_load(path, rejection);
            self.emit(PlaybackEvent::AsyncLoaded { success: false });
            return;
        }

        log::info!("loading {} asynchronously", path.display());
        let flags = self.machine.flags_mut();
        flags.async_loading = true;
        flags.processing = true;
    }

    /// Starts or resumes playback.
    ///
    /// An initialized session starts decoding with the clock at zero; a
    /// paused one resumes from where it stopped.
    pub fn play(&mut self) {
        let now = self.time.now();

        if self.decoder.start_decoding() {
            let paused = self.machine.flags().paused;
            let clock = self.machine.clock_mut();
            clock.start(now);
            // A pause set before decoding started still holds the clock
            if paused {
                clock.suspend(SuspendReason::Paused, now);
            }
            let flags = self.machine.flags_mut();
            flags.buffering = false;
            flags.seeking = false;
            log::debug!("decoding started");
            self.record(DiagnosticEventKind::PlaybackStarted);
        } else if self.machine.flags().paused {
            self.machine.flags_mut().paused = false;
            self.machine.clock_mut().resume(SuspendReason::Paused, now);
            self.record(DiagnosticEventKind::Resumed);
        }

        self.machine.clock_mut().anchor(now);
        self.machine.flags_mut().processing = true;
    }

    /// Stops playback and releases the session. Only valid while decoding.
    pub fn stop(&mut self) {
        if self.decoder.state() != DecoderState::Decoding {
            return;
        }

        let position = self.get_playback_position();
        self.decoder.destroy();
        self.pipeline.clear();
        self.machine.clock_mut().reset();
        self.machine.flags_mut().clear_transport();

        log::info!("stopped at {:.3}s", position);
        self.record(DiagnosticEventKind::Stopped);
    }

    /// Pauses or resumes. Media time does not advance while paused.
    pub fn set_paused(&mut self, paused: bool) {
        if self.machine.flags().paused == paused {
            return;
        }

        let now = self.time.now();
        self.machine.flags_mut().paused = paused;
        if paused {
            self.machine.clock_mut().suspend(SuspendReason::Paused, now);
            log::debug!("paused at {:.3}s", self.get_playback_position());
            self.record(DiagnosticEventKind::Paused);
        } else {
            self.machine.clock_mut().resume(SuspendReason::Paused, now);
            log::debug!("resumed at {:.3}s", self.get_playback_position());
            self.record(DiagnosticEventKind::Resumed);
        }
    }

    /// Seeks to `time_secs`, clamped into the media length. Only valid while
    /// decoding.
    pub fn seek(&mut self, time_secs: f64) {
        if self.decoder.state() != DecoderState::Decoding {
            return;
        }

        let target = self.length().clamp(time_secs);
        self.decoder.set_seek_time(target);
        self.decoder.set_video_time(target);

        let now = self.time.now();
        let clock = self.machine.clock_mut();
        clock.suspend(SuspendReason::Seeking, now);
        clock.seek(target, now);
        self.machine.flags_mut().seeking = true;

        log::debug!("seeking to {:.3}s (requested {:.3}s)", target, time_secs);
        self.record(DiagnosticEventKind::SeekRequested {
            requested_secs: time_secs,
            target_secs: target,
        });
    }

    /// Stores the loop preference. No restart on end-of-file is performed.
    pub fn set_loop(&mut self, enabled: bool) {
        if self.machine.flags().looping != enabled {
            self.machine.flags_mut().looping = enabled;
            self.record(DiagnosticEventKind::LoopChanged { enabled });
        }
    }

    /// Advances playback by one rendered frame.
    ///
    /// `delta_secs` is the render loop's frame time; media time itself is
    /// always derived from the wall clock.
    pub fn tick(&mut self, delta_secs: f64) -> TickOutcome {
        let now = self.time.now();
        log::trace!("tick at {:.4} (dt {:.4})", now, delta_secs);

        let outcome = self
            .machine
            .tick(now, &mut self.decoder, &mut self.pipeline, &mut self.sink);
        self.observe(&outcome);
        outcome
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// True while decoding and not paused.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        !self.machine.flags().paused && self.decoder.state() == DecoderState::Decoding
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.machine.flags().paused
    }

    /// Media length in seconds; `-1` when unknown or nothing is loaded.
    #[must_use]
    pub fn get_length(&self) -> f64 {
        self.length().as_secs_f64()
    }

    /// Last computed media position in seconds.
    #[must_use]
    pub fn get_playback_position(&self) -> f64 {
        self.machine.clock().current_time()
    }

    #[must_use]
    pub fn has_loop(&self) -> bool {
        self.machine.flags().looping
    }

    /// Registers an observer for playback notifications.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<PlaybackEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    #[must_use]
    pub fn decoder_state(&self) -> DecoderState {
        self.decoder.state()
    }

    #[must_use]
    pub fn format(&self) -> Option<VideoFormat> {
        self.decoder.format()
    }

    /// Bytes per frame for the loaded session.
    #[must_use]
    pub fn data_size(&self) -> Option<usize> {
        self.pipeline.layout().map(|layout| layout.data_size)
    }

    #[must_use]
    pub fn flags(&self) -> &PlaybackFlags {
        self.machine.flags()
    }

    #[must_use]
    pub fn decoder(&self) -> &DecoderHandle<E> {
        &self.decoder
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticsLog {
        &self.diagnostics
    }

    #[must_use]
    pub fn pipeline_stats(&self) -> PipelineStats {
        PipelineStats {
            frames_presented: self.pipeline.frames_presented(),
            frames_rejected: self.pipeline.frames_rejected(),
            audio_chunks_drained: self.pipeline.audio_chunks_drained(),
        }
    }

    /// Writes the diagnostics report to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be serialized or written.
    pub fn export_diagnostics(&self, path: &Path) -> crate::error::Result<()> {
        self.diagnostics
            .export_to_path(path, self.time.now(), self.pipeline_stats())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn length(&self) -> MediaLength {
        self.decoder
            .format()
            .map_or(MediaLength::Unknown, |format| format.length)
    }

    fn failure_message(&self) -> String {
        self.decoder
            .failure()
            .map_or_else(|| "unknown error".to_string(), |err| err.to_string())
    }

    fn reject_load(&mut self, path: &Path, rejection: LoadRejection) {
        log::warn!("rejected load of {}: {}", path.display(), rejection);
        self.record(DiagnosticEventKind::LoadRejected {
            reason: rejection.to_string(),
        });
    }

    fn record_load_finished(&mut self, success: bool) {
        let format = self.decoder.format().filter(|_| success);
        let error = (!success).then(|| self.failure_message());
        let error_kind = self
            .decoder
            .failure()
            .filter(|_| !success)
            .map(|err| err.kind().to_string());
        self.record(DiagnosticEventKind::LoadFinished {
            success,
            width: format.map(|f| f.width),
            height: format.map(|f| f.height),
            length_secs: format.map(|f| f.length.as_secs_f64()),
            error,
            error_kind,
        });
    }

    fn observe(&mut self, outcome: &TickOutcome) {
        match outcome {
            TickOutcome::AsyncLoaded { success } => {
                if *success {
                    log::info!("asynchronous load finished");
                } else {
                    log::warn!("asynchronous load failed: {}", self.failure_message());
                }
                self.record_load_finished(*success);
                self.emit(PlaybackEvent::AsyncLoaded { success: *success });
            }
            TickOutcome::BufferingEnded { stalled_secs, eof } => {
                self.record(DiagnosticEventKind::BufferingEnded {
                    stalled_secs: *stalled_secs,
                    eof: *eof,
                });
            }
            TickOutcome::SeekCompleted { stalled_secs } => {
                self.record(DiagnosticEventKind::SeekCompleted {
                    stalled_secs: *stalled_secs,
                });
            }
            TickOutcome::Played(step) => {
                if let Some(err) = &step.transfer_error {
                    log::warn!("frame transfer failed: {}", err);
                    self.record(DiagnosticEventKind::FrameTransferFailed {
                        message: err.to_string(),
                    });
                }
                if step.buffering_started {
                    self.record(DiagnosticEventKind::BufferingStarted);
                }
            }
            TickOutcome::Idle
            | TickOutcome::AsyncPending
            | TickOutcome::BufferingHeld
            | TickOutcome::SeekPending => {}
        }
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    fn record(&mut self, kind: DiagnosticEventKind) {
        let position = self.machine.clock().current_time();
        self.diagnostics.record(self.time.now(), position, kind);
    }
}
