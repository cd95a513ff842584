// SPDX-License-Identifier: MPL-2.0
//! Tick-driven playback state machine.
//!
//! Each tick resolves exactly one branch, in strict priority order:
//!
//! 1. `AsyncLoading`: only polls the decoder for open completion
//! 2. `Idle`: not processing, or paused
//! 3. `Buffering`: waits for the frame queue to refill or EOF
//! 4. `Seeking`: waits for the decoder to confirm the seek
//! 5. `Playback`: presents frames and advances the clock
//!
//! Audio is drained before branches 3 to 5 unless a seek is in flight.
//! Nothing in a tick blocks: every stall is a suspended clock plus a flag
//! that is re-checked on the next tick.

use crate::application::port::{DecoderEngine, FrameSink};
use crate::domain::video::{DecoderState, MediaLength};
use crate::error::Error;

use super::clock::{PlaybackClock, SuspendReason};
use super::decoder::DecoderHandle;
use super::frame_transfer::{FrameTransferPipeline, TransferOutcome};

/// Orthogonal playback flags.
///
/// Together with the decoder session state these form the effective state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackFlags {
    pub paused: bool,
    pub looping: bool,
    pub async_loading: bool,
    pub buffering: bool,
    pub seeking: bool,
    /// Tick is active; when false the tick does nothing.
    pub processing: bool,
}

impl PlaybackFlags {
    /// Clears every flag except the loop preference.
    pub fn clear_transport(&mut self) {
        *self = Self {
            looping: self.looping,
            ..Self::default()
        };
    }
}

/// Branch selected for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickBranch {
    AsyncLoading,
    Idle,
    Buffering,
    Seeking,
    Playback,
}

impl TickBranch {
    /// Resolves the branch for the current flags.
    #[must_use]
    pub fn select(flags: &PlaybackFlags) -> Self {
        if flags.async_loading {
            Self::AsyncLoading
        } else if !flags.processing || flags.paused {
            Self::Idle
        } else if flags.buffering {
            Self::Buffering
        } else if flags.seeking {
            Self::Seeking
        } else {
            Self::Playback
        }
    }

    /// Whether audio is drained before this branch runs.
    #[must_use]
    pub fn drains_audio(self, flags: &PlaybackFlags) -> bool {
        matches!(self, Self::Buffering | Self::Seeking | Self::Playback) && !flags.seeking
    }
}

/// What a tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nothing to do.
    Idle,
    /// The asynchronous open has not finished yet.
    AsyncPending,
    /// The asynchronous open finished.
    AsyncLoaded { success: bool },
    /// Still waiting for frames.
    BufferingHeld,
    /// Frames arrived (or EOF was reached) and the clock resumed.
    BufferingEnded { stalled_secs: f64, eof: bool },
    /// Still waiting for the decoder to finish seeking.
    SeekPending,
    /// The seek completed and the clock resumed.
    SeekCompleted { stalled_secs: f64 },
    /// A playback step ran.
    Played(PlaybackStep),
}

/// Details of a normal playback tick.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStep {
    /// Media position computed this tick.
    pub position_secs: f64,
    /// A frame reached the sink.
    pub presented: bool,
    /// The frame transfer failed; the frame was still released.
    pub transfer_error: Option<Error>,
    /// The decoder was told the new media time.
    pub video_time_pushed: bool,
    /// The frame queue ran dry and the clock was suspended.
    pub buffering_started: bool,
}

/// Flags plus clock, advanced once per rendered frame.
#[derive(Debug, Clone, Default)]
pub struct PlaybackStateMachine {
    flags: PlaybackFlags,
    clock: PlaybackClock,
}

impl PlaybackStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn flags(&self) -> &PlaybackFlags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut PlaybackFlags {
        &mut self.flags
    }

    #[must_use]
    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut PlaybackClock {
        &mut self.clock
    }

    /// Branch the next tick will take.
    #[must_use]
    pub fn branch(&self) -> TickBranch {
        TickBranch::select(&self.flags)
    }

    /// Runs one tick at wall-clock time `now`.
    pub fn tick<E, S>(
        &mut self,
        now: f64,
        decoder: &mut DecoderHandle<E>,
        pipeline: &mut FrameTransferPipeline,
        sink: &mut S,
    ) -> TickOutcome
    where
        E: DecoderEngine,
        S: FrameSink + ?Sized,
    {
        let branch = self.branch();
        if branch.drains_audio(&self.flags) {
            pipeline.drain_audio(decoder);
        }

        match branch {
            TickBranch::AsyncLoading => self.poll_async_load(decoder, pipeline),
            TickBranch::Idle => TickOutcome::Idle,
            TickBranch::Buffering => self.poll_buffering(now, decoder),
            TickBranch::Seeking => self.poll_seek(now, decoder),
            TickBranch::Playback => TickOutcome::Played(self.play_step(now, decoder, pipeline, sink)),
        }
    }

    fn poll_async_load<E: DecoderEngine>(
        &mut self,
        decoder: &mut DecoderHandle<E>,
        pipeline: &mut FrameTransferPipeline,
    ) -> TickOutcome {
        match decoder.state() {
            DecoderState::Initialized => {
                if let Some(format) = decoder.capture_format() {
                    pipeline.configure(&format);
                }
                self.flags.async_loading = false;
                TickOutcome::AsyncLoaded { success: true }
            }
            DecoderState::InitFailed | DecoderState::Destroyed => {
                self.flags.processing = false;
                self.flags.async_loading = false;
                TickOutcome::AsyncLoaded { success: false }
            }
            DecoderState::Uninitialized | DecoderState::Decoding => TickOutcome::AsyncPending,
        }
    }

    fn poll_buffering<E: DecoderEngine>(
        &mut self,
        now: f64,
        decoder: &DecoderHandle<E>,
    ) -> TickOutcome {
        let eof = decoder.is_eof();
        if !(decoder.is_video_buffer_full() || eof) {
            return TickOutcome::BufferingHeld;
        }

        let stalled_secs = self
            .clock
            .resume(SuspendReason::Buffering, now)
            .unwrap_or(0.0);
        self.flags.buffering = false;
        log::debug!(
            "buffering ended at {:.3}s after {:.3}s (eof: {})",
            self.clock.current_time(),
            stalled_secs,
            eof
        );
        TickOutcome::BufferingEnded { stalled_secs, eof }
    }

    fn poll_seek<E: DecoderEngine>(&mut self, now: f64, decoder: &DecoderHandle<E>) -> TickOutcome {
        if !decoder.is_seek_over() {
            return TickOutcome::SeekPending;
        }

        let stalled_secs = self.clock.resume(SuspendReason::Seeking, now).unwrap_or(0.0);
        self.flags.seeking = false;
        log::debug!("seek settled at {:.3}s", self.clock.current_time());
        TickOutcome::SeekCompleted { stalled_secs }
    }

    fn play_step<E, S>(
        &mut self,
        now: f64,
        decoder: &mut DecoderHandle<E>,
        pipeline: &mut FrameTransferPipeline,
        sink: &mut S,
    ) -> PlaybackStep
    where
        E: DecoderEngine,
        S: FrameSink + ?Sized,
    {
        let (presented, transfer_error) = match pipeline.transfer(decoder, sink) {
            Ok(outcome) => (outcome == TransferOutcome::Presented, None),
            Err(err) => (false, Some(err)),
        };

        let position_secs = self.clock.sample(now);
        let length = decoder
            .format()
            .map_or(MediaLength::Unknown, |format| format.length);
        let buffer_empty = decoder.is_video_buffer_empty();

        // Past the nominal end, keep feeding time while frames remain queued
        let video_time_pushed = length.contains(position_secs) || !buffer_empty;
        if video_time_pushed {
            decoder.set_video_time(position_secs);
        }

        let buffering_started = buffer_empty && !decoder.is_eof();
        if buffering_started {
            self.clock.suspend(SuspendReason::Buffering, now);
            self.flags.buffering = true;
            log::debug!("buffering at {:.3}s", position_secs);
        }

        PlaybackStep {
            position_secs,
            presented,
            transfer_error,
            video_time_pushed,
            buffering_started,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::port::SinkFrame;
    use crate::domain::video::VideoFormat;
    use crate::infrastructure::scripted::{ScriptControl, ScriptedEngine};
    use std::path::Path;

    const EPS: f64 = 1e-9;

    #[derive(Default)]
    struct CountingSink(usize);

    impl FrameSink for CountingSink {
        fn present(&mut self, _frame: SinkFrame) -> crate::error::Result<()> {
            self.0 += 1;
            Ok(())
        }
    }

    struct Rig {
        machine: PlaybackStateMachine,
        decoder: DecoderHandle<ScriptedEngine>,
        pipeline: FrameTransferPipeline,
        sink: CountingSink,
        control: ScriptControl,
    }

    impl Rig {
        /// A decoding session with a running clock started at wall time 0.
        fn playing(length: MediaLength) -> Self {
            let (engine, control) = ScriptedEngine::new();
            let format = VideoFormat::new(2, 1, length);
            control.set_next_format(format);
            let mut decoder = DecoderHandle::new(engine);
            decoder.create(Path::new("clip.mp4")).unwrap();
            decoder.start_decoding();

            let mut pipeline = FrameTransferPipeline::new();
            pipeline.configure(&format);

            let mut machine = PlaybackStateMachine::new();
            machine.clock_mut().start(0.0);
            machine.flags_mut().processing = true;

            Self {
                machine,
                decoder,
                pipeline,
                sink: CountingSink::default(),
                control,
            }
        }

        fn tick(&mut self, now: f64) -> TickOutcome {
            self.machine
                .tick(now, &mut self.decoder, &mut self.pipeline, &mut self.sink)
        }
    }

    #[test]
    fn branch_priority_order() {
        let mut flags = PlaybackFlags {
            async_loading: true,
            paused: true,
            buffering: true,
            seeking: true,
            ..PlaybackFlags::default()
        };
        assert_eq!(TickBranch::select(&flags), TickBranch::AsyncLoading);
        flags.async_loading = false;
        assert_eq!(TickBranch::select(&flags), TickBranch::Idle);
        flags.processing = true;
        assert_eq!(TickBranch::select(&flags), TickBranch::Idle);
        flags.paused = false;
        assert_eq!(TickBranch::select(&flags), TickBranch::Buffering);
        flags.buffering = false;
        assert_eq!(TickBranch::select(&flags), TickBranch::Seeking);
        flags.seeking = false;
        assert_eq!(TickBranch::select(&flags), TickBranch::Playback);
    }

    #[test]
    fn audio_is_not_drained_while_seeking() {
        let flags = PlaybackFlags {
            processing: true,
            seeking: true,
            ..PlaybackFlags::default()
        };
        assert!(!TickBranch::Seeking.drains_audio(&flags));
        assert!(!TickBranch::Idle.drains_audio(&PlaybackFlags::default()));
        assert!(TickBranch::Playback.drains_audio(&PlaybackFlags::default()));
    }

    #[test]
    fn clear_transport_keeps_loop() {
        let mut flags = PlaybackFlags {
            looping: true,
            paused: true,
            processing: true,
            buffering: true,
            ..PlaybackFlags::default()
        };
        flags.clear_transport();
        assert_eq!(
            flags,
            PlaybackFlags {
                looping: true,
                ..PlaybackFlags::default()
            }
        );
    }

    #[test]
    fn playback_presents_frame_and_pushes_time() {
        let mut rig = Rig::playing(MediaLength::Known(10.0));
        rig.control.push_frame(vec![1; 6]);

        let TickOutcome::Played(step) = rig.tick(0.25) else {
            panic!("expected playback tick");
        };
        assert!(step.presented);
        assert!(step.video_time_pushed);
        assert!(!step.buffering_started);
        assert!((step.position_secs - 0.25).abs() < EPS);
        assert_eq!(rig.sink.0, 1);
        assert_eq!(rig.control.video_times(), vec![0.25]);
    }

    #[test]
    fn empty_buffer_enters_buffering() {
        let mut rig = Rig::playing(MediaLength::Known(10.0));
        rig.control.set_buffer_empty(true);

        let TickOutcome::Played(step) = rig.tick(0.5) else {
            panic!("expected playback tick");
        };
        assert!(step.buffering_started);
        assert!(rig.machine.flags().buffering);
        assert!(rig.machine.clock().is_suspended_by(SuspendReason::Buffering));

        assert_eq!(rig.tick(0.9), TickOutcome::BufferingHeld);
        assert!((rig.machine.clock().current_time() - 0.5).abs() < EPS);
    }

    #[test]
    fn empty_buffer_at_eof_keeps_playing() {
        let mut rig = Rig::playing(MediaLength::Known(10.0));
        rig.control.set_buffer_empty(true);
        rig.control.set_eof(true);

        let TickOutcome::Played(step) = rig.tick(0.5) else {
            panic!("expected playback tick");
        };
        assert!(!step.buffering_started);
        assert!(!rig.machine.flags().buffering);
    }

    #[test]
    fn buffering_resumes_with_continuity() {
        let mut rig = Rig::playing(MediaLength::Known(10.0));
        rig.control.set_buffer_empty(true);
        rig.tick(0.5);

        rig.control.set_buffer_empty(false);
        rig.control.set_buffer_full(true);
        let outcome = rig.tick(1.2);
        let TickOutcome::BufferingEnded { stalled_secs, eof } = outcome else {
            panic!("expected buffering to end, got {outcome:?}");
        };
        assert!((stalled_secs - 0.7).abs() < EPS);
        assert!(!eof);

        let TickOutcome::Played(step) = rig.tick(1.3) else {
            panic!("expected playback tick");
        };
        assert!((step.position_secs - 0.6).abs() < EPS);
    }

    #[test]
    fn time_stops_being_pushed_past_end_once_drained() {
        let mut rig = Rig::playing(MediaLength::Known(1.0));
        rig.control.set_buffer_empty(true);
        rig.control.set_eof(true);

        let TickOutcome::Played(step) = rig.tick(2.0) else {
            panic!("expected playback tick");
        };
        assert!(!step.video_time_pushed);
        assert!(rig.control.video_times().is_empty());
    }

    #[test]
    fn unknown_length_always_pushes_time() {
        let mut rig = Rig::playing(MediaLength::Unknown);
        rig.control.set_buffer_empty(true);
        rig.control.set_eof(true);

        let TickOutcome::Played(step) = rig.tick(500.0) else {
            panic!("expected playback tick");
        };
        assert!(step.video_time_pushed);
    }

    #[test]
    fn seek_waits_for_decoder() {
        let mut rig = Rig::playing(MediaLength::Known(10.0));
        rig.machine.clock_mut().suspend(SuspendReason::Seeking, 1.0);
        rig.machine.clock_mut().seek(4.0, 1.0);
        rig.machine.flags_mut().seeking = true;
        rig.control.set_seek_over(false);
        rig.control.push_audio(vec![0; 8], 0.0);

        assert_eq!(rig.tick(1.5), TickOutcome::SeekPending);
        assert_eq!(rig.control.freed_audio(), 0);

        rig.control.set_seek_over(true);
        assert!(matches!(rig.tick(2.0), TickOutcome::SeekCompleted { .. }));
        assert!(!rig.machine.flags().seeking);

        let TickOutcome::Played(step) = rig.tick(2.5) else {
            panic!("expected playback tick");
        };
        assert!((step.position_secs - 4.5).abs() < EPS);
    }

    #[test]
    fn paused_tick_is_idle() {
        let mut rig = Rig::playing(MediaLength::Known(10.0));
        rig.machine.flags_mut().paused = true;
        rig.control.push_frame(vec![0; 6]);

        assert_eq!(rig.tick(1.0), TickOutcome::Idle);
        assert_eq!(rig.control.queued_frames(), 1);
    }

    #[test]
    fn transfer_failure_is_reported_not_fatal() {
        let mut rig = Rig::playing(MediaLength::Known(10.0));
        rig.control.push_frame(vec![0; 2]);

        let TickOutcome::Played(step) = rig.tick(0.1) else {
            panic!("expected playback tick");
        };
        assert!(matches!(step.transfer_error, Some(Error::Frame(_))));
        assert!(!step.presented);
        assert_eq!(rig.control.released_frames(), 1);
    }
}
