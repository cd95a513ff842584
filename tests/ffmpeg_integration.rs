// SPDX-License-Identifier: MPL-2.0
//! Integration tests for the `FFmpeg` engine
//!
//! These tests play a real file through the controller. They are skipped when
//! `tests/data/sample.mp4` is not present.

use std::path::Path;
use std::time::{Duration, Instant};

use tickplay::application::port::DecoderEngine;
use tickplay::domain::video::{AudioQueueDepth, DecoderState, FrameQueueDepth};
use tickplay::infrastructure::{FfmpegEngine, ImageSink, SystemTimeSource};
use tickplay::video_player::{PlaybackController, PlaybackEvent, TickOutcome};

const SAMPLE: &str = "tests/data/sample.mp4";

fn sample() -> Option<&'static Path> {
    let path = Path::new(SAMPLE);
    path.exists().then_some(path)
}

fn player() -> PlaybackController<FfmpegEngine, ImageSink, SystemTimeSource> {
    PlaybackController::new(FfmpegEngine::default(), ImageSink::new(), SystemTimeSource)
}

/// Ticks at roughly 100 Hz until `done` holds or `timeout` elapses.
fn tick_until<F>(
    player: &mut PlaybackController<FfmpegEngine, ImageSink, SystemTimeSource>,
    timeout: Duration,
    mut done: F,
) -> bool
where
    F: FnMut(&TickOutcome, &PlaybackController<FfmpegEngine, ImageSink, SystemTimeSource>) -> bool,
{
    let started = Instant::now();
    while started.elapsed() < timeout {
        let outcome = player.tick(0.01);
        if done(&outcome, player) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn test_engine_reports_format() {
    let Some(path) = sample() else {
        return; // Skip if test file doesn't exist
    };

    let mut engine = FfmpegEngine::new(FrameQueueDepth::new(4), AudioQueueDepth::new(16));
    let id = engine.create(path);
    assert_eq!(engine.state(id), DecoderState::Initialized);

    let format = engine.format(id).expect("format after open");
    assert!(format.width > 0);
    assert!(format.height > 0);
    assert!(format.data_size() > 0);
    engine.destroy(id);
    assert_eq!(engine.state(id), DecoderState::Destroyed);
}

#[test]
fn test_playback_presents_frames() {
    let Some(path) = sample() else {
        return;
    };

    let mut player = player();
    assert!(player.load(path));
    let format = player.format().expect("format after load");
    player.play();

    let presented = tick_until(&mut player, Duration::from_secs(5), |_, p| {
        p.pipeline_stats().frames_presented >= 3
    });
    assert!(presented, "should present frames within five seconds");

    let latest = player.sink().latest().expect("latest frame");
    assert_eq!(latest.dimensions(), (format.width, format.height));
    assert!(player.get_playback_position() > 0.0);

    player.stop();
    assert_eq!(player.decoder_state(), DecoderState::Uninitialized);
}

#[test]
fn test_async_load_notifies() {
    let Some(path) = sample() else {
        return;
    };

    let mut player = player();
    let mut events = player.subscribe();
    player.load_async(path);

    let loaded = tick_until(&mut player, Duration::from_secs(5), |outcome, _| {
        matches!(outcome, TickOutcome::AsyncLoaded { .. })
    });
    assert!(loaded);
    assert_eq!(
        events.try_recv().ok(),
        Some(PlaybackEvent::AsyncLoaded { success: true })
    );
    assert!(player.data_size().is_some());
}

#[test]
fn test_seek_completes() {
    let Some(path) = sample() else {
        return;
    };

    let mut player = player();
    assert!(player.load(path));
    player.play();

    let target = (player.get_length() / 2.0).max(0.0);
    player.seek(target);
    let settled = tick_until(&mut player, Duration::from_secs(5), |outcome, _| {
        matches!(outcome, TickOutcome::SeekCompleted { .. })
    });
    assert!(settled, "seek should settle within five seconds");
    assert!(player.get_playback_position() >= target);
}

#[test]
fn test_missing_file_fails_to_load() {
    let temp_dir = tempfile::tempdir().expect("should create temp dir");
    let mut player = player();

    assert!(!player.load(temp_dir.path().join("absent.mp4")));
    assert_eq!(player.decoder_state(), DecoderState::InitFailed);
    assert_eq!(player.diagnostics().count("load_finished"), 1);
}
