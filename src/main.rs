// SPDX-License-Identifier: MPL-2.0
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use tickplay::config;
use tickplay::domain::video::{DecoderState, TickRate};
use tickplay::error::{Error, Result, VideoError};
use tickplay::infrastructure::{FfmpegEngine, ImageSink, SystemTimeSource};
use tickplay::video_player::{PlaybackController, PlaybackEvent, TickOutcome};

const USAGE: &str = "\
Usage: tickplay [OPTIONS] FILE

Options:
  --fps HZ             Tick rate (defaults to the configured rate)
  --async              Open the file without blocking
  --loop               Set the loop flag
  --seek SECS          Seek once playback has started
  --duration SECS      Stop after this much wall time (default: media length)
  --dump PATH          Save the last presented frame as PNG
  --diagnostics PATH   Write a JSON diagnostics report
  -h, --help           Print this help";

/// Hard stop for media of unknown length when no duration is given.
const FALLBACK_DURATION_SECS: f64 = 30.0;

type Player = PlaybackController<FfmpegEngine, ImageSink, SystemTimeSource>;

struct Args {
    fps: Option<u32>,
    asynchronous: bool,
    looping: bool,
    seek: Option<f64>,
    duration: Option<f64>,
    dump: Option<PathBuf>,
    diagnostics: Option<PathBuf>,
    file: PathBuf,
}

fn parse_args() -> std::result::Result<Option<Args>, pico_args::Error> {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        return Ok(None);
    }

    let parsed = Args {
        fps: args.opt_value_from_str("--fps")?,
        asynchronous: args.contains("--async"),
        looping: args.contains("--loop"),
        seek: args.opt_value_from_str("--seek")?,
        duration: args.opt_value_from_str("--duration")?,
        dump: args.opt_value_from_str("--dump")?,
        diagnostics: args.opt_value_from_str("--diagnostics")?,
        file: args.free_from_str()?,
    };

    let rest = args.finish();
    if !rest.is_empty() {
        log::warn!("ignoring extra arguments: {:?}", rest);
    }
    Ok(Some(parsed))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("error: {e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let config = config::load().unwrap_or_else(|e| {
        log::warn!("using default settings: {}", e);
        config::Config::default()
    });

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: &config::Config) -> Result<()> {
    let rate = args.fps.map_or_else(|| config.tick_rate(), TickRate::new);
    let engine = FfmpegEngine::new(config.frame_queue_depth(), config.audio_queue_depth());
    let mut player: Player = PlaybackController::with_diagnostics_capacity(
        engine,
        ImageSink::new(),
        SystemTimeSource,
        config.diagnostics_capacity(),
    );
    let mut events = player.subscribe();
    let interval = Duration::from_secs_f64(rate.interval_secs());

    if args.asynchronous {
        player.load_async(&args.file);
        loop {
            player.tick(rate.interval_secs());
            match events.try_recv() {
                Ok(PlaybackEvent::AsyncLoaded { success: true }) => break,
                Ok(PlaybackEvent::AsyncLoaded { success: false }) => {
                    return Err(load_error(&player, &args.file));
                }
                Err(_) => std::thread::sleep(interval),
            }
        }
    } else if !player.load(&args.file) {
        return Err(load_error(&player, &args.file));
    }

    if let Some(format) = player.format() {
        println!(
            "{}: {}x{}, length {:.3}s",
            args.file.display(),
            format.width,
            format.height,
            player.get_length()
        );
    }

    player.set_loop(args.looping);
    player.play();
    if let Some(target) = args.seek {
        player.seek(target);
    }

    let budget = args.duration.unwrap_or_else(|| {
        let length = player.get_length();
        if length > 0.0 {
            // Leave room for the tail of the stream to drain
            length - args.seek.unwrap_or(0.0) + 1.0
        } else {
            FALLBACK_DURATION_SECS
        }
    });

    let started = Instant::now();
    let mut last_report = 0u64;
    let mut previous = started;
    while started.elapsed().as_secs_f64() < budget {
        let frame_start = Instant::now();
        let delta = frame_start.duration_since(previous).as_secs_f64();
        previous = frame_start;

        if let TickOutcome::Played(step) = player.tick(delta) {
            let decoder = player.decoder();
            if !step.presented && decoder.is_eof() && decoder.is_video_buffer_empty() {
                log::info!("end of stream reached at {:.3}s", step.position_secs);
                break;
            }
        }

        let whole_secs = started.elapsed().as_secs();
        if whole_secs > last_report {
            last_report = whole_secs;
            println!(
                "t={:>7.3}s  frames={}  buffering={}",
                player.get_playback_position(),
                player.pipeline_stats().frames_presented,
                player.flags().buffering
            );
        }

        if let Some(rest) = interval.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    let presented = player.pipeline_stats().frames_presented;
    if player.decoder_state() == DecoderState::Decoding {
        player.stop();
    }
    println!("presented {presented} frames");

    if let Some(path) = &args.dump {
        player.sink().save_latest_png(path)?;
        println!("saved last frame to {}", path.display());
    }
    if let Some(path) = &args.diagnostics {
        player.export_diagnostics(path)?;
        println!("wrote diagnostics to {}", path.display());
    }
    Ok(())
}

/// The decoder's classified failure, or a rejection when no session opened.
fn load_error(player: &Player, file: &Path) -> Error {
    let failure = player.decoder().failure().unwrap_or_else(|| {
        VideoError::Other(format!("{} was not opened", file.display()))
    });
    Error::Video(failure)
}
