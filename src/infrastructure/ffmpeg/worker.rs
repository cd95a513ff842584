// SPDX-License-Identifier: MPL-2.0
//! Decode thread for one `FFmpeg` session.

use std::path::{Path, PathBuf};

use ffmpeg_next::format::Pixel;
use ffmpeg_next::media::Type;
use ffmpeg_next::software::scaling;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};

use super::shared::{self, AudioPacket, DecoderCommand, SharedStatus, VideoFrame};
use crate::domain::error::VideoError;
use crate::domain::video::{DecoderState, MediaLength, PixelFormat, VideoFormat};

/// Thread side of a session's channels.
pub(super) struct WorkerChannels {
    pub commands: mpsc::UnboundedReceiver<DecoderCommand>,
    /// Bounded; a full queue blocks the thread until the engine takes a frame.
    pub frames: mpsc::Sender<VideoFrame>,
    pub audio: mpsc::Sender<AudioPacket>,
    /// Frame buffers handed back by the engine for reuse.
    pub recycled: mpsc::UnboundedReceiver<Vec<u8>>,
    /// Signalled once the open attempt settled.
    pub ready: oneshot::Sender<()>,
}

struct Opened {
    input: ffmpeg_next::format::context::Input,
    video: ffmpeg_next::decoder::Video,
    video_index: usize,
    video_time_base: f64,
    /// Start time of the video stream; media time zero maps to it.
    start_secs: f64,
    audio: Option<(ffmpeg_next::decoder::Audio, usize, f64)>,
    scaler: scaling::Context,
    format: VideoFormat,
}

fn rational_secs(rational: ffmpeg_next::Rational) -> f64 {
    f64::from(rational.numerator()) / f64::from(rational.denominator())
}

/// Stream start time in seconds; zero when the container does not set one.
#[allow(clippy::cast_precision_loss)]
fn stream_offset_secs(start_time: i64, time_base: f64) -> f64 {
    if start_time == ffmpeg_next::ffi::AV_NOPTS_VALUE {
        0.0
    } else {
        start_time as f64 * time_base
    }
}

/// Converts a stream timestamp to media time.
#[allow(clippy::cast_precision_loss)]
fn media_secs(pts: i64, time_base: f64, offset_secs: f64) -> f64 {
    pts as f64 * time_base - offset_secs
}

/// Container timestamp in `AV_TIME_BASE` units for a media-time target.
#[allow(clippy::cast_possible_truncation)]
fn seek_timestamp(target_secs: f64, offset_secs: f64) -> i64 {
    ((target_secs + offset_secs) * f64::from(ffmpeg_next::ffi::AV_TIME_BASE)) as i64
}

fn open(path: &Path) -> Result<Opened, VideoError> {
    super::init_ffmpeg().map_err(|e| VideoError::Other(e.to_string()))?;

    let input = ffmpeg_next::format::input(&path)
        .map_err(|e| VideoError::from_message(&e.to_string()))?;

    let (video, video_index, video_time_base, start_secs, stream_duration) = {
        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or(VideoError::NoVideoStream)?;
        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|e| VideoError::from_message(&format!("video decoder: {e}")))?;
        let time_base = rational_secs(stream.time_base());
        (
            decoder,
            stream.index(),
            time_base,
            stream_offset_secs(stream.start_time(), time_base),
            stream.duration(),
        )
    };

    // Audio is optional; a track that fails to open is ignored
    let audio = input.streams().best(Type::Audio).and_then(|stream| {
        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().audio())
            .ok()?;
        Some((decoder, stream.index(), rational_secs(stream.time_base())))
    });

    #[allow(clippy::cast_precision_loss)]
    let length_secs = if stream_duration > 0 {
        stream_duration as f64 * video_time_base
    } else if input.duration() > 0 {
        input.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE)
    } else {
        -1.0
    };

    let (width, height) = (video.width(), video.height());
    let scaler = scaling::Context::get(
        video.format(),
        width,
        height,
        Pixel::RGB24,
        width,
        height,
        scaling::Flags::BILINEAR,
    )
    .map_err(|e| VideoError::Other(format!("Failed to create scaler: {e}")))?;

    Ok(Opened {
        input,
        video,
        video_index,
        video_time_base,
        start_secs,
        audio,
        scaler,
        format: VideoFormat::new(width, height, MediaLength::from_secs(length_secs)),
    })
}

/// Thread entry point: open, wait for the start command, decode until stopped.
pub(super) fn run(path: PathBuf, status: SharedStatus, channels: WorkerChannels) {
    let WorkerChannels {
        mut commands,
        frames,
        audio,
        recycled,
        ready,
    } = channels;

    let result = open(&path);
    {
        let mut status = shared::lock(&status);
        match &result {
            Ok(opened) => {
                status.format = Some(opened.format);
                if status.state == DecoderState::Uninitialized {
                    status.state = DecoderState::Initialized;
                }
            }
            Err(err) => {
                log::warn!("failed to open {}: {}", path.display(), err);
                if status.state == DecoderState::Uninitialized {
                    status.state = DecoderState::InitFailed;
                }
                status.failure = Some(err.clone());
            }
        }
    }
    // Nobody waits on asynchronous opens
    let _ = ready.send(());

    let Ok(opened) = result else {
        return;
    };

    let mut pending_seek = None;
    loop {
        match commands.blocking_recv() {
            Some(DecoderCommand::Start) => break,
            Some(DecoderCommand::Seek {
                target_secs,
                generation,
            }) => pending_seek = Some((target_secs, generation)),
            Some(DecoderCommand::Stop) | None => return,
        }
    }

    log::debug!(
        "decoding {} ({}x{})",
        path.display(),
        opened.format.width,
        opened.format.height
    );
    let mut worker = Worker {
        opened,
        status,
        commands,
        frames,
        audio,
        recycled,
        generation: 0,
        skip_until: None,
        awaiting_seek: false,
    };
    if let Some((target_secs, generation)) = pending_seek {
        worker.seek(target_secs, generation);
    }
    worker.decode_loop();
}

enum Step {
    Decoded,
    EndOfStream,
    /// The engine dropped its side of the session.
    Disconnected,
}

struct Worker {
    opened: Opened,
    status: SharedStatus,
    commands: mpsc::UnboundedReceiver<DecoderCommand>,
    frames: mpsc::Sender<VideoFrame>,
    audio: mpsc::Sender<AudioPacket>,
    recycled: mpsc::UnboundedReceiver<Vec<u8>>,
    /// Generation of the last seek applied.
    generation: u64,
    /// Frames and audio before this time are discarded after a seek.
    skip_until: Option<f64>,
    /// A seek was applied and none of its frames has been queued yet.
    awaiting_seek: bool,
}

impl Worker {
    fn decode_loop(&mut self) {
        loop {
            match self.commands.try_recv() {
                Ok(DecoderCommand::Seek {
                    target_secs,
                    generation,
                }) => self.seek(target_secs, generation),
                Ok(DecoderCommand::Start) | Err(TryRecvError::Empty) => {}
                Ok(DecoderCommand::Stop) | Err(TryRecvError::Disconnected) => return,
            }

            match self.step() {
                Step::Decoded => {}
                Step::Disconnected => return,
                Step::EndOfStream => {
                    if !self.finish_stream() || !self.wait_after_eof() {
                        return;
                    }
                }
            }
        }
    }

    /// Parks at end of stream until a seek or stop arrives.
    fn wait_after_eof(&mut self) -> bool {
        loop {
            match self.commands.blocking_recv() {
                Some(DecoderCommand::Seek {
                    target_secs,
                    generation,
                }) => {
                    self.seek(target_secs, generation);
                    return true;
                }
                Some(DecoderCommand::Start) => {}
                Some(DecoderCommand::Stop) | None => return false,
            }
        }
    }

    fn seek(&mut self, target_secs: f64, generation: u64) {
        let timestamp = seek_timestamp(target_secs, self.opened.start_secs);
        // RangeTo lets FFmpeg land on the keyframe before the target
        if let Err(e) = self.opened.input.seek(timestamp, ..timestamp) {
            log::warn!("seek to {:.3}s failed: {}", target_secs, e);
        }
        self.opened.video.flush();
        if let Some((audio, _, _)) = &mut self.opened.audio {
            audio.flush();
        }
        self.skip_until = Some(target_secs);
        self.generation = generation;
        self.awaiting_seek = true;
    }

    /// Reads and decodes one packet.
    fn step(&mut self) -> Step {
        let Some((index, packet)) = self
            .opened
            .input
            .packets()
            .next()
            .map(|(stream, packet)| (stream.index(), packet))
        else {
            return Step::EndOfStream;
        };

        let connected = if index == self.opened.video_index {
            if let Err(e) = self.opened.video.send_packet(&packet) {
                log::debug!("video packet rejected: {}", e);
                return Step::Decoded;
            }
            self.receive_video()
        } else if let Some((audio, audio_index, _)) = &mut self.opened.audio {
            if index != *audio_index {
                return Step::Decoded;
            }
            if let Err(e) = audio.send_packet(&packet) {
                log::debug!("audio packet rejected: {}", e);
                return Step::Decoded;
            }
            self.receive_audio()
        } else {
            true
        };

        if connected {
            Step::Decoded
        } else {
            Step::Disconnected
        }
    }

    /// Drains the video decoder and marks end of stream.
    fn finish_stream(&mut self) -> bool {
        if self.opened.video.send_eof().is_ok() && !self.receive_video() {
            return false;
        }

        let mut status = shared::lock(&self.status);
        if status.is_current(self.generation) {
            status.eof = true;
            status.seeking = false;
        }
        self.awaiting_seek = false;
        log::debug!("end of stream");
        true
    }

    fn receive_video(&mut self) -> bool {
        let mut decoded = ffmpeg_next::frame::Video::empty();
        while self.opened.video.receive_frame(&mut decoded).is_ok() {
            let pts_secs = decoded.timestamp().map_or(0.0, |pts| {
                media_secs(pts, self.opened.video_time_base, self.opened.start_secs)
            });
            if self.skipping(pts_secs) {
                continue;
            }

            let mut rgb = ffmpeg_next::frame::Video::empty();
            if let Err(e) = self.opened.scaler.run(&decoded, &mut rgb) {
                log::warn!("scaling failed: {}", e);
                continue;
            }
            if !self.publish_video(pts_secs, &rgb) {
                return false;
            }
        }
        true
    }

    fn receive_audio(&mut self) -> bool {
        let Some((audio, _, time_base)) = &mut self.opened.audio else {
            return true;
        };
        let time_base = *time_base;
        let offset_secs = self.opened.start_secs;

        let mut decoded = ffmpeg_next::frame::Audio::empty();
        let mut packets = Vec::new();
        while audio.receive_frame(&mut decoded).is_ok() {
            let time_secs = decoded
                .timestamp()
                .map_or(-1.0, |pts| media_secs(pts, time_base, offset_secs));
            packets.push(AudioPacket {
                time_secs,
                generation: self.generation,
                data: decoded.data(0).to_vec(),
            });
        }

        // Audio ahead of a pending seek target never reaches the queue
        let skip_until = self.skip_until;
        packets
            .into_iter()
            .filter(|packet| skip_until.is_none_or(|target| packet.time_secs >= target))
            .all(|packet| self.audio.blocking_send(packet).is_ok())
    }

    /// Whether a frame at `pts_secs` predates the pending seek target.
    fn skipping(&mut self, pts_secs: f64) -> bool {
        match self.skip_until {
            Some(target) if pts_secs < target => true,
            Some(_) => {
                self.skip_until = None;
                false
            }
            None => false,
        }
    }

    fn publish_video(&mut self, pts_secs: f64, rgb: &ffmpeg_next::frame::Video) -> bool {
        let width = rgb.width() as usize;
        let height = rgb.height() as usize;
        let row_len = width * PixelFormat::Rgb8.bytes_per_pixel();
        let stride = rgb.stride(0);
        let plane = rgb.data(0);

        let mut data = self.recycled.try_recv().unwrap_or_default();
        data.clear();
        data.reserve(row_len * height);
        for row in plane.chunks(stride).take(height) {
            data.extend_from_slice(&row[..row_len.min(row.len())]);
        }

        let frame = VideoFrame {
            pts_secs,
            generation: self.generation,
            data,
        };
        if self.frames.blocking_send(frame).is_err() {
            return false;
        }

        if self.awaiting_seek {
            self.awaiting_seek = false;
            let mut status = shared::lock(&self.status);
            if status.is_current(self.generation) {
                status.seeking = false;
            }
        }
        true
    }
}
