// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! This module contains concrete implementations of the port traits defined in
//! `application::port`. These adapters wrap external dependencies like `FFmpeg`,
//! the `image` crate and the system clock.
//!
//! # Available Adapters
//!
//! - [`ffmpeg`]: Video decoding via `FFmpeg` (implements [`DecoderEngine`])
//! - [`scripted`]: Deterministic in-memory engine for tests and benchmarks
//! - [`image_sink`]: Frame sink that keeps the latest frame as an image
//! - [`time`]: Wall-clock and manually driven time sources
//!
//! [`DecoderEngine`]: crate::application::port::DecoderEngine

pub mod ffmpeg;
pub mod image_sink;
pub mod scripted;
pub mod time;

// Re-export main types for convenience
pub use ffmpeg::FfmpegEngine;
pub use image_sink::ImageSink;
pub use scripted::{ScriptControl, ScriptedEngine};
pub use time::{ManualTimeSource, SystemTimeSource};
