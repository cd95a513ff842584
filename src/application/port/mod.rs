// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! This module defines abstract interfaces that infrastructure adapters implement.
//! These traits use only domain types, ensuring the playback engine remains
//! independent of concrete implementations.
//!
//! # Available Ports
//!
//! - [`decoder`]: Polled, non-blocking decoder engine
//! - [`sink`]: Presentation surface receiving finished RGB frames
//! - [`time`]: Wall-clock source
//!
//! # Design Notes
//!
//! - All traits use domain types only (no `FFmpeg` types)
//! - Every query the playback tick issues must be non-blocking
//! - No `async fn`; completion is observed by polling on each tick

pub mod decoder;
pub mod sink;
pub mod time;

// Re-export main types for convenience
pub use decoder::{AudioChunk, DecoderEngine};
pub use sink::{FrameSink, SinkFrame};
pub use time::TimeSource;
