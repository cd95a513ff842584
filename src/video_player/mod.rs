// SPDX-License-Identifier: MPL-2.0
//! Real-time video playback engine.
//!
//! A [`PlaybackController`] is ticked once per rendered frame. Each tick
//! polls the decoder (never blocking on it), decides whether media time may
//! advance, and moves at most one decoded frame to the presentation sink.
//!
//! - [`clock`]: wall-clock to media-time mapping with suspend/resume
//! - [`decoder`]: owned decoder session with guaranteed release
//! - [`frame_transfer`]: copy-then-release frame handoff and audio drain
//! - [`state`]: priority-ordered tick dispatcher
//! - [`controller`]: the public command and query surface

pub mod clock;
pub mod controller;
pub mod decoder;
pub mod frame_transfer;
pub mod state;

pub use clock::{PlaybackClock, SuspendReason};
pub use controller::{PlaybackController, PlaybackEvent};
pub use decoder::{DecoderHandle, LoadRejection};
pub use frame_transfer::{FrameLayout, FrameTransferPipeline, TransferOutcome};
pub use state::{PlaybackFlags, PlaybackStateMachine, PlaybackStep, TickBranch, TickOutcome};
