// SPDX-License-Identifier: MPL-2.0
//! Playback diagnostic events.

use serde::{Deserialize, Serialize};

/// What happened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiagnosticEventKind {
    // ==========================================================================
    // Loading
    // ==========================================================================
    /// A load was requested.
    LoadRequested {
        /// True for the non-blocking variant.
        asynchronous: bool,
    },

    /// A load was refused because a session is live or pending.
    LoadRejected { reason: String },

    /// A load settled.
    LoadFinished {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
        /// Media length in seconds, `-1` when unknown.
        #[serde(skip_serializing_if = "Option::is_none")]
        length_secs: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        /// Failure category, e.g. `no-video-stream`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
    },

    // ==========================================================================
    // Transport
    // ==========================================================================
    PlaybackStarted,
    Paused,
    Resumed,
    Stopped,
    LoopChanged {
        enabled: bool,
    },

    /// A seek was issued; `target_secs` is the clamped position.
    SeekRequested {
        requested_secs: f64,
        target_secs: f64,
    },

    SeekCompleted {
        stalled_secs: f64,
    },

    // ==========================================================================
    // Stalls and failures
    // ==========================================================================
    BufferingStarted,

    BufferingEnded {
        stalled_secs: f64,
        /// The stall ended because the source ran out.
        eof: bool,
    },

    FrameTransferFailed {
        message: String,
    },
}

impl DiagnosticEventKind {
    /// Stable snake_case name, matching the serialized `type` tag.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadRequested { .. } => "load_requested",
            Self::LoadRejected { .. } => "load_rejected",
            Self::LoadFinished { .. } => "load_finished",
            Self::PlaybackStarted => "playback_started",
            Self::Paused => "paused",
            Self::Resumed => "resumed",
            Self::Stopped => "stopped",
            Self::LoopChanged { .. } => "loop_changed",
            Self::SeekRequested { .. } => "seek_requested",
            Self::SeekCompleted { .. } => "seek_completed",
            Self::BufferingStarted => "buffering_started",
            Self::BufferingEnded { .. } => "buffering_ended",
            Self::FrameTransferFailed { .. } => "frame_transfer_failed",
        }
    }
}

/// An event stamped with wall-clock time and media position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticEvent {
    /// Wall-clock seconds as reported by the controller's time source.
    pub wall_time_secs: f64,
    /// Media position when the event was recorded.
    pub position_secs: f64,
    #[serde(flatten)]
    pub kind: DiagnosticEventKind,
}

impl DiagnosticEvent {
    #[must_use]
    pub fn new(wall_time_secs: f64, position_secs: f64, kind: DiagnosticEventKind) -> Self {
        Self {
            wall_time_secs,
            position_secs,
            kind,
        }
    }
}
