// SPDX-License-Identifier: MPL-2.0
//! Playback diagnostics.
//!
//! Controllers record transport changes, stalls and transfer failures into a
//! memory-bounded ring. The ring can be turned into a [`DiagnosticReport`]
//! with summary statistics and written to disk as JSON.
//!
//! # Architecture
//!
//! - [`CircularBuffer`]: ring buffer with a validated [`BufferCapacity`]
//! - [`DiagnosticEvent`]: one event stamped with wall time and media position
//! - [`DiagnosticsLog`]: the per-controller log
//! - [`DiagnosticReport`]: exportable snapshot

mod buffer;
mod collector;
mod events;
mod export;
mod report;

pub use buffer::{BufferCapacity, CircularBuffer};
pub use collector::DiagnosticsLog;
pub use events::{DiagnosticEvent, DiagnosticEventKind};
pub use export::write_atomic;
pub use report::{DiagnosticReport, PipelineStats, ReportMetadata, ReportSummary};
