// SPDX-License-Identifier: MPL-2.0
//! Domain layer - Core playback types with ZERO external dependencies.
//!
//! This module contains pure domain types, value objects, and business rules.
//! It has no dependencies on external crates (except `std`) to ensure
//! testability and architectural purity.
//!
//! # Modules
//!
//! - [`diagnostics`]: Diagnostics types ([`BufferCapacity`](diagnostics::BufferCapacity))
//! - [`error`]: Domain error types ([`VideoError`](error::VideoError))
//! - [`video`]: Session and format types ([`DecoderState`](video::DecoderState),
//!   [`VideoFormat`](video::VideoFormat), [`MediaLength`](video::MediaLength))

pub mod diagnostics;
pub mod error;
pub mod video;
