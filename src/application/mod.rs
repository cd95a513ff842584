// SPDX-License-Identifier: MPL-2.0
//! Application layer - the seams between the playback engine and its
//! collaborators.
//!
//! - [`port`]: Trait definitions (interfaces) for dependency inversion
//!
//! # Dependency Rule
//!
//! - Application layer depends on domain layer (uses domain types)
//! - Infrastructure layer implements application layer ports
//! - The `video_player` engine consumes the ports only
//!
//! # Example
//!
//! ```ignore
//! use tickplay::application::port::{DecoderEngine, FrameSink, TimeSource};
//!
//! // Infrastructure implements the port traits
//! struct MyEngine { /* ... */ }
//! impl DecoderEngine for MyEngine { /* ... */ }
//! ```

pub mod port;
