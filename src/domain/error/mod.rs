// SPDX-License-Identifier: MPL-2.0
//! Domain error types shared by decoder adapters and the playback engine.

mod video;

pub use video::VideoError;
