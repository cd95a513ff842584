// SPDX-License-Identifier: MPL-2.0
//! Diagnostics domain types.
//!
//! - [`BufferCapacity`]: Number of playback events retained for export

mod newtypes;

pub use newtypes::{buffer_capacity_bounds, BufferCapacity};
