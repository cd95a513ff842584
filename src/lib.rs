// SPDX-License-Identifier: MPL-2.0
//! `tickplay` is a tick-driven video playback controller.
//!
//! It paces decoded RGB frames against the wall clock, hiding decoder
//! buffering and seek latency behind a polled state machine, and hands each
//! due frame to a presentation sink.

#![doc(html_root_url = "https://docs.rs/tickplay/0.3.0")]

pub mod application;
pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod video_player;
