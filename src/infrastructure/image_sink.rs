// SPDX-License-Identifier: MPL-2.0
//! In-memory presentation sink backed by the `image` crate.

use std::path::Path;

use image_rs::{ImageFormat, RgbImage};

use crate::application::port::{FrameSink, SinkFrame};
use crate::error::{Error, Result};

/// Sink that keeps the most recently presented frame as an [`RgbImage`].
///
/// Stands in for a texture upload in headless runs: every frame is turned
/// into an image of the declared geometry, so malformed buffers are caught
/// the same way a real surface would reject them.
#[derive(Debug, Default)]
pub struct ImageSink {
    latest: Option<RgbImage>,
    frames_presented: u64,
    capacity: Option<usize>,
}

impl ImageSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits accepted frames to `bytes` per frame.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            capacity: Some(bytes),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn latest(&self) -> Option<&RgbImage> {
        self.latest.as_ref()
    }

    #[must_use]
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Saves the latest frame as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if no frame was presented yet or the file cannot be
    /// encoded or written.
    pub fn save_latest_png(&self, path: &Path) -> Result<()> {
        let image = self
            .latest
            .as_ref()
            .ok_or_else(|| Error::Frame("no frame has been presented".to_string()))?;
        image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| Error::Io(format!("Failed to save frame: {e}")))
    }
}

impl FrameSink for ImageSink {
    fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn present(&mut self, frame: SinkFrame) -> Result<()> {
        let expected = frame.expected_len();
        if frame.data.len() != expected {
            return Err(Error::Frame(format!(
                "{}x{} frame has {} bytes, expected {}",
                frame.width,
                frame.height,
                frame.data.len(),
                expected
            )));
        }

        let image = RgbImage::from_raw(frame.width, frame.height, frame.data)
            .ok_or_else(|| Error::Frame("failed to create image buffer from frame data".to_string()))?;
        self.latest = Some(image);
        self.frames_presented += 1;
        Ok(())
    }
}
