// SPDX-License-Identifier: MPL-2.0
//! Presentation sink port definition.
//!
//! A [`FrameSink`] is the surface that displays finished frames. It receives
//! an owned pixel buffer of known geometry; the playback engine never hands
//! it memory that belongs to the decoder.

use crate::domain::video::PixelFormat;
use crate::error::Result;

/// A completed frame handed to a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel layout of `data`.
    pub format: PixelFormat,
    /// Tightly packed pixel rows, `width * height * bytes_per_pixel` bytes.
    pub data: Vec<u8>,
}

impl SinkFrame {
    /// Expected byte length for this frame's geometry.
    #[must_use]
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Port for a presentation surface.
pub trait FrameSink {
    /// Largest frame in bytes the sink accepts, if bounded.
    fn capacity(&self) -> Option<usize> {
        None
    }

    /// Displays a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer does not match the declared geometry
    /// or the surface cannot be updated.
    fn present(&mut self, frame: SinkFrame) -> Result<()>;
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn capacity(&self) -> Option<usize> {
        (**self).capacity()
    }

    fn present(&mut self, frame: SinkFrame) -> Result<()> {
        (**self).present(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_len_uses_pixel_format() {
        let frame = SinkFrame {
            width: 4,
            height: 2,
            format: PixelFormat::Rgb8,
            data: Vec::new(),
        };
        assert_eq!(frame.expected_len(), 24);
    }
}
