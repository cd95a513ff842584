// SPDX-License-Identifier: MPL-2.0
//! Video stream format as reported by a decoder session.

/// Length reported for sources whose duration is unknown (live streams,
/// containers without a duration header).
pub const UNKNOWN_LENGTH_SECS: f64 = -1.0;

/// Media length in seconds, or unknown.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MediaLength {
    /// Duration known from the container.
    Known(f64),
    /// Duration unknown; playback may continue indefinitely.
    #[default]
    Unknown,
}

impl MediaLength {
    /// Builds a length from raw seconds, mapping non-positive or non-finite
    /// values to [`MediaLength::Unknown`].
    #[must_use]
    pub fn from_secs(secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            Self::Known(secs)
        } else {
            Self::Unknown
        }
    }

    /// Returns the length in seconds, or [`UNKNOWN_LENGTH_SECS`].
    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        match self {
            Self::Known(secs) => secs,
            Self::Unknown => UNKNOWN_LENGTH_SECS,
        }
    }

    /// Returns the known length, if any.
    #[must_use]
    pub fn known(self) -> Option<f64> {
        match self {
            Self::Known(secs) => Some(secs),
            Self::Unknown => None,
        }
    }

    /// Returns true if `position_secs` is before the end of the media.
    /// Always true for unknown lengths.
    #[must_use]
    pub fn contains(self, position_secs: f64) -> bool {
        match self {
            Self::Known(secs) => position_secs < secs,
            Self::Unknown => true,
        }
    }

    /// Clamps a seek target into `[0, length]`. Unknown lengths only clamp
    /// the lower bound.
    #[must_use]
    pub fn clamp(self, position_secs: f64) -> f64 {
        let lower = position_secs.max(0.0);
        match self {
            Self::Known(secs) => lower.min(secs),
            Self::Unknown => lower,
        }
    }
}

/// Pixel layout accepted by presentation sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit RGB, three bytes per pixel, no alpha.
    #[default]
    Rgb8,
}

impl PixelFormat {
    /// Bytes used by one pixel.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb8 => 3,
        }
    }
}

/// Frame geometry and duration of an opened media source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoFormat {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Media duration.
    pub length: MediaLength,
}

impl VideoFormat {
    /// Creates a new format description.
    #[must_use]
    pub fn new(width: u32, height: u32, length: MediaLength) -> Self {
        Self {
            width,
            height,
            length,
        }
    }

    /// Size in bytes of one RGB8 frame (`width * height * 3`).
    #[must_use]
    pub fn data_size(&self) -> usize {
        self.width as usize * self.height as usize * PixelFormat::Rgb8.bytes_per_pixel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_size_is_rgb8() {
        let format = VideoFormat::new(640, 360, MediaLength::Known(10.0));
        assert_eq!(format.data_size(), 691_200);
    }

    #[test]
    fn from_secs_maps_sentinels_to_unknown() {
        assert_eq!(MediaLength::from_secs(-1.0), MediaLength::Unknown);
        assert_eq!(MediaLength::from_secs(0.0), MediaLength::Unknown);
        assert_eq!(MediaLength::from_secs(f64::NAN), MediaLength::Unknown);
        assert_eq!(MediaLength::from_secs(4.5), MediaLength::Known(4.5));
    }

    #[test]
    fn unknown_length_reports_sentinel() {
        assert_eq!(MediaLength::Unknown.as_secs_f64(), UNKNOWN_LENGTH_SECS);
        assert_eq!(MediaLength::Known(3.0).as_secs_f64(), 3.0);
    }

    #[test]
    fn clamp_bounds_known_length() {
        let length = MediaLength::Known(10.0);
        assert_eq!(length.clamp(100.0), 10.0);
        assert_eq!(length.clamp(-3.0), 0.0);
        assert_eq!(length.clamp(4.25), 4.25);
    }

    #[test]
    fn clamp_unknown_length_only_bounds_below() {
        assert_eq!(MediaLength::Unknown.clamp(100.0), 100.0);
        assert_eq!(MediaLength::Unknown.clamp(-1.0), 0.0);
    }

    #[test]
    fn contains_respects_end() {
        assert!(MediaLength::Known(10.0).contains(9.99));
        assert!(!MediaLength::Known(10.0).contains(10.0));
        assert!(MediaLength::Unknown.contains(1e9));
    }
}
