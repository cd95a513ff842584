// SPDX-License-Identifier: MPL-2.0
//! Video decoding error categories.

use std::fmt;

/// Specific error types for media sessions that fail to open or decode.
///
/// Decoder adapters classify their raw failure messages into one of these
/// categories so diagnostics can group failures without parsing strings.
#[derive(Debug, Clone, PartialEq)]
pub enum VideoError {
    /// Video codec is not supported by the decoder backend.
    UnsupportedCodec(String),

    /// File appears corrupted or has invalid data.
    CorruptedFile,

    /// File exists but contains no video stream.
    NoVideoStream,

    /// Decoding failed after the session was opened.
    DecodingFailed(String),

    /// I/O error (file not found, permission denied, etc.)
    IoError(String),

    /// Generic error with raw message.
    Other(String),
}

impl VideoError {
    /// Returns a stable machine-readable key for this error category.
    pub fn kind(&self) -> &'static str {
        match self {
            VideoError::UnsupportedCodec(_) => "unsupported-codec",
            VideoError::CorruptedFile => "corrupted-file",
            VideoError::NoVideoStream => "no-video-stream",
            VideoError::DecodingFailed(_) => "decoding-failed",
            VideoError::IoError(_) => "io",
            VideoError::Other(_) => "other",
        }
    }

    /// Attempts to parse a raw error message into a specific `VideoError` type.
    /// This is used to categorize errors coming out of `FFmpeg`.
    pub fn from_message(msg: &str) -> Self {
        let msg_lower = msg.to_lowercase();

        // Codec errors first, they might contain "not found"
        if msg_lower.contains("codec") || msg_lower.contains("decoder") {
            if let Some(codec) = Self::extract_codec_name(&msg_lower) {
                return VideoError::UnsupportedCodec(codec);
            } else if msg_lower.contains("not found") || msg_lower.contains("unsupported") {
                return VideoError::DecodingFailed(msg.to_string());
            }
        }

        if msg_lower.contains("no such file")
            || (msg_lower.contains("not found") && !msg_lower.contains("decoder"))
            || msg_lower.contains("permission denied")
            || msg_lower.contains("i/o error")
        {
            return VideoError::IoError(msg.to_string());
        }

        if msg_lower.contains("no video stream")
            || msg_lower.contains("no video track")
            || msg_lower.contains("invalid data found")
        {
            return VideoError::NoVideoStream;
        }

        if msg_lower.contains("corrupt")
            || msg_lower.contains("invalid")
            || msg_lower.contains("malformed")
        {
            return VideoError::CorruptedFile;
        }

        if msg_lower.contains("packet")
            || msg_lower.contains("scaling")
            || msg_lower.contains("seek")
            || msg_lower.contains("decode")
        {
            return VideoError::DecodingFailed(msg.to_string());
        }

        VideoError::Other(msg.to_string())
    }

    fn extract_codec_name(msg: &str) -> Option<String> {
        let codecs = ["h264", "hevc", "h265", "vp8", "vp9", "av1", "mpeg4", "mpeg2"];
        codecs
            .iter()
            .find(|codec| msg.contains(*codec))
            .map(|codec| codec.to_uppercase())
    }
}

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoError::UnsupportedCodec(codec) => {
                write!(f, "Unsupported video codec: {}", codec)
            }
            VideoError::CorruptedFile => write!(f, "Video file is corrupted"),
            VideoError::NoVideoStream => write!(f, "No video stream found"),
            VideoError::DecodingFailed(msg) => write!(f, "Decoding failed: {}", msg),
            VideoError::IoError(msg) => write!(f, "I/O error: {}", msg),
            VideoError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for VideoError {}
