// SPDX-License-Identifier: MPL-2.0
//! Frame handoff from the decoder to the presentation sink.
//!
//! A grabbed frame lives in decoder-owned memory until it is released. The
//! pipeline copies exactly one frame's worth of bytes into an owned buffer,
//! returns the slot to the decoder, and only then presents the copy. The
//! release happens on every path, including copy failures, so decoder frame
//! slots never leak.

use crate::application::port::{DecoderEngine, FrameSink, SinkFrame};
use crate::domain::video::{PixelFormat, VideoFormat};
use crate::error::{Error, Result};

use super::decoder::DecoderHandle;

/// Geometry of the frames flowing through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub width: u32,
    pub height: u32,
    /// Bytes per frame, `width * height * 3`.
    pub data_size: usize,
}

impl From<&VideoFormat> for FrameLayout {
    fn from(format: &VideoFormat) -> Self {
        Self {
            width: format.width,
            height: format.height,
            data_size: format.data_size(),
        }
    }
}

/// Result of one transfer attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// No frame was due; nothing happened.
    NotReady,
    /// A frame was copied and presented.
    Presented,
}

/// Copies frames across the decoder boundary and drains audio.
#[derive(Debug, Default)]
pub struct FrameTransferPipeline {
    layout: Option<FrameLayout>,
    frames_presented: u64,
    frames_rejected: u64,
    audio_chunks_drained: u64,
}

impl FrameTransferPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the frame geometry for the loaded session.
    pub fn configure(&mut self, format: &VideoFormat) {
        self.layout = Some(FrameLayout::from(format));
    }

    /// Forgets the frame geometry after the session is gone.
    pub fn clear(&mut self) {
        self.layout = None;
    }

    #[must_use]
    pub fn layout(&self) -> Option<FrameLayout> {
        self.layout
    }

    #[must_use]
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    #[must_use]
    pub fn frames_rejected(&self) -> u64 {
        self.frames_rejected
    }

    #[must_use]
    pub fn audio_chunks_drained(&self) -> u64 {
        self.audio_chunks_drained
    }

    /// Moves one ready frame, if any, from the decoder to `sink`.
    ///
    /// Without a configured layout no frame is grabbed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Frame`] if the decoder buffer is shorter than one
    /// frame or the frame exceeds the sink's capacity, and propagates sink
    /// errors. The decoder frame is released in every case.
    pub fn transfer<E, S>(
        &mut self,
        decoder: &mut DecoderHandle<E>,
        sink: &mut S,
    ) -> Result<TransferOutcome>
    where
        E: DecoderEngine,
        S: FrameSink + ?Sized,
    {
        let Some(layout) = self.layout else {
            return Ok(TransferOutcome::NotReady);
        };

        let copied = match decoder.grab_video_frame() {
            Some(bytes) => copy_frame(bytes, layout, sink.capacity()),
            None => return Ok(TransferOutcome::NotReady),
        };
        decoder.release_video_frame();

        let data = copied.inspect_err(|_| self.frames_rejected += 1)?;
        sink.present(SinkFrame {
            width: layout.width,
            height: layout.height,
            format: PixelFormat::Rgb8,
            data,
        })
        .inspect_err(|_| self.frames_rejected += 1)?;

        self.frames_presented += 1;
        Ok(TransferOutcome::Presented)
    }

    /// Polls one audio chunk and discards it.
    ///
    /// Audio is not rendered; draining keeps the decoder's audio queue from
    /// stalling video decode. Returns the size of the discarded chunk.
    pub fn drain_audio<E: DecoderEngine>(&mut self, decoder: &mut DecoderHandle<E>) -> Option<usize> {
        let size = decoder.audio_data().map(|chunk| chunk.len())?;
        decoder.free_audio_data();
        self.audio_chunks_drained += 1;
        Some(size)
    }
}

fn copy_frame(bytes: &[u8], layout: FrameLayout, capacity: Option<usize>) -> Result<Vec<u8>> {
    if let Some(capacity) = capacity {
        if layout.data_size > capacity {
            return Err(Error::Frame(format!(
                "{}x{} frame needs {} bytes, sink accepts {}",
                layout.width, layout.height, layout.data_size, capacity
            )));
        }
    }

    let frame = bytes.get(..layout.data_size).ok_or_else(|| {
        Error::Frame(format!(
            "decoder buffer holds {} bytes, expected {}",
            bytes.len(),
            layout.data_size
        ))
    })?;
    Ok(frame.to_vec())
}
