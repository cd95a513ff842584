// SPDX-License-Identifier: MPL-2.0
//! Decoder session identity and lifecycle state.

use std::fmt;

/// Opaque identifier of one decoder session, unique per load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecoderId(u64);

impl DecoderId {
    /// Wraps a raw engine-assigned identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DecoderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decoder#{}", self.0)
    }
}

/// Lifecycle state of a decoder session as reported by the engine.
///
/// ```text
/// Uninitialized ──▶ Initialized ──▶ Decoding ──▶ Destroyed
///        │
///        └────────▶ InitFailed
/// ```
///
/// Transitions only move forward. `Destroyed` is terminal; loading again
/// always goes through a fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderState {
    /// No media is open yet, or an async open is still in progress.
    #[default]
    Uninitialized,
    /// Metadata is available; decoding has not been started.
    Initialized,
    /// Decoding is running.
    Decoding,
    /// The media source could not be opened.
    InitFailed,
    /// Resources were released.
    Destroyed,
}

impl DecoderState {
    /// Returns true while the session holds open media (initialized or decoding).
    ///
    /// A live session refuses new load requests.
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Initialized | Self::Decoding)
    }

    /// Returns true once the session can no longer make progress.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::InitFailed | Self::Destroyed)
    }

    /// Returns true while frames are being produced.
    #[must_use]
    pub fn is_decoding(self) -> bool {
        matches!(self, Self::Decoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_uninitialized() {
        assert_eq!(DecoderState::default(), DecoderState::Uninitialized);
    }

    #[test]
    fn live_states_are_initialized_and_decoding() {
        assert!(DecoderState::Initialized.is_live());
        assert!(DecoderState::Decoding.is_live());
        assert!(!DecoderState::Uninitialized.is_live());
        assert!(!DecoderState::InitFailed.is_live());
        assert!(!DecoderState::Destroyed.is_live());
    }

    #[test]
    fn terminal_states() {
        assert!(DecoderState::InitFailed.is_terminal());
        assert!(DecoderState::Destroyed.is_terminal());
        assert!(!DecoderState::Decoding.is_terminal());
    }

    #[test]
    fn decoder_id_displays_raw_value() {
        let id = DecoderId::new(7);
        assert_eq!(id.raw(), 7);
        assert_eq!(id.to_string(), "decoder#7");
    }
}
