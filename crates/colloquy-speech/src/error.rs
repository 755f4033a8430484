//! Error types for speech capture.

use crate::state::SpeechState;

/// Errors from the speech capture adapter.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech input is not available on this platform")]
    CapabilityUnavailable,
    #[error("speech recognizer error: {0}")]
    Platform(String),
    #[error("invalid speech state transition: {from} -> {to}")]
    InvalidTransition { from: SpeechState, to: SpeechState },
}
