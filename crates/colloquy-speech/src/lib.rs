//! Speech capture adapter - single-shot speech-to-text behind a strict state machine.
//!
//! The platform recognizer is reached through the `SpeechRecognizer` trait and
//! reports back through `SpeechEvent`s. The adapter owns the
//! Idle -> Listening -> Idle lifecycle, ignores interim results and yields at
//! most one final transcript per attempt.

pub mod capture;
pub mod error;
pub mod state;

pub use capture::{SpeechCapture, SpeechEvent, SpeechRecognizer, ToggleOutcome, UnsupportedRecognizer};
pub use error::SpeechError;
pub use state::SpeechState;
