//! Speech capture adapter wrapping a platform recognizer.
//!
//! The platform starts and stops capture on request and reports back through
//! `SpeechEvent`s delivered by the host event loop to
//! [`SpeechCapture::handle_event`].

use colloquy_core::types::Locale;

use crate::error::SpeechError;
use crate::state::{SpeechState, StateMachine};

/// Platform speech-to-text engine.
pub trait SpeechRecognizer: Send {
    /// Whether the platform can recognise speech at all. Probed once, when
    /// the adapter is built.
    fn is_supported(&self) -> bool;

    /// Begin capturing one utterance in `locale`.
    fn start(&mut self, locale: Locale) -> Result<(), SpeechError>;

    /// Stop capturing. The platform may still deliver trailing events.
    fn stop(&mut self);
}

/// Callback from the platform recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// A recognition hypothesis. Only final hypotheses are used.
    Result { text: String, is_final: bool },
    /// The platform aborted the attempt (`no-speech`, `not-allowed`, ...).
    Error(String),
    /// Capture ended.
    End,
}

/// What a toggle request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started,
    Stopped,
}

/// Recognizer for platforms without speech input.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedRecognizer;

impl SpeechRecognizer for UnsupportedRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(&mut self, _locale: Locale) -> Result<(), SpeechError> {
        Err(SpeechError::CapabilityUnavailable)
    }

    fn stop(&mut self) {}
}

/// Single-shot speech capture.
///
/// One attempt at a time; a start request while listening stops instead.
/// The locale may be changed at any time but only applies from the next
/// attempt on.
pub struct SpeechCapture {
    recognizer: Box<dyn SpeechRecognizer>,
    machine: StateMachine,
    locale: Locale,
    supported: bool,
}

impl std::fmt::Debug for SpeechCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechCapture")
            .field("machine", &self.machine)
            .field("locale", &self.locale)
            .field("supported", &self.supported)
            .finish()
    }
}

impl SpeechCapture {
    pub fn new(recognizer: Box<dyn SpeechRecognizer>, locale: Locale) -> Self {
        let supported = recognizer.is_supported();
        if !supported {
            tracing::info!("Speech recognition not supported on this platform");
        }
        Self {
            recognizer,
            machine: StateMachine::new(),
            locale,
            supported,
        }
    }

    /// Adapter for a platform without speech input.
    pub fn unsupported(locale: Locale) -> Self {
        Self::new(Box::new(UnsupportedRecognizer), locale)
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    pub fn state(&self) -> SpeechState {
        self.machine.current()
    }

    pub fn is_listening(&self) -> bool {
        self.state() == SpeechState::Listening
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Set the locale for the next attempt. A running attempt keeps the
    /// locale it was started with.
    pub fn set_locale(&mut self, locale: Locale) {
        if self.is_listening() && locale != self.locale {
            tracing::debug!(locale = %locale, "Locale change deferred to next speech attempt");
        }
        self.locale = locale;
    }

    /// Start an attempt, or stop the running one.
    ///
    /// Without platform support this does nothing and reports
    /// `CapabilityUnavailable`. If the recognizer refuses to start the
    /// adapter stays Idle.
    pub fn toggle(&mut self) -> Result<ToggleOutcome, SpeechError> {
        if !self.supported {
            return Err(SpeechError::CapabilityUnavailable);
        }
        if self.is_listening() {
            self.stop();
            return Ok(ToggleOutcome::Stopped);
        }

        self.recognizer.start(self.locale)?;
        self.machine.transition(SpeechState::Listening)?;
        tracing::info!(locale = %self.locale, "Speech capture started");
        Ok(ToggleOutcome::Started)
    }

    /// Stop the running attempt without producing text.
    ///
    /// Returns `false` when nothing was running.
    pub fn stop(&mut self) -> bool {
        if !self.is_listening() {
            return false;
        }
        self.recognizer.stop();
        self.machine.reset();
        tracing::info!("Speech capture stopped");
        true
    }

    /// Feed a platform event into the state machine.
    ///
    /// Returns the transcript when a final, non-blank result ends the
    /// attempt. Interim results are ignored, and so is anything arriving
    /// while Idle, such as a late result after a stop.
    pub fn handle_event(&mut self, event: SpeechEvent) -> Option<String> {
        if !self.is_listening() {
            tracing::debug!(?event, "Speech event ignored while idle");
            return None;
        }

        match event {
            SpeechEvent::Result {
                is_final: false, ..
            } => None,
            SpeechEvent::Result {
                text,
                is_final: true,
            } => {
                self.machine.reset();
                let text = text.trim().to_string();
                if text.is_empty() {
                    tracing::debug!("Speech attempt produced blank transcript");
                    None
                } else {
                    tracing::info!(text_len = text.len(), "Speech transcribed");
                    Some(text)
                }
            }
            SpeechEvent::Error(code) => {
                tracing::warn!(code = %code, "Speech recognition failed");
                self.machine.reset();
                None
            }
            SpeechEvent::End => {
                self.machine.reset();
                None
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
