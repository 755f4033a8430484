//! Speech capture state machine.
//!
//! Valid transitions:
//! - Idle -> Listening (start an attempt)
//! - Listening -> Idle (final result, explicit stop, platform error or end)

use std::fmt;

use crate::error::SpeechError;

/// Operational state of the speech adapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SpeechState {
    /// No attempt in progress.
    #[default]
    Idle,
    /// The platform recognizer is capturing audio.
    Listening,
}

impl fmt::Display for SpeechState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeechState::Idle => write!(f, "Idle"),
            SpeechState::Listening => write!(f, "Listening"),
        }
    }
}

impl SpeechState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &SpeechState) -> bool {
        matches!(
            (self, target),
            (SpeechState::Idle, SpeechState::Listening) | (SpeechState::Listening, SpeechState::Idle)
        )
    }
}

/// Holds the current `SpeechState` and validates every transition.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    state: SpeechState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> SpeechState {
        self.state
    }

    /// Attempt to transition to the target state.
    pub fn transition(&mut self, target: SpeechState) -> Result<(), SpeechError> {
        if self.state.can_transition_to(&target) {
            tracing::debug!("Speech state: {} -> {}", self.state, target);
            self.state = target;
            Ok(())
        } else {
            Err(SpeechError::InvalidTransition {
                from: self.state,
                to: target,
            })
        }
    }

    /// Force the machine back to Idle.
    pub fn reset(&mut self) {
        if self.state != SpeechState::Idle {
            tracing::debug!("Speech state: {} -> Idle (reset)", self.state);
        }
        self.state = SpeechState::Idle;
    }
}
