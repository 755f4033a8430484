//! Session and message state controller for the Colloquy client.
//!
//! Keeps the locally displayed session list and transcript consistent with
//! the remote session store, serialises queries per session, classifies
//! answers and turns every remote failure into a visible, recoverable state.

pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod transcript;

pub use controller::ChatController;
pub use dispatcher::{classify, language_hint, PendingQuery, QueryDispatcher, APOLOGY_TEXT};
pub use error::ChatError;
pub use registry::{RenameOutcome, SessionRegistry};
pub use transcript::Transcript;
