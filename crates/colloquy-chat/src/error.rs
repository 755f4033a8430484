//! Error types for the chat controller.

use colloquy_core::types::SessionId;
use colloquy_remote::RemoteError;

/// Errors from the chat components.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("remote service unavailable: {0}")]
    RemoteUnavailable(#[from] RemoteError),
    #[error("speech input is not available on this platform")]
    CapabilityUnavailable,
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
}
