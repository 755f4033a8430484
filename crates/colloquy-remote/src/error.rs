//! Error types for remote store access.

/// Failures talking to the remote service.
///
/// Every variant means the same thing to callers: the service could not be
/// used for this request. The split exists for logging.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("invalid service URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("{endpoint} request failed: {message}")]
    Transport {
        endpoint: &'static str,
        message: String,
        timed_out: bool,
    },
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("could not decode {endpoint} response: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },
    #[error("remote store is unreachable")]
    Unreachable,
}

impl RemoteError {
    /// Whether the failure was a transport-level timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RemoteError::Transport { timed_out: true, .. })
    }
}
