//! Ordered message log for one session.

use colloquy_core::types::{Message, SessionId};
use colloquy_remote::RemoteStore;

use crate::error::ChatError;

/// The transcript of a single session.
///
/// Append-only: messages can be added at the end but never edited, removed
/// or reordered. A different history means a different `Transcript`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    session_id: SessionId,
    messages: Vec<Message>,
}

impl Transcript {
    /// An empty transcript, as for a freshly created session.
    pub fn empty(session_id: SessionId) -> Self {
        Self {
            session_id,
            messages: Vec::new(),
        }
    }

    pub fn with_messages(session_id: SessionId, messages: Vec<Message>) -> Self {
        Self {
            session_id,
            messages,
        }
    }

    /// Fetch a session's stored history.
    ///
    /// The result never carries anything over from a previously loaded
    /// transcript.
    pub async fn load(remote: &dyn RemoteStore, session_id: &SessionId) -> Result<Self, ChatError> {
        let messages = remote.session_messages(session_id).await?;
        tracing::debug!(
            session_id = %session_id,
            messages = messages.len(),
            "Transcript loaded"
        );
        Ok(Self::with_messages(session_id.clone(), messages))
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}
