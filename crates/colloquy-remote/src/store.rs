//! The remote store contract and its wire types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use colloquy_core::types::{Message, Session, SessionId};

use crate::error::RemoteError;

/// Body of `POST /ask`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    pub query: String,
    pub session_id: SessionId,
    /// Coarse two-letter answer language ("en", "hi", "gu").
    pub selected_lang: String,
}

/// Response of `POST /ask`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

/// Response of `POST /create-session`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub id: SessionId,
}

/// Response of `GET /session/{id}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionHistory {
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Body of `PUT /rename-session/{id}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenameRequest {
    pub new_name: String,
}

/// Authoritative session storage and question answering.
///
/// Implementations report any failure as a `RemoteError`; callers treat all
/// of them as "service unavailable".
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All sessions known to the store, tombstoned ones included.
    async fn list_sessions(&self) -> Result<Vec<Session>, RemoteError>;

    /// Create a session and return its id.
    async fn create_session(&self) -> Result<SessionId, RemoteError>;

    /// Stored history of one session, oldest first.
    async fn session_messages(&self, id: &SessionId) -> Result<Vec<Message>, RemoteError>;

    /// Tombstone a session.
    async fn delete_session(&self, id: &SessionId) -> Result<(), RemoteError>;

    async fn rename_session(&self, id: &SessionId, new_name: &str) -> Result<(), RemoteError>;

    /// Ask a question within a session and return the answer text.
    async fn ask(&self, request: &AskRequest) -> Result<String, RemoteError>;
}
