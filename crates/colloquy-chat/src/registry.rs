//! Local cache of the remote session list.
//!
//! The remote store is authoritative. Mutations never edit the cache; the
//! caller follows each successful one with a fresh `list()`, so the cache
//! only ever shows what the store confirmed. A failed listing empties the
//! cache rather than leaving stale entries around for later actions.

use std::sync::Arc;

use colloquy_core::types::{Session, SessionId};
use colloquy_remote::RemoteStore;

use crate::error::ChatError;

/// Result of a rename request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed,
    /// The requested name was blank; nothing was sent.
    Unchanged,
}

/// CRUD over remote sessions plus the cached, tombstone-free listing.
pub struct SessionRegistry {
    remote: Arc<dyn RemoteStore>,
    sessions: Vec<Session>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions)
            .finish()
    }
}

impl SessionRegistry {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            remote,
            sessions: Vec::new(),
        }
    }

    /// Cached sessions in the order the store listed them.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.get(id).is_some()
    }

    /// First session in listing order.
    pub fn first(&self) -> Option<&Session> {
        self.sessions.first()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Replace the cache with the store's live (non-tombstoned) sessions.
    ///
    /// On failure the cache is emptied.
    pub async fn list(&mut self) -> Result<&[Session], ChatError> {
        match self.remote.list_sessions().await {
            Ok(all) => {
                self.sessions = all.into_iter().filter(|s| !s.is_deleted).collect();
                tracing::debug!(count = self.sessions.len(), "Session list refreshed");
                Ok(&self.sessions)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session listing failed, clearing cache");
                self.sessions.clear();
                Err(e.into())
            }
        }
    }

    /// Ask the store for a new session.
    ///
    /// The cache is not touched; callers refresh it with `list()`.
    pub async fn create(&mut self) -> Result<SessionId, ChatError> {
        let id = self.remote.create_session().await?;
        tracing::info!(session_id = %id, "Session created");
        Ok(id)
    }

    /// Ask the store to rename a session.
    ///
    /// A name that is blank after trimming is a no-op. The cache keeps the
    /// old name until the next `list()`.
    pub async fn rename(&mut self, id: &SessionId, new_name: &str) -> Result<RenameOutcome, ChatError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            tracing::debug!(session_id = %id, "Ignoring blank session name");
            return Ok(RenameOutcome::Unchanged);
        }
        if !self.contains(id) {
            return Err(ChatError::SessionNotFound(id.clone()));
        }

        self.remote.rename_session(id, new_name).await?;
        tracing::info!(session_id = %id, name = new_name, "Session renamed");
        Ok(RenameOutcome::Renamed)
    }

    /// Ask the store to tombstone a session.
    ///
    /// The cache still lists it until the next `list()`.
    pub async fn delete(&mut self, id: &SessionId) -> Result<(), ChatError> {
        if !self.contains(id) {
            return Err(ChatError::SessionNotFound(id.clone()));
        }

        self.remote.delete_session(id).await?;
        tracing::info!(session_id = %id, "Session deleted");
        Ok(())
    }
}
