//! In-process `RemoteStore`.
//!
//! Behaves like the real service (tombstones instead of removal, history
//! recorded on every answered question) and can be switched offline to
//! exercise the failure paths.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use colloquy_core::types::{Message, Session, SessionId};

use crate::error::RemoteError;
use crate::store::{AskRequest, RemoteStore};

#[derive(Debug, Default)]
struct MemoryState {
    /// Insertion order is the listing order.
    sessions: Vec<Session>,
    history: HashMap<SessionId, Vec<Message>>,
    answers: VecDeque<String>,
    asked: Vec<AskRequest>,
    reachable: bool,
    created: usize,
}

/// Remote store held entirely in memory.
#[derive(Debug)]
pub struct MemoryRemote {
    state: Mutex<MemoryState>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    /// An empty, reachable store.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                reachable: true,
                ..MemoryState::default()
            }),
        }
    }

    /// A store pre-populated with sessions `ids[i]` named `"Chat {i+1}"`.
    pub fn with_sessions(ids: &[&str]) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            for (i, id) in ids.iter().enumerate() {
                state
                    .sessions
                    .push(Session::new(*id, format!("Chat {}", i + 1)));
            }
            state.created = ids.len();
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_reachable(state: &MemoryState) -> Result<(), RemoteError> {
        if state.reachable {
            Ok(())
        } else {
            Err(RemoteError::Unreachable)
        }
    }

    /// Simulate the service going down (`false`) or coming back (`true`).
    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }

    /// Replace the stored history of a session.
    pub fn seed_history(&self, id: &str, messages: Vec<Message>) {
        self.lock().history.insert(SessionId::from(id), messages);
    }

    /// Queue the answer returned by the next `ask`.
    pub fn push_answer(&self, answer: impl Into<String>) {
        self.lock().answers.push_back(answer.into());
    }

    /// Every `ask` request received so far, in arrival order.
    pub fn asked(&self) -> Vec<AskRequest> {
        self.lock().asked.clone()
    }

    /// Stored record of a session, tombstoned or not.
    pub fn session(&self, id: &str) -> Option<Session> {
        self.lock()
            .sessions
            .iter()
            .find(|s| s.id.as_str() == id)
            .cloned()
    }

    /// Stored history of a session.
    pub fn history(&self, id: &str) -> Vec<Message> {
        self.lock()
            .history
            .get(&SessionId::from(id))
            .cloned()
            .unwrap_or_default()
    }

    fn find_live<'a>(
        state: &'a mut MemoryState,
        id: &SessionId,
        endpoint: &'static str,
    ) -> Result<&'a mut Session, RemoteError> {
        state
            .sessions
            .iter_mut()
            .find(|s| &s.id == id && !s.is_deleted)
            .ok_or(RemoteError::Status {
                endpoint,
                status: 404,
            })
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn list_sessions(&self) -> Result<Vec<Session>, RemoteError> {
        let state = self.lock();
        Self::ensure_reachable(&state)?;
        Ok(state.sessions.clone())
    }

    async fn create_session(&self) -> Result<SessionId, RemoteError> {
        let mut state = self.lock();
        Self::ensure_reachable(&state)?;
        state.created += 1;
        let id = SessionId::new(Uuid::new_v4().to_string());
        let name = format!("Chat {}", state.created);
        state.sessions.push(Session::new(id.clone(), name));
        Ok(id)
    }

    async fn session_messages(&self, id: &SessionId) -> Result<Vec<Message>, RemoteError> {
        let state = self.lock();
        Self::ensure_reachable(&state)?;
        Ok(state.history.get(id).cloned().unwrap_or_default())
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), RemoteError> {
        let mut state = self.lock();
        Self::ensure_reachable(&state)?;
        Self::find_live(&mut state, id, "/delete-session")?.is_deleted = true;
        Ok(())
    }

    async fn rename_session(&self, id: &SessionId, new_name: &str) -> Result<(), RemoteError> {
        let mut state = self.lock();
        Self::ensure_reachable(&state)?;
        Self::find_live(&mut state, id, "/rename-session")?.name = new_name.to_string();
        Ok(())
    }

    async fn ask(&self, request: &AskRequest) -> Result<String, RemoteError> {
        let mut state = self.lock();
        Self::ensure_reachable(&state)?;
        state.asked.push(request.clone());
        Self::find_live(&mut state, &request.session_id, "/ask")?;

        let answer = state
            .answers
            .pop_front()
            .unwrap_or_else(|| format!("You asked: {}", request.query));

        let history = state.history.entry(request.session_id.clone()).or_default();
        history.push(Message::user(request.query.clone()));
        history.push(Message::bot(answer.clone(), false));
        Ok(answer)
    }
}
