//! Chat controller: the single owner of UI-visible chat state.
//!
//! Wires the session registry, transcript, query dispatcher and speech
//! adapter together. Remote failures never escape: they end up as a notice
//! (or, for queries, an apology in the transcript) and the state falls back
//! to the last confirmed one.

use std::sync::Arc;

use colloquy_core::types::{Locale, Message, Notice, NoticeKind, Session, SessionId};
use colloquy_remote::{RemoteError, RemoteStore};
use colloquy_speech::{SpeechCapture, SpeechError, SpeechEvent, SpeechState, ToggleOutcome};

use crate::dispatcher::{language_hint, PendingQuery, QueryDispatcher};
use crate::error::ChatError;
use crate::registry::{RenameOutcome, SessionRegistry};
use crate::transcript::Transcript;

/// Owns the active session, its transcript, the compose field and the
/// pending notices.
///
/// There is an active session exactly when there is a transcript, and the
/// active session is always one the registry lists.
pub struct ChatController {
    remote: Arc<dyn RemoteStore>,
    registry: SessionRegistry,
    transcript: Option<Transcript>,
    dispatcher: QueryDispatcher,
    speech: SpeechCapture,
    compose: String,
    locale: Locale,
    notices: Vec<Notice>,
}

impl std::fmt::Debug for ChatController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatController")
            .field("registry", &self.registry)
            .field("transcript", &self.transcript)
            .field("dispatcher", &self.dispatcher)
            .field("speech", &self.speech)
            .field("compose", &self.compose)
            .field("locale", &self.locale)
            .finish()
    }
}

impl ChatController {
    pub fn new(remote: Arc<dyn RemoteStore>, speech: SpeechCapture) -> Self {
        let locale = speech.locale();
        Self {
            registry: SessionRegistry::new(remote.clone()),
            remote,
            transcript: None,
            dispatcher: QueryDispatcher::new(),
            speech,
            compose: String::new(),
            locale,
            notices: Vec::new(),
        }
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn sessions(&self) -> &[Session] {
        self.registry.sessions()
    }

    pub fn active_session(&self) -> Option<&SessionId> {
        self.transcript.as_ref().map(Transcript::session_id)
    }

    pub fn transcript(&self) -> Option<&Transcript> {
        self.transcript.as_ref()
    }

    /// Messages of the active session; empty when none is active.
    pub fn messages(&self) -> &[Message] {
        self.transcript
            .as_ref()
            .map(Transcript::messages)
            .unwrap_or(&[])
    }

    pub fn compose(&self) -> &str {
        &self.compose
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Whether a query is in flight for the active session.
    pub fn is_pending(&self) -> bool {
        self.active_session()
            .is_some_and(|id| self.dispatcher.is_pending(id))
    }

    pub fn speech_state(&self) -> SpeechState {
        self.speech.state()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Remove and return all notices raised so far.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Initial load: fetch the session list and open the first session.
    pub async fn start(&mut self) {
        self.refresh().await;
    }

    /// Re-fetch the session list. If no session is active afterwards, the
    /// first listed one is opened.
    pub async fn refresh(&mut self) {
        self.reload_sessions().await;

        if self.transcript.is_none() {
            if let Some(first) = self.registry.first().map(|s| s.id.clone()) {
                self.select(&first).await;
            }
        }
    }

    /// Make `id` the active session and load its history.
    ///
    /// Unknown ids are ignored. If the history cannot be loaded the
    /// previous selection stays. A query still in flight for the session is
    /// echoed again when the stored history does not end with it yet.
    pub async fn select(&mut self, id: &SessionId) -> bool {
        if !self.registry.contains(id) {
            tracing::debug!(session_id = %id, "Ignoring selection of unknown session");
            return false;
        }

        match Transcript::load(self.remote.as_ref(), id).await {
            Ok(mut transcript) => {
                if let Some(query) = self.dispatcher.pending_query(id) {
                    let echo = Message::user(query);
                    if transcript.last() != Some(&echo) {
                        transcript.append(echo);
                    }
                }
                tracing::info!(session_id = %id, "Session selected");
                self.transcript = Some(transcript);
                true
            }
            Err(e) => {
                self.notify_failure("Could not open session", &e);
                false
            }
        }
    }

    /// Create a session and open it with an empty transcript.
    ///
    /// Returns the new id. On failure the active session is unchanged.
    pub async fn create_session(&mut self) -> Option<SessionId> {
        let id = match self.registry.create().await {
            Ok(id) => id,
            Err(e) => {
                self.notify_failure("Could not create a new chat", &e);
                return None;
            }
        };

        self.reload_sessions().await;

        if self.registry.contains(&id) {
            self.transcript = Some(Transcript::empty(id.clone()));
        } else {
            tracing::warn!(session_id = %id, "Created session missing from listing");
        }
        Some(id)
    }

    /// Rename a session. Blank names are ignored.
    ///
    /// Returns whether the store accepted the rename; a failure to re-list
    /// afterwards is reported separately.
    pub async fn rename_session(&mut self, id: &SessionId, new_name: &str) -> bool {
        match self.registry.rename(id, new_name).await {
            Ok(RenameOutcome::Renamed) => {
                self.reload_sessions().await;
                true
            }
            Ok(RenameOutcome::Unchanged) => false,
            Err(e) => {
                self.notify_failure("Could not rename session", &e);
                false
            }
        }
    }

    /// Delete a session.
    ///
    /// Deleting the active session opens the first remaining one, or leaves
    /// no session active when none remain. Returns whether the store
    /// deleted it; a failure to re-list afterwards is reported separately.
    pub async fn delete_session(&mut self, id: &SessionId) -> bool {
        let was_active = self.active_session() == Some(id);

        if let Err(e) = self.registry.delete(id).await {
            self.notify_failure("Could not delete session", &e);
            return false;
        }

        self.reload_sessions().await;
        if was_active {
            self.transcript = None;
            if let Some(first) = self.registry.first().map(|s| s.id.clone()) {
                self.select(&first).await;
            }
        }
        true
    }

    /// Re-list sessions and drop the active one if it disappeared.
    async fn reload_sessions(&mut self) {
        let listed = self.registry.list().await.map(|sessions| sessions.len());
        if let Err(e) = listed {
            self.notify_failure("Could not load sessions", &e);
        }
        self.reconcile();
    }

    /// Drop the active session if the registry no longer lists it.
    fn reconcile(&mut self) {
        let stale = self
            .active_session()
            .is_some_and(|id| !self.registry.contains(id));
        if stale {
            tracing::debug!("Active session no longer listed, clearing transcript");
            self.transcript = None;
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn set_compose(&mut self, text: impl Into<String>) {
        self.compose = text.into();
    }

    /// Dispatch the compose field to the active session.
    ///
    /// Returns `None` without side effects if there is no active session,
    /// the text is blank or a query is already in flight. On dispatch the
    /// user's message is appended and the compose field cleared.
    pub fn submit(&mut self) -> Option<PendingQuery> {
        let transcript = self.transcript.as_mut()?;
        let hint = language_hint(self.locale.tag());
        let pending = self.dispatcher.submit(transcript, &self.compose, hint)?;
        self.compose.clear();
        Some(pending)
    }

    /// Complete a query started with [`ChatController::submit`].
    pub fn resolve(
        &mut self,
        pending: PendingQuery,
        outcome: Result<String, RemoteError>,
    ) -> Message {
        self.dispatcher
            .resolve(pending, outcome, self.transcript.as_mut())
    }

    /// Send the compose field and wait for the answer.
    pub async fn send(&mut self) -> Option<Message> {
        let pending = self.submit()?;
        let outcome = self.remote.ask(pending.request()).await;
        Some(self.resolve(pending, outcome))
    }

    // =========================================================================
    // Speech
    // =========================================================================

    /// Change the recognition locale and the answer language hint.
    pub fn set_locale(&mut self, locale: Locale) {
        tracing::info!(locale = %locale, "Locale changed");
        self.locale = locale;
        self.speech.set_locale(locale);
    }

    /// Start listening, or stop if already listening.
    pub fn toggle_speech(&mut self) -> Option<ToggleOutcome> {
        match self.speech.toggle() {
            Ok(outcome) => Some(outcome),
            Err(SpeechError::CapabilityUnavailable) => {
                self.notices.push(Notice::new(
                    NoticeKind::CapabilityUnavailable,
                    ChatError::CapabilityUnavailable.to_string(),
                ));
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Speech capture could not start");
                self.notices.push(Notice::new(
                    NoticeKind::Info,
                    format!("Speech capture could not start: {}", e),
                ));
                None
            }
        }
    }

    pub fn stop_speech(&mut self) -> bool {
        self.speech.stop()
    }

    /// Forward a recognizer event. A final transcript is merged into the
    /// compose field; returns whether that happened.
    pub fn handle_speech_event(&mut self, event: SpeechEvent) -> bool {
        match self.speech.handle_event(event) {
            Some(text) => {
                if !self.compose.trim().is_empty() {
                    let kept = self.compose.trim_end().len();
                    self.compose.truncate(kept);
                    self.compose.push(' ');
                } else {
                    self.compose.clear();
                }
                self.compose.push_str(&text);
                true
            }
            None => false,
        }
    }

    fn notify_failure(&mut self, context: &str, err: &ChatError) {
        tracing::warn!(error = %err, "{}", context);
        let kind = match err {
            ChatError::RemoteUnavailable(_) => NoticeKind::RemoteUnavailable,
            ChatError::CapabilityUnavailable => NoticeKind::CapabilityUnavailable,
            _ => NoticeKind::Info,
        };
        self.notices
            .push(Notice::new(kind, format!("{}: {}", context, err)));
    }
}

// =============================================================================
// Tests
// =============================================================================
