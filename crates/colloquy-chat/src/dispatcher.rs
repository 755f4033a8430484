//! Query dispatch: one in-flight question per session.
//!
//! A dispatch is split in two so an event loop can own the await:
//! [`QueryDispatcher::submit`] validates, locks the session and echoes the
//! user's text; [`QueryDispatcher::resolve`] appends the answer (or an
//! apology) and unlocks. [`QueryDispatcher::send`] does both around a
//! single remote `ask`. Dropping a [`PendingQuery`] unresolved also unlocks
//! its session, so a cancelled round trip never leaves a session stuck.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use colloquy_core::types::{Message, SessionId};
use colloquy_remote::{AskRequest, RemoteError, RemoteStore};

use crate::transcript::Transcript;

/// Bot reply shown when the answering service could not be reached.
pub const APOLOGY_TEXT: &str = "Sorry, I couldn't get a response right now. Please try again.";

/// Phrases that mark an answer as out of context.
const OUT_OF_CONTEXT_PHRASES: [&str; 3] = ["cannot answer", "out of context", "no information"];

/// Flags answers the service probably could not give from its knowledge.
///
/// Best-effort phrase matching (case-insensitive substring search). It
/// misses refusals worded differently and flags genuine answers that merely
/// quote one of the phrases.
pub fn classify(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    OUT_OF_CONTEXT_PHRASES
        .iter()
        .any(|phrase| lower.contains(phrase))
}

/// Coarse answer language for a locale tag. Unknown tags map to `"en"`.
pub fn language_hint(tag: &str) -> &'static str {
    if tag.starts_with("hi") {
        "hi"
    } else if tag.starts_with("gu") {
        "gu"
    } else {
        "en"
    }
}

/// Sessions with a query in flight, mapped to the query text.
type InFlight = Arc<Mutex<HashMap<SessionId, String>>>;

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<SessionId, String>> {
    in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A submitted query awaiting its answer.
///
/// Hand it back to [`QueryDispatcher::resolve`]; until then the session
/// stays locked. Dropping it abandons the query: the session is unlocked
/// and no reply is recorded.
#[derive(Debug)]
#[must_use = "dropping a pending query abandons it"]
pub struct PendingQuery {
    request: AskRequest,
    in_flight: InFlight,
}

impl Drop for PendingQuery {
    fn drop(&mut self) {
        lock(&self.in_flight).remove(&self.request.session_id);
    }
}

impl PendingQuery {
    pub fn session_id(&self) -> &SessionId {
        &self.request.session_id
    }

    /// The outbound request to send to the answering service.
    pub fn request(&self) -> &AskRequest {
        &self.request
    }
}

/// Owns the set of sessions with a query in flight.
#[derive(Debug, Default)]
pub struct QueryDispatcher {
    in_flight: InFlight,
}

impl QueryDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, session_id: &SessionId) -> bool {
        lock(&self.in_flight).contains_key(session_id)
    }

    /// Text of the query in flight for a session, if any.
    pub fn pending_query(&self, session_id: &SessionId) -> Option<String> {
        lock(&self.in_flight).get(session_id).cloned()
    }

    /// Start a query in the transcript's session.
    ///
    /// Returns `None`, touching nothing, when `text` is blank or the session
    /// already has a query in flight. Otherwise locks the session and appends
    /// the user's message straight away.
    pub fn submit(
        &mut self,
        transcript: &mut Transcript,
        text: &str,
        language_hint: &str,
    ) -> Option<PendingQuery> {
        let query = text.trim();
        if query.is_empty() {
            return None;
        }
        let session_id = transcript.session_id().clone();
        {
            let mut in_flight = lock(&self.in_flight);
            if in_flight.contains_key(&session_id) {
                tracing::debug!(session_id = %session_id, "Query already in flight, ignoring send");
                return None;
            }
            in_flight.insert(session_id.clone(), query.to_string());
        }

        transcript.append(Message::user(query));
        tracing::debug!(session_id = %session_id, lang = language_hint, "Query dispatched");

        Some(PendingQuery {
            request: AskRequest {
                query: query.to_string(),
                session_id,
                selected_lang: language_hint.to_string(),
            },
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Finish a query with the service's outcome and unlock its session.
    ///
    /// The bot message is appended only when `transcript` belongs to the
    /// query's session and ends with the query's echo; it is returned
    /// either way.
    pub fn resolve(
        &mut self,
        pending: PendingQuery,
        outcome: Result<String, RemoteError>,
        transcript: Option<&mut Transcript>,
    ) -> Message {
        let session_id = pending.request.session_id.clone();
        let echo = Message::user(pending.request.query.clone());
        drop(pending);

        let reply = match outcome {
            Ok(answer) => {
                let out_of_context = classify(&answer);
                Message::bot(answer, out_of_context)
            }
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Query failed");
                Message::bot(APOLOGY_TEXT, true)
            }
        };

        match transcript {
            Some(t) if t.session_id() == &session_id && t.last() == Some(&echo) => {
                t.append(reply.clone())
            }
            _ => tracing::debug!(
                session_id = %session_id,
                "Query no longer displayed, reply not appended"
            ),
        }
        reply
    }

    /// Submit, ask, resolve. Returns the bot reply, or `None` if the send
    /// was rejected.
    pub async fn send(
        &mut self,
        remote: &dyn RemoteStore,
        transcript: &mut Transcript,
        text: &str,
        language_hint: &str,
    ) -> Option<Message> {
        let pending = self.submit(transcript, text, language_hint)?;
        let outcome = remote.ask(pending.request()).await;
        Some(self.resolve(pending, outcome, Some(transcript)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::types::Role;
    use colloquy_remote::MemoryRemote;

    fn transcript(id: &str) -> Transcript {
        Transcript::empty(SessionId::from(id))
    }

    #[test]
    fn test_classify_out_of_context_phrases() {
        assert!(classify("I cannot answer that"));
        assert!(classify("This question is OUT OF CONTEXT."));
        assert!(classify("There is No Information about that in the documents"));
    }

    #[test]
    fn test_classify_genuine_answer() {
        assert!(!classify("Paris is the capital of France"));
        assert!(!classify(""));
    }

    #[test]
    fn test_language_hint() {
        assert_eq!(language_hint("hi-IN"), "hi");
        assert_eq!(language_hint("gu-IN"), "gu");
        assert_eq!(language_hint("en-US"), "en");
        assert_eq!(language_hint("fr-FR"), "en");
        assert_eq!(language_hint(""), "en");
        assert_eq!(language_hint("hi"), "hi");
        assert_eq!(language_hint("HI-IN"), "en");
    }

    #[test]
    fn test_submit_blank_text_is_noop() {
        let mut d = QueryDispatcher::new();
        let mut t = transcript("s");
        assert!(d.submit(&mut t, "", "en").is_none());
        assert!(d.submit(&mut t, "  \t\n", "en").is_none());
        assert!(t.is_empty());
        assert!(!d.is_pending(&SessionId::from("s")));
    }

    #[test]
    fn test_submit_echoes_and_locks() {
        let mut d = QueryDispatcher::new();
        let mut t = transcript("s");
        let pending = d.submit(&mut t, "  What is RAG? ", "hi").unwrap();

        assert!(d.is_pending(&SessionId::from("s")));
        assert_eq!(t.messages(), &[Message::user("What is RAG?")]);
        assert_eq!(pending.request().query, "What is RAG?");
        assert_eq!(pending.request().selected_lang, "hi");
        assert_eq!(pending.session_id().as_str(), "s");

        let _ = d.resolve(pending, Ok("ok".into()), Some(&mut t));
    }

    #[test]
    fn test_second_submit_while_pending_is_rejected() {
        let mut d = QueryDispatcher::new();
        let mut t = transcript("s");
        let first = d.submit(&mut t, "first", "en").unwrap();
        assert!(d.submit(&mut t, "second", "en").is_none());
        assert_eq!(t.len(), 1);

        let _ = d.resolve(first, Ok("answer".into()), Some(&mut t));
        assert!(d.submit(&mut t, "second", "en").is_some());
    }

    #[test]
    fn test_other_sessions_are_not_locked() {
        let mut d = QueryDispatcher::new();
        let mut a = transcript("a");
        let mut b = transcript("b");
        let _pa = d.submit(&mut a, "q", "en").unwrap();
        assert!(d.submit(&mut b, "q", "en").is_some());
    }

    #[test]
    fn test_resolve_success_classifies() {
        let mut d = QueryDispatcher::new();
        let mut t = transcript("s");
        let pending = d.submit(&mut t, "q", "en").unwrap();
        let reply = d.resolve(pending, Ok("I cannot answer that".into()), Some(&mut t));

        assert_eq!(reply.role, Role::Bot);
        assert!(reply.out_of_context);
        assert_eq!(t.len(), 2);
        assert!(!d.is_pending(&SessionId::from("s")));
    }

    #[test]
    fn test_resolve_failure_appends_apology_and_unlocks() {
        let mut d = QueryDispatcher::new();
        let mut t = transcript("s");
        let pending = d.submit(&mut t, "q", "en").unwrap();
        let reply = d.resolve(pending, Err(RemoteError::Unreachable), Some(&mut t));

        assert_eq!(reply, Message::bot(APOLOGY_TEXT, true));
        assert_eq!(t.last(), Some(&Message::bot(APOLOGY_TEXT, true)));
        assert!(!d.is_pending(&SessionId::from("s")));
    }

    #[test]
    fn test_dropped_pending_query_unlocks_session() {
        let mut d = QueryDispatcher::new();
        let mut t = transcript("s");
        let pending = d.submit(&mut t, "q", "en").unwrap();
        assert_eq!(d.pending_query(&SessionId::from("s")).as_deref(), Some("q"));

        drop(pending);
        assert!(!d.is_pending(&SessionId::from("s")));
        assert!(d.pending_query(&SessionId::from("s")).is_none());
        assert!(d.submit(&mut t, "again", "en").is_some());
    }

    #[test]
    fn test_resolve_without_echo_does_not_append() {
        let mut d = QueryDispatcher::new();
        let mut t = transcript("s");
        let pending = d.submit(&mut t, "q", "en").unwrap();

        // Same session, reloaded without the echo.
        let mut reloaded = Transcript::with_messages(
            SessionId::from("s"),
            vec![Message::bot("earlier", false)],
        );
        let reply = d.resolve(pending, Ok("answer".into()), Some(&mut reloaded));
        assert_eq!(reply.text, "answer");
        assert_eq!(reloaded.len(), 1);
        assert!(!d.is_pending(&SessionId::from("s")));
    }

    #[test]
    fn test_resolve_for_other_session_does_not_append() {
        let mut d = QueryDispatcher::new();
        let mut a = transcript("a");
        let pending = d.submit(&mut a, "q", "en").unwrap();

        let mut b = transcript("b");
        let reply = d.resolve(pending, Ok("answer".into()), Some(&mut b));
        assert_eq!(reply.text, "answer");
        assert!(b.is_empty());
        assert!(!d.is_pending(&SessionId::from("a")));
    }

    #[tokio::test]
    async fn test_send_round_trip() {
        let remote = MemoryRemote::with_sessions(&["s"]);
        remote.push_answer("Paris is the capital of France");
        let mut d = QueryDispatcher::new();
        let mut t = transcript("s");

        let reply = d.send(&remote, &mut t, "Capital?", "en").await.unwrap();
        assert!(!reply.out_of_context);
        assert_eq!(
            t.messages(),
            &[
                Message::user("Capital?"),
                Message::bot("Paris is the capital of France", false)
            ]
        );
        assert_eq!(remote.asked().len(), 1);
    }

    #[tokio::test]
    async fn test_send_blank_never_reaches_remote() {
        let remote = MemoryRemote::with_sessions(&["s"]);
        let mut d = QueryDispatcher::new();
        let mut t = transcript("s");
        assert!(d.send(&remote, &mut t, "   ", "en").await.is_none());
        assert!(remote.asked().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_never_leaves_session_locked() {
        let remote = MemoryRemote::with_sessions(&["s"]);
        remote.set_reachable(false);
        let mut d = QueryDispatcher::new();
        let mut t = transcript("s");

        let reply = d.send(&remote, &mut t, "q", "en").await.unwrap();
        assert!(reply.out_of_context);
        assert_eq!(reply.text, APOLOGY_TEXT);
        assert!(!d.is_pending(&SessionId::from("s")));
        assert_eq!(t.len(), 2);
    }
}
