use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SessionError};
use crate::tavus::Conversation;

/// Lifecycle status of the current conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    None,
    Creating,
    Active,
    Ending,
    Ended,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::None => "none",
            SessionStatus::Creating => "creating",
            SessionStatus::Active => "active",
            SessionStatus::Ending => "ending",
            SessionStatus::Ended => "ended",
        };
        f.write_str(s)
    }
}

/// One replica conversation, from creation to termination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Conversation id assigned by the remote API
    pub id: String,

    /// Call room URL the transport joins
    pub join_url: String,

    pub name: Option<String>,

    pub status: SessionStatus,

    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn from_conversation(conversation: &Conversation) -> Self {
        let created_at = conversation
            .created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Self {
            id: conversation.conversation_id.clone(),
            join_url: conversation.conversation_url.clone(),
            name: conversation.conversation_name.clone(),
            status: SessionStatus::Creating,
            created_at,
        }
    }
}

/// Speaking indicators driven by replica app-messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakingState {
    pub user_speaking: bool,
    pub replica_speaking: bool,
}

/// Holds the single live session and its lifecycle flags
///
/// Transitions are checked here; the controller decides when to call them.
#[derive(Debug, Default)]
pub struct SessionStore {
    session: Option<Session>,
    /// A create call is outstanding (no id yet)
    creating: bool,
    speaking: SpeakingState,
    last_error: Option<String>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        match &self.session {
            Some(session) => session.status,
            None if self.creating => SessionStatus::Creating,
            None => SessionStatus::None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn speaking(&self) -> SpeakingState {
        self.speaking
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Reserve the store for a create call
    ///
    /// Only allowed when nothing is live: an ended session that is still
    /// waiting for feedback is replaced.
    pub fn begin_create(&mut self) -> Result<()> {
        match self.status() {
            SessionStatus::None | SessionStatus::Ended => {
                self.session = None;
                self.creating = true;
                self.speaking = SpeakingState::default();
                self.last_error = None;
                Ok(())
            }
            SessionStatus::Creating | SessionStatus::Active => Err(SessionError::Busy("session")),
            from => Err(SessionError::InvalidTransition {
                from,
                to: SessionStatus::Creating,
            }),
        }
    }

    /// Store the session returned by a successful create call
    pub fn complete_create(&mut self, session: Session) -> &Session {
        self.creating = false;
        self.session.insert(session)
    }

    /// Create call failed or timed out; back to `none`
    pub fn fail_create(&mut self, error: &SessionError) {
        self.creating = false;
        self.session = None;
        self.last_error = Some(error.to_string());
    }

    /// Transport confirmed the join
    ///
    /// Returns `true` when this call moved the session to `active`.
    pub fn mark_joined(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) if session.status == SessionStatus::Creating => {
                session.status = SessionStatus::Active;
                true
            }
            _ => false,
        }
    }

    /// Create call abandoned before it returned; back to `none`
    ///
    /// A session stored in the meantime is kept.
    pub fn cancel_create(&mut self) {
        if self.session.is_none() && self.creating {
            self.creating = false;
            self.last_error = Some("conversation creation cancelled".to_string());
        }
    }

    /// Join failed; drop the session so the user can retry
    pub fn join_failed(&mut self, message: impl Into<String>) {
        self.session = None;
        self.creating = false;
        self.speaking = SpeakingState::default();
        self.last_error = Some(message.into());
    }

    pub fn begin_end(&mut self) -> Result<Session> {
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
        match session.status {
            SessionStatus::Creating | SessionStatus::Active => {
                session.status = SessionStatus::Ending;
                Ok(session.clone())
            }
            SessionStatus::Ending => Err(SessionError::Busy("end")),
            from => Err(SessionError::InvalidTransition {
                from,
                to: SessionStatus::Ending,
            }),
        }
    }

    pub fn mark_ended(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.status = SessionStatus::Ended;
        }
        self.speaking = SpeakingState::default();
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn set_user_speaking(&mut self, speaking: bool) {
        self.speaking.user_speaking = speaking;
    }

    pub fn set_replica_speaking(&mut self, speaking: bool) {
        self.speaking.replica_speaking = speaking;
    }

    /// Feedback for `session_id` was delivered
    ///
    /// Resets to `none` only if that session is still the ended one; a
    /// session created meanwhile is left alone.
    pub fn feedback_delivered(&mut self, session_id: &str) -> bool {
        match &self.session {
            Some(session)
                if session.id == session_id && session.status == SessionStatus::Ended =>
            {
                self.reset();
                true
            }
            _ => false,
        }
    }

    /// Back to `none`, forgetting the session
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            id: "c-1".to_string(),
            join_url: "https://call.example/c-1".to_string(),
            name: None,
            status: SessionStatus::Creating,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn full_lifecycle() {
        let mut store = SessionStore::new();
        assert_eq!(store.status(), SessionStatus::None);

        store.begin_create().unwrap();
        assert_eq!(store.status(), SessionStatus::Creating);

        store.complete_create(session());
        assert_eq!(store.status(), SessionStatus::Creating);

        assert!(store.mark_joined());
        assert!(!store.mark_joined());
        assert_eq!(store.status(), SessionStatus::Active);

        let ending = store.begin_end().unwrap();
        assert_eq!(ending.status, SessionStatus::Ending);
        assert_eq!(store.status(), SessionStatus::Ending);

        store.mark_ended();
        assert_eq!(store.status(), SessionStatus::Ended);
        assert_eq!(store.session().map(|s| s.id.as_str()), Some("c-1"));

        store.reset();
        assert_eq!(store.status(), SessionStatus::None);
        assert!(store.session().is_none());
    }

    #[test]
    fn create_rejected_while_live() {
        let mut store = SessionStore::new();
        store.begin_create().unwrap();
        assert!(matches!(store.begin_create(), Err(SessionError::Busy(_))));

        store.complete_create(session());
        store.mark_joined();
        assert!(matches!(store.begin_create(), Err(SessionError::Busy(_))));
    }

    #[test]
    fn failed_create_returns_to_none() {
        let mut store = SessionStore::new();
        store.begin_create().unwrap();
        store.fail_create(&SessionError::remote(401, "invalid key"));

        assert_eq!(store.status(), SessionStatus::None);
        assert!(store.last_error().unwrap().contains("invalid key"));
        store.begin_create().unwrap();
    }

    #[test]
    fn cancelled_create_returns_to_none() {
        let mut store = SessionStore::new();
        store.begin_create().unwrap();
        store.cancel_create();

        assert_eq!(store.status(), SessionStatus::None);
        store.begin_create().unwrap();

        // No effect once the session is stored
        store.complete_create(session());
        store.cancel_create();
        assert_eq!(store.status(), SessionStatus::Creating);
    }

    #[test]
    fn feedback_only_resets_the_ended_session() {
        let mut store = SessionStore::new();
        store.begin_create().unwrap();
        store.complete_create(session());
        store.mark_joined();

        assert!(!store.feedback_delivered("c-1"));
        assert_eq!(store.status(), SessionStatus::Active);

        store.begin_end().unwrap();
        store.mark_ended();
        assert!(!store.feedback_delivered("other"));
        assert!(store.feedback_delivered("c-1"));
        assert_eq!(store.status(), SessionStatus::None);
    }

    #[test]
    fn end_without_session() {
        let mut store = SessionStore::new();
        assert!(matches!(store.begin_end(), Err(SessionError::NoSession)));
    }

    #[test]
    fn end_twice_is_busy_then_invalid() {
        let mut store = SessionStore::new();
        store.begin_create().unwrap();
        store.complete_create(session());
        store.begin_end().unwrap();
        assert!(matches!(store.begin_end(), Err(SessionError::Busy(_))));

        store.mark_ended();
        assert!(matches!(
            store.begin_end(),
            Err(SessionError::InvalidTransition {
                from: SessionStatus::Ended,
                ..
            })
        ));
    }

    #[test]
    fn join_failure_allows_retry() {
        let mut store = SessionStore::new();
        store.begin_create().unwrap();
        store.complete_create(session());
        store.join_failed("camera permission denied");

        assert_eq!(store.status(), SessionStatus::None);
        assert_eq!(store.last_error(), Some("camera permission denied"));
        store.begin_create().unwrap();
    }

    #[test]
    fn session_from_conversation_parses_created_at() {
        let conversation: Conversation = serde_json::from_str(
            r#"{
                "conversation_id": "c-9",
                "conversation_url": "https://call.example/c-9",
                "conversation_name": "Support",
                "created_at": "2025-06-01T12:00:00Z"
            }"#,
        )
        .unwrap();

        let session = Session::from_conversation(&conversation);
        assert_eq!(session.id, "c-9");
        assert_eq!(session.name.as_deref(), Some("Support"));
        assert_eq!(session.created_at.to_rfc3339(), "2025-06-01T12:00:00+00:00");
    }
}
