use serde::{Deserialize, Serialize};

use super::store::{Session, SessionStatus, SpeakingState};

/// Point-in-time view of the controller for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Lifecycle status
    pub status: SessionStatus,

    /// Current session, if any
    pub session: Option<Session>,

    /// Speaking indicators
    pub speaking: SpeakingState,

    /// Last error surfaced to the user
    pub last_error: Option<String>,

    /// Number of messages aggregated so far
    pub message_count: usize,

    /// Seconds since the session was created
    pub duration_secs: Option<f64>,
}
