use serde::{Deserialize, Serialize};

/// Event reported by the call transport
///
/// Serialized with a kebab-case `type` tag matching the transport's own
/// event names, e.g. `{"type": "app-message", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TransportEvent {
    /// The local participant is in the call
    #[serde(alias = "joined-meeting")]
    Joined,

    /// The local participant left (or was removed from) the call
    #[serde(alias = "left-meeting")]
    Left,

    Error {
        #[serde(default)]
        message: String,
    },

    /// Replica app-message; `data` is the raw payload
    AppMessage {
        #[serde(default)]
        data: serde_json::Value,
    },

    TranscriptionStarted,

    TranscriptionStopped,

    TranscriptionError {
        #[serde(default)]
        message: String,
    },

    TranscriptionMessage {
        #[serde(default)]
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        participant_id: Option<String>,
        #[serde(default)]
        is_final: bool,
    },
}

impl TransportEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Joined => "joined",
            Self::Left => "left",
            Self::Error { .. } => "error",
            Self::AppMessage { .. } => "app-message",
            Self::TranscriptionStarted => "transcription-started",
            Self::TranscriptionStopped => "transcription-stopped",
            Self::TranscriptionError { .. } => "transcription-error",
            Self::TranscriptionMessage { .. } => "transcription-message",
        }
    }
}
