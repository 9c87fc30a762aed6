use serde::{Deserialize, Serialize};
use tracing::debug;

use super::message::{Message, Role};
use crate::tavus::UtteranceEvent;

/// Ordered log of a session's utterances
///
/// Messages are kept in arrival order; delivery order from the transport
/// is trusted as-is and duplicates are not filtered.
#[derive(Debug, Default)]
pub struct TranscriptAggregator {
    messages: Vec<Message>,
}

/// Role-partitioned transcript sent with feedback
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub user: Vec<TranscriptEntry>,
    pub assistant: Vec<TranscriptEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    pub text: String,
    /// RFC 3339
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_context: Option<String>,
}

impl Transcript {
    pub fn len(&self) -> usize {
        self.user.len() + self.assistant.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user.is_empty() && self.assistant.is_empty()
    }
}

impl From<&Message> for TranscriptEntry {
    fn from(message: &Message) -> Self {
        Self {
            text: message.text.clone(),
            timestamp: message.timestamp.to_rfc3339(),
            visual_context: message.visual_context.clone(),
        }
    }
}

impl TranscriptAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the utterance carried by `event`
    ///
    /// Events without a known role or without speech are dropped and
    /// `None` is returned; the log is left untouched.
    pub fn on_utterance_event(&mut self, event: &UtteranceEvent) -> Option<&Message> {
        let properties = event.properties.as_ref()?;

        let role = match properties.role.as_deref().map(str::parse::<Role>) {
            Some(Ok(role)) => role,
            _ => {
                debug!("Dropping utterance without a valid role: {:?}", properties.role);
                return None;
            }
        };

        let speech = match properties.speech.as_deref() {
            Some(speech) if !speech.is_empty() => speech,
            _ => {
                debug!("Dropping {} utterance without speech", role);
                return None;
            }
        };

        self.messages
            .push(Message::new(role, speech, properties.visual_context.clone()));
        self.messages.last()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Partition the log by role, preserving arrival order within each side
    pub fn to_transcript(&self) -> Transcript {
        let entries = |role: Role| -> Vec<TranscriptEntry> {
            self.messages
                .iter()
                .filter(|m| m.role == role)
                .map(TranscriptEntry::from)
                .collect()
        };

        Transcript {
            user: entries(Role::User),
            assistant: entries(Role::Replica),
        }
    }
}
