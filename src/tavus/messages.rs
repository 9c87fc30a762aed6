use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MESSAGE_TYPE_CONVERSATION: &str = "conversation";
pub const MESSAGE_TYPE_SYSTEM: &str = "system";

pub const EVENT_UTTERANCE: &str = "conversation.utterance";
pub const EVENT_REPLICA_STARTED_SPEAKING: &str = "conversation.replica.started_speaking";
pub const EVENT_REPLICA_STOPPED_SPEAKING: &str = "conversation.replica.stopped_speaking";
pub const EVENT_USER_STARTED_SPEAKING: &str = "conversation.user.started_speaking";
pub const EVENT_USER_STOPPED_SPEAKING: &str = "conversation.user.stopped_speaking";
pub const EVENT_APPEND_LLM_CONTEXT: &str = "conversation.append_llm_context";
pub const EVENT_REPLICA_JOINED: &str = "system.replica_joined";

// ============================================================================
// Conversation API
// ============================================================================

/// Body of `POST /conversations`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    pub replica_id: String,
    pub persona_id: String,
    pub callback_url: String,
    pub conversation_name: String,
    pub conversational_context: String,
    pub custom_greeting: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub document_ids: Vec<String>,
    pub properties: ConversationProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationProperties {
    pub max_call_duration: u32,
    pub participant_left_timeout: u32,
    pub participant_absent_timeout: u32,
    pub enable_recording: bool,
    pub enable_closed_captions: bool,
    pub apply_greenscreen: bool,
    pub language: String,
}

/// Conversation returned by the create call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    pub conversation_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    /// Anything else the API returns is carried through untouched
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

// ============================================================================
// App messages (carried over the transport)
// ============================================================================

/// Envelope of every app-message the replica sends over the call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppMessage {
    #[serde(default)]
    pub message_type: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<serde_json::Value>,
}

/// App-message classified by its message/event type
#[derive(Debug, Clone)]
pub enum AppMessageKind {
    Utterance(UtteranceEvent),
    ReplicaStartedSpeaking,
    ReplicaStoppedSpeaking,
    UserStartedSpeaking,
    UserStoppedSpeaking,
    ReplicaJoined,
    Other,
}

impl AppMessage {
    pub fn classify(self) -> AppMessageKind {
        match (self.message_type.as_str(), self.event_type.as_str()) {
            (MESSAGE_TYPE_CONVERSATION, EVENT_UTTERANCE) => {
                AppMessageKind::Utterance(UtteranceEvent::from(self))
            }
            (MESSAGE_TYPE_CONVERSATION, EVENT_REPLICA_STARTED_SPEAKING) => {
                AppMessageKind::ReplicaStartedSpeaking
            }
            (MESSAGE_TYPE_CONVERSATION, EVENT_REPLICA_STOPPED_SPEAKING) => {
                AppMessageKind::ReplicaStoppedSpeaking
            }
            (MESSAGE_TYPE_CONVERSATION, EVENT_USER_STARTED_SPEAKING) => {
                AppMessageKind::UserStartedSpeaking
            }
            (MESSAGE_TYPE_CONVERSATION, EVENT_USER_STOPPED_SPEAKING) => {
                AppMessageKind::UserStoppedSpeaking
            }
            (MESSAGE_TYPE_SYSTEM, EVENT_REPLICA_JOINED) => AppMessageKind::ReplicaJoined,
            _ => AppMessageKind::Other,
        }
    }
}

/// One spoken turn reported by the replica service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UtteranceEvent {
    #[serde(default)]
    pub message_type: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub inference_id: Option<String>,
    #[serde(default)]
    pub properties: Option<UtteranceProperties>,
}

/// Role and speech are optional on the wire; the aggregator decides
/// what to do with incomplete payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UtteranceProperties {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub speech: Option<String>,
    #[serde(default)]
    pub visual_context: Option<String>,
}

impl From<AppMessage> for UtteranceEvent {
    fn from(msg: AppMessage) -> Self {
        let properties = msg
            .properties
            .and_then(|p| serde_json::from_value::<UtteranceProperties>(p).ok());

        Self {
            message_type: msg.message_type,
            event_type: msg.event_type,
            conversation_id: msg.conversation_id,
            inference_id: msg.inference_id,
            properties,
        }
    }
}

/// Outgoing `conversation.append_llm_context` message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendContextMessage {
    pub message_type: String,
    pub event_type: String,
    pub conversation_id: String,
    pub properties: AppendContextProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendContextProperties {
    pub context: String,
}

impl AppendContextMessage {
    pub fn new(conversation_id: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            message_type: MESSAGE_TYPE_CONVERSATION.to_string(),
            event_type: EVENT_APPEND_LLM_CONTEXT.to_string(),
            conversation_id: conversation_id.into(),
            properties: AppendContextProperties {
                context: context.into(),
            },
        }
    }
}
