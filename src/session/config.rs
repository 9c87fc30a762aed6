use serde::{Deserialize, Serialize};

use crate::transport::JoinOptions;

/// Video quality tier requested for the local call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoQuality {
    Low,
    #[default]
    Medium,
    High,
}

/// Options for a new conversation
///
/// Field names follow the camelCase `dailyConfig` object a browser
/// posts, so the same struct serves both the controller and the proxy
/// routes. Absent fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversationConfig {
    /// Join with the camera off
    pub disable_video: bool,

    /// Join with the microphone off
    pub disable_audio: bool,

    /// Ask the conversation API to record the call
    pub enable_recording: bool,

    /// Ask the conversation API for closed captions
    pub enable_closed_captions: bool,

    /// Participant cap for the call room
    pub max_participants: u32,

    pub video_quality: VideoQuality,

    /// Knowledge-base documents the replica may reference
    pub document_ids: Vec<String>,

    /// Replaces the configured conversational context when set
    pub conversational_context: Option<String>,

    /// Enable microphone noise cancellation after joining
    pub noise_cancellation: bool,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            disable_video: false,
            disable_audio: false,
            enable_recording: true,
            enable_closed_captions: true,
            max_participants: 10,
            video_quality: VideoQuality::Medium,
            document_ids: Vec::new(),
            conversational_context: None,
            noise_cancellation: true,
        }
    }
}

impl ConversationConfig {
    /// Transport-side options for joining the call
    pub fn join_options(&self) -> JoinOptions {
        JoinOptions {
            start_video_off: self.disable_video,
            start_audio_off: self.disable_audio,
            video_quality: self.video_quality,
            max_participants: self.max_participants,
            noise_cancellation: self.noise_cancellation,
        }
    }
}
