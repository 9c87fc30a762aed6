//! Call transport boundary
//!
//! The real-time transport (joining the call room, device toggles,
//! app-messages) lives outside this crate. This module defines the
//! command side as the [`Transport`] trait and the event side as
//! [`TransportEvent`] values delivered over an mpsc channel.

mod channel;
mod event;

pub use channel::{ChannelTransport, TransportCommand};
pub use event::TransportEvent;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::VideoQuality;

/// Receiving end of the transport's event stream
pub type TransportEvents = tokio::sync::mpsc::UnboundedReceiver<TransportEvent>;

/// Options applied when joining a call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinOptions {
    pub start_video_off: bool,
    pub start_audio_off: bool,
    pub video_quality: VideoQuality,
    pub max_participants: u32,
    /// Turn on noise cancellation once the call is joined
    #[serde(default)]
    pub noise_cancellation: bool,
}

/// Local input processing applied after joining
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputSettings {
    pub audio_processor: AudioProcessor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AudioProcessor {
    #[default]
    None,
    NoiseCancellation,
}

impl InputSettings {
    pub fn noise_cancellation() -> Self {
        Self {
            audio_processor: AudioProcessor::NoiseCancellation,
        }
    }
}

/// Commands issued to the call transport
///
/// `join` only requests the connection; confirmation arrives as
/// [`TransportEvent::Joined`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn join(&self, url: &str, options: &JoinOptions) -> Result<()>;

    async fn leave(&self) -> Result<()>;

    async fn set_local_audio(&self, enabled: bool) -> Result<()>;

    async fn set_local_video(&self, enabled: bool) -> Result<()>;

    async fn start_recording(&self) -> Result<()>;

    async fn stop_recording(&self) -> Result<()>;

    async fn update_input_settings(&self, settings: InputSettings) -> Result<()>;

    /// Send an app-message to the other participants (the replica)
    async fn send_app_message(&self, message: serde_json::Value) -> Result<()>;
}
