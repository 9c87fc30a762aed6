use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use super::{InputSettings, JoinOptions, Transport};
use crate::error::{Result, SessionError};

/// Command queued for whatever drives the real transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum TransportCommand {
    Join { url: String, options: JoinOptions },
    Leave,
    SetLocalAudio { enabled: bool },
    SetLocalVideo { enabled: bool },
    StartRecording,
    StopRecording,
    UpdateInputSettings { settings: InputSettings },
    SendAppMessage { message: serde_json::Value },
}

/// Transport that forwards every command onto a channel
///
/// Used with a bridge (e.g. a browser page polling the HTTP API) that
/// executes the commands against the real call SDK and reports events back.
#[derive(Clone)]
pub struct ChannelTransport {
    commands: mpsc::UnboundedSender<TransportCommand>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransportCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { commands: tx }, rx)
    }

    fn send(&self, command: TransportCommand) -> Result<()> {
        debug!("Queueing transport command: {:?}", command);
        self.commands
            .send(command)
            .map_err(|_| SessionError::Transport("transport bridge disconnected".to_string()))
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn join(&self, url: &str, options: &JoinOptions) -> Result<()> {
        self.send(TransportCommand::Join {
            url: url.to_string(),
            options: options.clone(),
        })
    }

    async fn leave(&self) -> Result<()> {
        self.send(TransportCommand::Leave)
    }

    async fn set_local_audio(&self, enabled: bool) -> Result<()> {
        self.send(TransportCommand::SetLocalAudio { enabled })
    }

    async fn set_local_video(&self, enabled: bool) -> Result<()> {
        self.send(TransportCommand::SetLocalVideo { enabled })
    }

    async fn start_recording(&self) -> Result<()> {
        self.send(TransportCommand::StartRecording)
    }

    async fn stop_recording(&self) -> Result<()> {
        self.send(TransportCommand::StopRecording)
    }

    async fn update_input_settings(&self, settings: InputSettings) -> Result<()> {
        self.send(TransportCommand::UpdateInputSettings { settings })
    }

    async fn send_app_message(&self, message: serde_json::Value) -> Result<()> {
        self.send(TransportCommand::SendAppMessage { message })
    }
}
