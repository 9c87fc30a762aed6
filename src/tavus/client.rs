use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info};

use super::messages::{Conversation, ConversationProperties, CreateConversationRequest};
use crate::config::TavusConfig;
use crate::error::{Result, SessionError};
use crate::session::ConversationConfig;

/// Remote conversation API
///
/// Implemented by [`TavusClient`] against the real service; tests
/// substitute their own implementations.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    /// Create a conversation and return its id and join URL
    async fn create_conversation(&self, config: &ConversationConfig) -> Result<Conversation>;

    /// Tell the service the conversation is over
    async fn end_conversation(&self, conversation_id: &str) -> Result<()>;
}

pub struct TavusClient {
    client: Client,
    config: TavusConfig,
}

impl TavusClient {
    pub fn new(config: TavusConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Build the create request body from configured defaults and per-call options
    pub fn build_create_request(&self, options: &ConversationConfig) -> CreateConversationRequest {
        let cfg = &self.config;

        CreateConversationRequest {
            replica_id: cfg.replica_id.clone(),
            persona_id: cfg.persona_id.clone(),
            callback_url: cfg.callback_url.clone(),
            conversation_name: cfg.conversation_name.clone(),
            conversational_context: options
                .conversational_context
                .clone()
                .unwrap_or_else(|| cfg.conversational_context.clone()),
            custom_greeting: cfg.custom_greeting.clone(),
            document_ids: options.document_ids.clone(),
            properties: ConversationProperties {
                max_call_duration: cfg.max_call_duration,
                participant_left_timeout: cfg.participant_left_timeout,
                participant_absent_timeout: cfg.participant_absent_timeout,
                enable_recording: options.enable_recording,
                enable_closed_captions: options.enable_closed_captions,
                apply_greenscreen: false,
                language: cfg.language.clone(),
            },
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SessionError::ConfigMissing("TAVUS_API_KEY".to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ConversationApi for TavusClient {
    async fn create_conversation(&self, options: &ConversationConfig) -> Result<Conversation> {
        let api_key = self.api_key()?;
        let body = self.build_create_request(options);

        info!(
            "Creating conversation (replica={}, recording={}, captions={})",
            body.replica_id, body.properties.enable_recording, body.properties.enable_closed_captions
        );

        let resp = self
            .client
            .post(self.url("conversations"))
            .header("x-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!("Conversation API error ({}): {}", status, text);
            return Err(SessionError::remote(status.as_u16(), text));
        }

        let conversation: Conversation = resp.json().await?;
        info!(
            "Created conversation {} at {}",
            conversation.conversation_id, conversation.conversation_url
        );

        Ok(conversation)
    }

    async fn end_conversation(&self, conversation_id: &str) -> Result<()> {
        if conversation_id.is_empty() {
            return Err(SessionError::Validation(
                "conversation id is required".to_string(),
            ));
        }
        let api_key = self.api_key()?;

        info!("Ending conversation {}", conversation_id);

        let resp = self
            .client
            .post(self.url(&format!("conversations/{}/end", conversation_id)))
            .header("x-api-key", api_key)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!("Conversation API error ({}): {}", status, text);
            return Err(SessionError::remote(status.as_u16(), text));
        }

        info!("Conversation {} ended", conversation_id);
        Ok(())
    }
}
