use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_TAVUS_BASE_URL: &str = "https://tavusapi.com/v2";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub tavus: TavusConfig,
    pub feedback: FeedbackConfig,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "replica-chat".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Conversation API settings and the defaults sent with every create call
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TavusConfig {
    pub base_url: String,
    /// Read from `TAVUS_API_KEY` when not set in the file
    pub api_key: Option<String>,
    pub replica_id: String,
    pub persona_id: String,
    pub callback_url: String,
    pub conversation_name: String,
    pub conversational_context: String,
    pub custom_greeting: String,
    pub language: String,
    /// Seconds
    pub max_call_duration: u32,
    pub participant_left_timeout: u32,
    pub participant_absent_timeout: u32,
}

impl Default for TavusConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TAVUS_BASE_URL.to_string(),
            api_key: None,
            replica_id: "r79e1c033f".to_string(),
            persona_id: "p5317866".to_string(),
            callback_url: "https://yourwebsite.com/webhook".to_string(),
            conversation_name: "A Meeting with Hassaan".to_string(),
            conversational_context: "You are about to talk to Hassaan, one of the cofounders of Tavus. He loves to talk about AI, startups, and racing cars.".to_string(),
            custom_greeting: "Hey there Hassaan, long time no see!".to_string(),
            language: "english".to_string(),
            max_call_duration: 3600,
            participant_left_timeout: 60,
            participant_absent_timeout: 300,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Read from `FEEDBACK_WEBHOOK_URL` when not set in the file
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Fail a pending create call after this many seconds (no timeout when unset)
    pub create_timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration, layering (lowest to highest priority):
    /// the optional file at `path`, `REPLICA_CHAT__*` variables, then the
    /// well-known `TAVUS_*` / `FEEDBACK_WEBHOOK_URL` variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("REPLICA_CHAT").separator("__"))
            .set_override_option("tavus.api_key", env_var("TAVUS_API_KEY"))?
            .set_override_option("tavus.replica_id", env_var("TAVUS_REPLICA_ID"))?
            .set_override_option("tavus.persona_id", env_var("TAVUS_PERSONA_ID"))?
            .set_override_option("tavus.callback_url", env_var("TAVUS_CALLBACK_URL"))?
            .set_override_option("feedback.webhook_url", env_var("FEEDBACK_WEBHOOK_URL"))?
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
