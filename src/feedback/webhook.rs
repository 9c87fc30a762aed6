use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{error, info};

use crate::error::{Result, SessionError};
use crate::transcript::Transcript;

/// Whether the conversation resolved the user's issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Yes,
    No,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resolution::Yes => "yes",
            Resolution::No => "no",
        })
    }
}

impl FromStr for Resolution {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "yes" => Ok(Resolution::Yes),
            "no" => Ok(Resolution::No),
            other => Err(SessionError::Validation(format!(
                "resolved must be \"yes\" or \"no\", got {:?}",
                other
            ))),
        }
    }
}

/// Feedback as collected from the user, before validation
///
/// Field names match the JSON a browser posts to `/api/send-feedback`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackRequest {
    #[serde(rename = "IssueResolved", default)]
    pub resolved: Option<Resolution>,

    #[serde(rename = "ConversationID", default)]
    pub session_id: Option<String>,

    #[serde(rename = "Feedback", default)]
    pub comment: Option<String>,

    /// Contact email / user account
    #[serde(rename = "TavusUserAccount", default)]
    pub contact: Option<String>,

    #[serde(rename = "ChatTranscript", default)]
    pub transcript: Option<Transcript>,
}

/// Body posted to the feedback webhook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackPayload {
    #[serde(rename = "IssueResolved")]
    pub resolved: Resolution,

    #[serde(rename = "ConversationID")]
    pub session_id: String,

    #[serde(rename = "Feedback")]
    pub comment: String,

    #[serde(rename = "TavusUserAccount")]
    pub contact: String,

    #[serde(rename = "ChatTranscript")]
    pub transcript: Transcript,

    /// RFC 3339 submission time
    pub timestamp: String,
}

impl FeedbackRequest {
    /// Check required fields and build the webhook payload
    pub fn into_payload(self) -> Result<FeedbackPayload> {
        let resolved = self.resolved.ok_or_else(|| {
            SessionError::Validation("IssueResolved is required".to_string())
        })?;

        let session_id = self
            .session_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SessionError::Validation("ConversationID is required".to_string()))?;

        Ok(FeedbackPayload {
            resolved,
            session_id,
            comment: self.comment.unwrap_or_default(),
            contact: self.contact.unwrap_or_default(),
            transcript: self.transcript.unwrap_or_default(),
            timestamp: Utc::now().to_rfc3339(),
        })
    }
}

/// Posts feedback to the configured webhook
pub struct FeedbackClient {
    client: Client,
    webhook_url: Option<String>,
}

impl FeedbackClient {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url: webhook_url.filter(|u| !u.is_empty()),
        }
    }

    /// Validate and send `request`
    ///
    /// Nothing is sent when validation fails. Returns the webhook's JSON
    /// reply, or an empty object when the reply is not JSON.
    pub async fn submit(&self, request: FeedbackRequest) -> Result<serde_json::Value> {
        let payload = request.into_payload()?;

        let url = self
            .webhook_url
            .as_deref()
            .ok_or_else(|| SessionError::ConfigMissing("FEEDBACK_WEBHOOK_URL".to_string()))?;

        info!(
            "Sending feedback for {} to webhook (resolved={}, transcript_messages={})",
            payload.session_id,
            payload.resolved,
            payload.transcript.len()
        );

        let resp = self.client.post(url).json(&payload).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("Feedback webhook returned {}: {}", status, body);
            return Err(SessionError::remote(
                status.as_u16(),
                format!(
                    "webhook returned {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("unknown")
                ),
            ));
        }

        let receipt = resp
            .json::<serde_json::Value>()
            .await
            .unwrap_or_else(|_| serde_json::json!({}));

        info!("Feedback for {} delivered", payload.session_id);
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_resolved_is_validation_error() {
        let req = FeedbackRequest {
            session_id: Some("c-1".to_string()),
            ..Default::default()
        };
        assert!(matches!(req.into_payload(), Err(SessionError::Validation(_))));
    }

    #[test]
    fn missing_session_id_is_validation_error() {
        let req = FeedbackRequest {
            resolved: Some(Resolution::No),
            session_id: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(req.into_payload(), Err(SessionError::Validation(_))));
    }

    #[test]
    fn optional_fields_default_to_empty() {
        let req = FeedbackRequest {
            resolved: Some(Resolution::Yes),
            session_id: Some("c-1".to_string()),
            ..Default::default()
        };
        let payload = req.into_payload().unwrap();

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["IssueResolved"], "yes");
        assert_eq!(json["ConversationID"], "c-1");
        assert_eq!(json["Feedback"], "");
        assert_eq!(json["TavusUserAccount"], "");
        assert_eq!(json["ChatTranscript"], serde_json::json!({"user": [], "assistant": []}));
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn parses_browser_request() {
        let req: FeedbackRequest = serde_json::from_str(
            r#"{"IssueResolved":"no","ConversationID":"c-2","Feedback":"too slow"}"#,
        )
        .unwrap();
        assert_eq!(req.resolved, Some(Resolution::No));
        assert_eq!(req.comment.as_deref(), Some("too slow"));
        assert!(req.transcript.is_none());
    }

    #[tokio::test]
    async fn missing_webhook_is_config_error() {
        let client = FeedbackClient::new(None);
        let err = client
            .submit(FeedbackRequest {
                resolved: Some(Resolution::Yes),
                session_id: Some("c-1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::ConfigMissing(_)));
    }

    #[test]
    fn resolution_from_str() {
        assert_eq!("yes".parse::<Resolution>().unwrap(), Resolution::Yes);
        assert!("maybe".parse::<Resolution>().is_err());
    }
}
