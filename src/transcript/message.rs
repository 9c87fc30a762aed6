use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Who spoke an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Replica,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Replica => "replica",
        }
    }

    /// Speaker label used when feeding context back to the replica
    pub fn context_label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Replica => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "replica" => Ok(Role::Replica),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A single aggregated utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,

    pub role: Role,

    pub text: String,

    /// When the utterance event was received
    pub timestamp: DateTime<Utc>,

    /// Scene description attached by the replica, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_context: Option<String>,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>, visual_context: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
            visual_context,
        }
    }

    /// `"User: ..."` / `"Assistant: ..."` line appended to the replica's context
    pub fn context_line(&self) -> String {
        format!("{}: {}", self.role.context_label(), self.text)
    }
}
