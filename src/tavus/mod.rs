//! Conversation API client and the replica's app-message protocol

pub mod client;
pub mod messages;

pub use client::{ConversationApi, TavusClient};
pub use messages::{AppMessage, AppMessageKind, AppendContextMessage, Conversation, UtteranceEvent};
