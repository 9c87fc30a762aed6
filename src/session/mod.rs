//! Conversation session management
//!
//! This module provides the `SessionController` that manages:
//! - Conversation creation and teardown against the remote API
//! - Joining and leaving the call through the transport
//! - Transcript collection from replica utterance events
//! - Feedback submission and session state

mod config;
mod controller;
mod guard;
mod stats;
mod store;

pub use config::{ConversationConfig, VideoQuality};
pub use controller::{ControllerOptions, SessionController};
pub use guard::{InFlight, StoreRollback, Trigger};
pub use stats::SessionSnapshot;
pub use store::{Session, SessionStatus, SessionStore, SpeakingState};
