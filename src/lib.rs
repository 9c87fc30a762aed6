pub mod config;
pub mod error;
pub mod feedback;
pub mod http;
pub mod session;
pub mod tavus;
pub mod transcript;
pub mod transport;

pub use config::Config;
pub use error::{Result, SessionError};
pub use feedback::{FeedbackClient, FeedbackDialog, FeedbackRequest, Resolution};
pub use http::{create_router, AppState};
pub use session::{
    ControllerOptions, ConversationConfig, Session, SessionController, SessionSnapshot,
    SessionStatus,
};
pub use tavus::{ConversationApi, TavusClient};
pub use transcript::{Message, Role, Transcript, TranscriptAggregator};
pub use transport::{ChannelTransport, Transport, TransportCommand, TransportEvent};
