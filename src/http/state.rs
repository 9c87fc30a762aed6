use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::feedback::FeedbackClient;
use crate::session::SessionController;
use crate::tavus::ConversationApi;
use crate::transport::{TransportCommand, TransportEvent};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The tab's conversation session
    pub controller: Arc<SessionController>,

    /// Conversation API used by the stateless proxy routes
    pub api: Arc<dyn ConversationApi>,

    pub feedback: Arc<FeedbackClient>,

    /// Commands waiting for the transport bridge to pick up
    pub transport_commands: Arc<Mutex<mpsc::UnboundedReceiver<TransportCommand>>>,

    /// Events reported by the transport bridge, consumed by the controller's pump
    pub transport_events: mpsc::UnboundedSender<TransportEvent>,
}

impl AppState {
    pub fn new(
        controller: Arc<SessionController>,
        api: Arc<dyn ConversationApi>,
        feedback: Arc<FeedbackClient>,
        transport_commands: mpsc::UnboundedReceiver<TransportCommand>,
        transport_events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Self {
        Self {
            controller,
            api,
            feedback,
            transport_commands: Arc::new(Mutex::new(transport_commands)),
            transport_events,
        }
    }
}
