//! HTTP API for the browser front-end
//!
//! Proxy routes (stateless, forward to the remote services):
//! - POST /api/create-conversation - Create a conversation
//! - POST /api/end-conversation - End a conversation by id
//! - POST /api/send-feedback - Forward feedback to the webhook
//!
//! Session routes (drive the shared `SessionController`):
//! - POST /session/start, /session/end, /session/reset, /session/feedback
//! - POST /session/audio, /session/video, /session/recording/{start,stop}
//! - POST /session/events - Transport event from the bridge
//! - GET /session/commands - Pending transport commands for the bridge
//! - GET /session/status, /session/transcript
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::status_for;
pub use routes::create_router;
pub use state::AppState;
