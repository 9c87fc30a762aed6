use super::state::AppState;
use crate::error::SessionError;
use crate::feedback::{FeedbackRequest, Resolution};
use crate::session::{ConversationConfig, Session};
use crate::tavus::Conversation;
use crate::transcript::{Message, Transcript};
use crate::transport::{TransportCommand, TransportEvent};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationBody {
    /// Call/conversation options from the configuration form
    pub daily_config: Option<ConversationConfig>,
}

#[derive(Debug, Serialize)]
pub struct CreateConversationResponse {
    pub success: bool,
    pub conversation: Conversation,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndConversationBody {
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendFeedbackResponse {
    pub success: bool,
    pub message: String,
    pub webhook_response: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session: Session,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionFeedbackRequest {
    pub resolved: Option<Resolution>,
    pub comment: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub messages: Vec<Message>,
    pub transcript: Transcript,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn error_body(status: StatusCode, error: impl Into<String>, details: Option<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            details,
        }),
    )
        .into_response()
}

/// HTTP status for a controller/client error
pub fn status_for(err: &SessionError) -> StatusCode {
    match err {
        SessionError::Validation(_) => StatusCode::BAD_REQUEST,
        SessionError::NoSession => StatusCode::NOT_FOUND,
        SessionError::Busy(_) | SessionError::InvalidTransition { .. } => StatusCode::CONFLICT,
        SessionError::ConfigMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SessionError::RemoteCallFailed { status, .. } => status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::BAD_GATEWAY),
        SessionError::Transport(_) => StatusCode::BAD_GATEWAY,
        SessionError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        error_body(status_for(&self), self.to_string(), None)
    }
}

/// Parse an optional JSON body, falling back to defaults when absent or invalid
fn parse_or_default<T: for<'de> Deserialize<'de> + Default>(body: &Bytes) -> T {
    if body.is_empty() {
        return T::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        warn!("Ignoring unparseable request body: {}", e);
        T::default()
    })
}

// ============================================================================
// Proxy handlers
// ============================================================================

/// POST /api/create-conversation
/// Create a conversation on the remote API
pub async fn create_conversation(State(state): State<AppState>, body: Bytes) -> Response {
    let req: CreateConversationBody = parse_or_default(&body);
    let config = req.daily_config.unwrap_or_default();

    match state.api.create_conversation(&config).await {
        Ok(conversation) => (
            StatusCode::OK,
            Json(CreateConversationResponse {
                success: true,
                conversation,
            }),
        )
            .into_response(),
        Err(e @ SessionError::ConfigMissing(_)) => error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Tavus API key not configured. Please set TAVUS_API_KEY in your environment variables.",
            Some(e.to_string()),
        ),
        Err(SessionError::RemoteCallFailed {
            status: Some(status),
            message,
        }) => error_body(
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            "Failed to create conversation",
            Some(message),
        ),
        Err(e) => {
            error!("Error creating conversation: {}", e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
        }
    }
}

/// POST /api/end-conversation
/// End a conversation on the remote API
pub async fn end_conversation(State(state): State<AppState>, body: Bytes) -> Response {
    let req: EndConversationBody = parse_or_default(&body);

    let Some(conversation_id) = req.conversation_id.filter(|id| !id.is_empty()) else {
        return error_body(StatusCode::BAD_REQUEST, "Conversation ID is required", None);
    };

    match state.api.end_conversation(&conversation_id).await {
        Ok(()) => (StatusCode::OK, Json(SuccessResponse { success: true })).into_response(),
        Err(e @ SessionError::ConfigMissing(_)) => error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Tavus API key not configured",
            Some(e.to_string()),
        ),
        Err(SessionError::RemoteCallFailed {
            status: Some(status),
            ..
        }) => error_body(
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            "Failed to end conversation",
            None,
        ),
        Err(e) => {
            error!("Error ending conversation: {}", e);
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
        }
    }
}

/// POST /api/send-feedback
/// Forward feedback to the webhook
pub async fn send_feedback(State(state): State<AppState>, body: Bytes) -> Response {
    let req: FeedbackRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            return error_body(
                StatusCode::BAD_REQUEST,
                "Invalid feedback request",
                Some(e.to_string()),
            )
        }
    };

    match state.feedback.submit(req).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(SendFeedbackResponse {
                success: true,
                message: "Feedback sent successfully to webhook".to_string(),
                webhook_response: receipt,
            }),
        )
            .into_response(),
        Err(SessionError::Validation(_)) => error_body(
            StatusCode::BAD_REQUEST,
            "Missing required fields: IssueResolved and ConversationID are required",
            None,
        ),
        Err(e @ SessionError::ConfigMissing(_)) => error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Feedback webhook URL not configured. Please set FEEDBACK_WEBHOOK_URL in environment variables.",
            Some(e.to_string()),
        ),
        Err(SessionError::RemoteCallFailed { message, .. }) => error_body(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to send feedback to webhook",
            Some(message),
        ),
        Err(e) => {
            error!("Error sending feedback to webhook: {}", e);
            error_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error while sending feedback",
                None,
            )
        }
    }
}

// ============================================================================
// Session controller handlers
// ============================================================================

/// POST /session/start
/// Create a conversation and join its call
pub async fn start_session(State(state): State<AppState>, body: Bytes) -> Response {
    let config: ConversationConfig = parse_or_default(&body);

    match state.controller.start(config).await {
        Ok(session) => {
            info!("Session {} started", session.id);
            (StatusCode::OK, Json(StartSessionResponse { session })).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// POST /session/end
pub async fn end_session(State(state): State<AppState>) -> Response {
    match state.controller.end().await {
        Ok(()) => (StatusCode::OK, Json(SuccessResponse { success: true })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /session/events
/// Transport event reported by the bridge
pub async fn post_transport_event(
    State(state): State<AppState>,
    Json(event): Json<TransportEvent>,
) -> Response {
    if state.transport_events.send(event).is_err() {
        error!("Transport event pump is not running");
        return error_body(
            StatusCode::SERVICE_UNAVAILABLE,
            "Event pump not running",
            None,
        );
    }
    StatusCode::ACCEPTED.into_response()
}

/// GET /session/commands
/// Drain transport commands queued for the bridge
pub async fn take_transport_commands(State(state): State<AppState>) -> Json<Vec<TransportCommand>> {
    let mut rx = state.transport_commands.lock().await;
    let mut commands = Vec::new();
    while let Ok(command) = rx.try_recv() {
        commands.push(command);
    }
    Json(commands)
}

/// GET /session/status
pub async fn get_session_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.controller.snapshot().await)
}

/// GET /session/transcript
/// Messages aggregated so far and their role partition
pub async fn get_session_transcript(State(state): State<AppState>) -> impl IntoResponse {
    let messages = state.controller.messages().await;
    let transcript = state.controller.transcript().await;
    Json(TranscriptResponse {
        messages,
        transcript,
    })
}

/// POST /session/feedback
pub async fn submit_session_feedback(
    State(state): State<AppState>,
    Json(req): Json<SessionFeedbackRequest>,
) -> Response {
    match state
        .controller
        .submit_feedback(req.resolved, req.comment, req.contact)
        .await
    {
        Ok(receipt) => (
            StatusCode::OK,
            Json(SendFeedbackResponse {
                success: true,
                message: "Feedback sent successfully to webhook".to_string(),
                webhook_response: receipt,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /session/reset
/// Ends a live call first
pub async fn reset_session(State(state): State<AppState>) -> Response {
    match state.controller.reset().await {
        Ok(()) => (StatusCode::OK, Json(SuccessResponse { success: true })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /session/audio
pub async fn set_audio(State(state): State<AppState>, Json(req): Json<ToggleRequest>) -> Response {
    match state.controller.set_local_audio(req.enabled).await {
        Ok(()) => (StatusCode::OK, Json(SuccessResponse { success: true })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /session/video
pub async fn set_video(State(state): State<AppState>, Json(req): Json<ToggleRequest>) -> Response {
    match state.controller.set_local_video(req.enabled).await {
        Ok(()) => (StatusCode::OK, Json(SuccessResponse { success: true })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /session/recording/start
pub async fn start_recording(State(state): State<AppState>) -> Response {
    match state.controller.start_recording().await {
        Ok(()) => (StatusCode::OK, Json(SuccessResponse { success: true })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /session/recording/stop
pub async fn stop_recording(State(state): State<AppState>) -> Response {
    match state.controller.stop_recording().await {
        Ok(()) => (StatusCode::OK, Json(SuccessResponse { success: true })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
