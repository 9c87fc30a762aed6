use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Conversation API proxy
        .route(
            "/api/create-conversation",
            post(handlers::create_conversation),
        )
        .route("/api/end-conversation", post(handlers::end_conversation))
        .route("/api/send-feedback", post(handlers::send_feedback))
        // Session control
        .route("/session/start", post(handlers::start_session))
        .route("/session/end", post(handlers::end_session))
        .route("/session/reset", post(handlers::reset_session))
        .route("/session/feedback", post(handlers::submit_session_feedback))
        .route("/session/audio", post(handlers::set_audio))
        .route("/session/video", post(handlers::set_video))
        .route("/session/recording/start", post(handlers::start_recording))
        .route("/session/recording/stop", post(handlers::stop_recording))
        // Transport bridge
        .route("/session/events", post(handlers::post_transport_event))
        .route("/session/commands", get(handlers::take_transport_commands))
        // Session queries
        .route("/session/status", get(handlers::get_session_status))
        .route("/session/transcript", get(handlers::get_session_transcript))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
