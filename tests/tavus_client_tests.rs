// Conversation API client against an in-process stand-in server

mod common;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use common::spawn_server;
use replica_chat::config::TavusConfig;
use replica_chat::{ConversationApi, ConversationConfig, SessionError, TavusClient};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

async fn api_server(status: StatusCode, reply: Value) -> (String, Recorded) {
    let recorded = Recorded::default();

    let create = {
        let reply = reply.clone();
        move |State(rec): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>| {
            let reply = reply.clone();
            async move {
                let key = headers
                    .get("x-api-key")
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);
                rec.requests
                    .lock()
                    .unwrap()
                    .push(("/conversations".to_string(), key, body));
                (status, Json(reply))
            }
        }
    };

    let end = move |State(rec): State<Recorded>, Path(id): Path<String>, headers: HeaderMap| async move {
        let key = headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        rec.requests
            .lock()
            .unwrap()
            .push((format!("/conversations/{}/end", id), key, Value::Null));
        status
    };

    let app = Router::new()
        .route("/v2/conversations", post(create))
        .route("/v2/conversations/:id/end", post(end))
        .with_state(recorded.clone());

    let base = spawn_server(app).await;
    (format!("{}/v2", base), recorded)
}

fn client(base_url: String, api_key: Option<&str>) -> TavusClient {
    TavusClient::new(TavusConfig {
        base_url,
        api_key: api_key.map(String::from),
        ..Default::default()
    })
}

#[tokio::test]
async fn test_create_sends_key_and_properties() {
    let (base, recorded) = api_server(
        StatusCode::OK,
        json!({
            "conversation_id": "c123",
            "conversation_url": "https://tavus.daily.co/c123",
            "status": "active",
            "created_at": "2024-05-01T10:00:00Z"
        }),
    )
    .await;

    let config = ConversationConfig {
        enable_recording: false,
        conversational_context: Some("Talk about billing".to_string()),
        ..Default::default()
    };

    let conversation = client(base, Some("secret"))
        .create_conversation(&config)
        .await
        .unwrap();
    assert_eq!(conversation.conversation_id, "c123");
    assert_eq!(conversation.conversation_url, "https://tavus.daily.co/c123");

    let requests = recorded.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (path, key, body) = &requests[0];
    assert_eq!(path, "/conversations");
    assert_eq!(key.as_deref(), Some("secret"));
    assert_eq!(body["replica_id"], "r79e1c033f");
    assert_eq!(body["persona_id"], "p5317866");
    assert_eq!(body["conversational_context"], "Talk about billing");
    assert_eq!(body["properties"]["enable_recording"], false);
    assert_eq!(body["properties"]["enable_closed_captions"], true);
    assert_eq!(body["properties"]["max_call_duration"], 3600);
    assert_eq!(body["properties"]["language"], "english");
}

#[tokio::test]
async fn test_create_error_body_passed_through() {
    let (base, _) = api_server(
        StatusCode::UNAUTHORIZED,
        json!({"message": "Invalid access token"}),
    )
    .await;

    let err = client(base, Some("bad"))
        .create_conversation(&ConversationConfig::default())
        .await
        .unwrap_err();

    match err {
        SessionError::RemoteCallFailed { status, message } => {
            assert_eq!(status, Some(401));
            let body: Value = serde_json::from_str(&message).unwrap();
            assert_eq!(body["message"], "Invalid access token");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_key_makes_no_request() {
    let (base, recorded) = api_server(StatusCode::OK, json!({})).await;

    let err = client(base, None)
        .create_conversation(&ConversationConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::ConfigMissing(_)));
    assert!(recorded.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_end_posts_to_conversation_path() {
    let (base, recorded) = api_server(StatusCode::OK, json!({})).await;

    client(base, Some("secret"))
        .end_conversation("c123")
        .await
        .unwrap();

    let requests = recorded.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "/conversations/c123/end");
    assert_eq!(requests[0].1.as_deref(), Some("secret"));
}

#[tokio::test]
async fn test_end_failure_carries_status() {
    let (base, _) = api_server(StatusCode::NOT_FOUND, json!({})).await;

    let err = client(base, Some("secret"))
        .end_conversation("missing")
        .await
        .unwrap_err();
    assert_eq!(err.remote_status(), Some(404));
}

#[tokio::test]
async fn test_end_requires_id() {
    let (base, recorded) = api_server(StatusCode::OK, json!({})).await;

    let err = client(base, Some("secret"))
        .end_conversation("")
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Validation(_)));
    assert!(recorded.requests.lock().unwrap().is_empty());
}
