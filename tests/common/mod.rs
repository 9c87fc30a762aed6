// Shared test doubles: an in-memory conversation API and in-process HTTP
// servers standing in for the remote API and the feedback webhook.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use replica_chat::tavus::Conversation;
use replica_chat::{
    ChannelTransport, ControllerOptions, ConversationApi, ConversationConfig, FeedbackClient,
    SessionController, SessionError, TransportCommand, TransportEvent,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, Notify};

/// Start `app` on an ephemeral port and return its base URL
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn conversation(id: &str) -> Conversation {
    serde_json::from_value(json!({
        "conversation_id": id,
        "conversation_url": format!("https://call.example/{}", id),
        "conversation_name": "Test conversation",
        "status": "active"
    }))
    .unwrap()
}

#[derive(Default)]
pub struct MockApi {
    pub creates: AtomicUsize,
    pub ends: AtomicUsize,
    /// Fail create with this status/body
    pub create_error: Option<(u16, String)>,
    /// Fail end with this status/body
    pub end_error: Option<(u16, String)>,
    /// Hold create calls until notified
    pub gate: Option<Arc<Notify>>,
    /// Hold end calls until notified
    pub end_gate: Option<Arc<Notify>>,
}

#[async_trait]
impl ConversationApi for MockApi {
    async fn create_conversation(
        &self,
        _config: &ConversationConfig,
    ) -> replica_chat::Result<Conversation> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        if let Some((status, body)) = &self.create_error {
            return Err(SessionError::remote(*status, body.clone()));
        }

        Ok(conversation(&format!("conv-{}", n)))
    }

    async fn end_conversation(&self, _conversation_id: &str) -> replica_chat::Result<()> {
        self.ends.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.end_gate {
            gate.notified().await;
        }

        if let Some((status, body)) = &self.end_error {
            return Err(SessionError::remote(*status, body.clone()));
        }
        Ok(())
    }
}

/// Feedback webhook stand-in recording every payload it receives
pub struct WebhookMock {
    pub url: String,
    pub received: Arc<Mutex<Vec<Value>>>,
}

impl WebhookMock {
    pub async fn spawn(status: StatusCode, reply: Value) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route(
                "/hook",
                post(
                    move |State(received): State<Arc<Mutex<Vec<Value>>>>,
                          Json(body): Json<Value>| {
                        let reply = reply.clone();
                        async move {
                            received.lock().unwrap().push(body);
                            (status, Json(reply))
                        }
                    },
                ),
            )
            .with_state(Arc::clone(&received));

        let base = spawn_server(app).await;
        Self {
            url: format!("{}/hook", base),
            received,
        }
    }

    pub fn count(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }
}

pub struct Harness {
    pub controller: Arc<SessionController>,
    pub api: Arc<MockApi>,
    pub commands: mpsc::UnboundedReceiver<TransportCommand>,
    pub webhook: WebhookMock,
}

impl Harness {
    pub async fn new(api: MockApi) -> Self {
        Self::with_options(api, ControllerOptions::default()).await
    }

    pub async fn with_options(api: MockApi, options: ControllerOptions) -> Self {
        let api = Arc::new(api);
        let webhook = WebhookMock::spawn(StatusCode::OK, json!({"received": true})).await;
        let (transport, commands) = ChannelTransport::new();

        let controller = Arc::new(SessionController::new(
            api.clone(),
            Arc::new(transport),
            Arc::new(FeedbackClient::new(Some(webhook.url.clone()))),
            options,
        ));

        Self {
            controller,
            api,
            commands,
            webhook,
        }
    }

    /// Commands queued so far
    pub fn drain_commands(&mut self) -> Vec<TransportCommand> {
        let mut out = Vec::new();
        while let Ok(cmd) = self.commands.try_recv() {
            out.push(cmd);
        }
        out
    }
}

pub fn utterance(conversation_id: &str, role: &str, speech: &str) -> TransportEvent {
    TransportEvent::AppMessage {
        data: json!({
            "message_type": "conversation",
            "event_type": "conversation.utterance",
            "conversation_id": conversation_id,
            "properties": { "role": role, "speech": speech }
        }),
    }
}

pub fn app_message(event_type: &str) -> TransportEvent {
    TransportEvent::AppMessage {
        data: json!({
            "message_type": "conversation",
            "event_type": event_type,
        }),
    }
}
