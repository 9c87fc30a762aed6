use chrono::Utc;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::ConversationConfig;
use super::guard::{StoreRollback, Trigger};
use super::stats::SessionSnapshot;
use super::store::{Session, SessionStatus, SessionStore};
use crate::error::{Result, SessionError};
use crate::feedback::{FeedbackClient, FeedbackRequest, Resolution};
use crate::tavus::{AppMessage, AppMessageKind, AppendContextMessage, ConversationApi};
use crate::transcript::{Message, Transcript, TranscriptAggregator};
use crate::transport::{InputSettings, JoinOptions, Transport, TransportEvent, TransportEvents};

/// Tunables for the session controller
#[derive(Debug, Clone, Default)]
pub struct ControllerOptions {
    /// Fail a create call that takes longer than this
    pub create_timeout: Option<Duration>,
}

/// Drives one conversation at a time: remote create/end calls, transport
/// join/leave, and transcript assembly from transport events.
pub struct SessionController {
    inner: Arc<Inner>,

    /// Task feeding transport events into `handle_event`
    event_task: StdMutex<Option<JoinHandle<()>>>,
}

struct Inner {
    api: Arc<dyn ConversationApi>,
    transport: Arc<dyn Transport>,
    feedback: Arc<FeedbackClient>,
    options: ControllerOptions,

    store: Arc<RwLock<SessionStore>>,
    transcript: Mutex<TranscriptAggregator>,

    /// Call options captured from the last create
    join_options: Mutex<JoinOptions>,

    create_trigger: Trigger,
    end_trigger: Trigger,
    feedback_trigger: Trigger,
}

impl SessionController {
    pub fn new(
        api: Arc<dyn ConversationApi>,
        transport: Arc<dyn Transport>,
        feedback: Arc<FeedbackClient>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                transport,
                feedback,
                options,
                store: Arc::new(RwLock::new(SessionStore::new())),
                transcript: Mutex::new(TranscriptAggregator::new()),
                join_options: Mutex::new(ConversationConfig::default().join_options()),
                create_trigger: Trigger::new("create"),
                end_trigger: Trigger::new("end"),
                feedback_trigger: Trigger::new("feedback submission"),
            }),
            event_task: StdMutex::new(None),
        }
    }

    /// Create a conversation on the remote API
    ///
    /// The transcript is cleared when the new session is stored. A second
    /// call while one is outstanding, or while a session is live, fails
    /// with [`SessionError::Busy`] without contacting the API.
    pub async fn create(&self, config: ConversationConfig) -> Result<Session> {
        let inner = &self.inner;
        let _in_flight = inner.create_trigger.acquire()?;

        inner.store.write().await.begin_create()?;
        let rollback = StoreRollback::new(&inner.store, SessionStore::cancel_create);

        info!("Creating conversation");

        let pending = inner.api.create_conversation(&config);
        let result = match inner.options.create_timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .unwrap_or(Err(SessionError::Timeout(limit))),
            None => pending.await,
        };

        match result {
            Ok(conversation) => {
                inner.transcript.lock().await.clear();
                *inner.join_options.lock().await = config.join_options();

                let session = Session::from_conversation(&conversation);
                let mut store = inner.store.write().await;
                let session = store.complete_create(session).clone();
                rollback.disarm();

                info!("Conversation {} created ({})", session.id, session.join_url);
                Ok(session)
            }
            Err(e) => {
                error!("Failed to create conversation: {}", e);
                inner.store.write().await.fail_create(&e);
                rollback.disarm();
                Err(e)
            }
        }
    }

    /// Ask the transport to join the session's call
    ///
    /// The session becomes active once the transport reports `joined`.
    pub async fn join(&self, session: &Session) -> Result<()> {
        let inner = &self.inner;

        {
            let store = inner.store.read().await;
            match store.session() {
                Some(current) if current.id == session.id => {}
                _ => return Err(SessionError::NoSession),
            }
        }

        let options = inner.join_options.lock().await.clone();
        info!("Joining call for {} at {}", session.id, session.join_url);

        if let Err(e) = inner.transport.join(&session.join_url, &options).await {
            let message = transport_message(e);
            error!("Failed to join call: {}", message);
            inner.store.write().await.join_failed(message.clone());
            return Err(SessionError::Transport(message));
        }

        Ok(())
    }

    /// Create a conversation and join its call
    pub async fn start(&self, config: ConversationConfig) -> Result<Session> {
        let session = self.create(config).await?;
        self.join(&session).await?;
        Ok(session)
    }

    /// Push one line of context to the replica; failures are only logged
    pub async fn append_context(&self, text: impl Into<String>) {
        self.inner.append_context(text.into()).await;
    }

    /// End the conversation remotely, then leave the call
    ///
    /// Local teardown always runs; a failed remote end call is returned
    /// after the session has moved to `ended`.
    pub async fn end(&self) -> Result<()> {
        self.inner.finish(true).await
    }

    /// Single entry point for transport events
    pub async fn handle_event(&self, event: TransportEvent) {
        self.inner.handle_event(event).await;
    }

    /// Feed events from `events` into [`handle_event`](Self::handle_event)
    /// until the sender side closes
    pub fn spawn_event_pump(&self, mut events: TransportEvents) {
        let inner = Arc::downgrade(&self.inner);

        let task = tokio::spawn(async move {
            info!("Transport event pump started");

            while let Some(event) = events.recv().await {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                inner.handle_event(event).await;
            }

            info!("Transport event pump stopped");
        });

        let mut slot = self.event_task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
    }

    pub async fn set_local_audio(&self, enabled: bool) -> Result<()> {
        self.inner.require_live().await?;
        self.inner
            .transport
            .set_local_audio(enabled)
            .await
            .map_err(|e| SessionError::Transport(transport_message(e)))
    }

    pub async fn set_local_video(&self, enabled: bool) -> Result<()> {
        self.inner.require_live().await?;
        self.inner
            .transport
            .set_local_video(enabled)
            .await
            .map_err(|e| SessionError::Transport(transport_message(e)))
    }

    pub async fn start_recording(&self) -> Result<()> {
        self.inner.require_live().await?;
        self.inner
            .transport
            .start_recording()
            .await
            .map_err(|e| SessionError::Transport(transport_message(e)))
    }

    pub async fn stop_recording(&self) -> Result<()> {
        self.inner.require_live().await?;
        self.inner
            .transport
            .stop_recording()
            .await
            .map_err(|e| SessionError::Transport(transport_message(e)))
    }

    /// Send feedback for the current session with its transcript
    ///
    /// Only an ended session takes feedback; on success it is reset to
    /// `none`. A live session, a missing `resolved` or a missing session
    /// never reaches the webhook.
    pub async fn submit_feedback(
        &self,
        resolved: Option<Resolution>,
        comment: Option<String>,
        contact: Option<String>,
    ) -> Result<serde_json::Value> {
        let inner = &self.inner;
        let _in_flight = inner.feedback_trigger.acquire()?;

        let session_id = {
            let store = inner.store.read().await;
            match store.status() {
                SessionStatus::None | SessionStatus::Ended => {}
                from => {
                    return Err(SessionError::InvalidTransition {
                        from,
                        to: SessionStatus::None,
                    })
                }
            }
            store.session().map(|s| s.id.clone())
        };
        let transcript = inner.transcript.lock().await.to_transcript();

        let request = FeedbackRequest {
            resolved,
            session_id: session_id.clone(),
            comment,
            contact,
            transcript: Some(transcript),
        };

        let receipt = inner.feedback.submit(request).await?;

        if let Some(id) = session_id.as_deref() {
            if inner.store.write().await.feedback_delivered(id) {
                info!("Feedback submitted; session reset");
            } else {
                info!("Feedback submitted for {}; a newer session is kept", id);
            }
        }
        Ok(receipt)
    }

    /// Forget the current session
    ///
    /// A live call is ended first. Refused while a create or end call is
    /// still outstanding.
    pub async fn reset(&self) -> Result<()> {
        let (status, has_session) = {
            let store = self.inner.store.read().await;
            (store.status(), store.session().is_some())
        };

        match status {
            SessionStatus::Creating if !has_session => return Err(SessionError::Busy("create")),
            SessionStatus::Ending => return Err(SessionError::Busy("end")),
            SessionStatus::Creating | SessionStatus::Active => {
                info!("Ending live session before reset");
                match self.inner.finish(true).await {
                    Ok(()) | Err(SessionError::NoSession) => {}
                    Err(e @ SessionError::Busy(_)) => return Err(e),
                    Err(e) => warn!("End before reset failed, resetting anyway: {}", e),
                }
            }
            SessionStatus::None | SessionStatus::Ended => {}
        }

        self.inner.store.write().await.reset();
        info!("Session reset");
        Ok(())
    }

    pub async fn status(&self) -> SessionStatus {
        self.inner.store.read().await.status()
    }

    pub async fn session(&self) -> Option<Session> {
        self.inner.store.read().await.session().cloned()
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.inner.transcript.lock().await.messages().to_vec()
    }

    pub async fn transcript(&self) -> Transcript {
        self.inner.transcript.lock().await.to_transcript()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let message_count = self.inner.transcript.lock().await.len();
        let store = self.inner.store.read().await;

        let duration_secs = store.session().map(|s| {
            Utc::now()
                .signed_duration_since(s.created_at)
                .num_milliseconds() as f64
                / 1000.0
        });

        SessionSnapshot {
            status: store.status(),
            session: store.session().cloned(),
            speaking: store.speaking(),
            last_error: store.last_error().map(String::from),
            message_count,
            duration_secs,
        }
    }
}

impl Inner {
    async fn require_live(&self) -> Result<()> {
        match self.store.read().await.status() {
            SessionStatus::Creating | SessionStatus::Active => Ok(()),
            _ => Err(SessionError::NoSession),
        }
    }

    async fn append_context(&self, context: String) {
        let conversation_id = match self.store.read().await.session() {
            Some(session) => session.id.clone(),
            None => {
                debug!("No session; not appending context");
                return;
            }
        };

        let message = match serde_json::to_value(AppendContextMessage::new(
            conversation_id,
            context.clone(),
        )) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to encode context message: {}", e);
                return;
            }
        };

        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            match transport.send_app_message(message).await {
                Ok(()) => debug!("Appended conversation context: {}", context),
                Err(e) => warn!("Failed to append conversation context: {}", e),
            }
        });
    }

    /// End flow shared by `end()` and the transport's `left` event
    ///
    /// Teardown runs on its own task so it completes even if the caller
    /// stops waiting.
    async fn finish(&self, leave_transport: bool) -> Result<()> {
        let in_flight = self.end_trigger.acquire()?;
        let session = self.store.write().await.begin_end()?;

        let api = Arc::clone(&self.api);
        let transport = Arc::clone(&self.transport);
        let store = Arc::clone(&self.store);

        let teardown = tokio::spawn(async move {
            let _in_flight = in_flight;
            info!("Ending conversation {}", session.id);

            let remote = api.end_conversation(&session.id).await;
            if let Err(e) = &remote {
                warn!(
                    "Remote end for {} failed, continuing teardown: {}",
                    session.id, e
                );
            }

            if leave_transport {
                if let Err(e) = transport.leave().await {
                    let message = transport_message(e);
                    warn!("Failed to leave call: {}", message);
                    store.write().await.record_error(message);
                }
            }

            store.write().await.mark_ended();
            info!("Conversation {} ended", session.id);

            remote
        });

        teardown
            .await
            .unwrap_or_else(|e| Err(SessionError::Transport(format!("teardown task failed: {}", e))))
    }

    async fn handle_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Joined => {
                let joined = self.store.write().await.mark_joined();
                if joined {
                    info!("Joined call");
                    self.enable_noise_cancellation().await;
                } else {
                    debug!("Ignoring joined event (no pending session)");
                }
            }
            TransportEvent::Left => {
                let status = self.store.read().await.status();
                match status {
                    SessionStatus::Creating | SessionStatus::Active => {
                        info!("Left call; ending conversation");
                        if let Err(e) = self.finish(false).await {
                            warn!("End after leaving call failed: {}", e);
                        }
                    }
                    _ => debug!("Ignoring left event in state {}", status),
                }
            }
            TransportEvent::Error { message } => {
                error!("Transport error: {}", message);
                let mut store = self.store.write().await;
                let joining = store.status() == SessionStatus::Creating && store.session().is_some();
                if joining {
                    store.join_failed(message);
                } else {
                    store.record_error(message);
                }
            }
            TransportEvent::AppMessage { data } => self.handle_app_message(data).await,
            TransportEvent::TranscriptionStarted => info!("Transcription started"),
            TransportEvent::TranscriptionStopped => info!("Transcription stopped"),
            TransportEvent::TranscriptionError { message } => {
                warn!("Transcription error: {}", message)
            }
            TransportEvent::TranscriptionMessage {
                text,
                participant_id,
                is_final,
            } => {
                let speaker = participant_id.as_deref().unwrap_or("unknown");
                if is_final {
                    info!("Final transcript [{}]: {}", speaker, text);
                } else {
                    debug!("Transcript [{}]: {}", speaker, text);
                }
            }
        }
    }

    async fn enable_noise_cancellation(&self) {
        if !self.join_options.lock().await.noise_cancellation {
            return;
        }

        match self
            .transport
            .update_input_settings(InputSettings::noise_cancellation())
            .await
        {
            Ok(()) => info!("Noise cancellation enabled"),
            Err(e) => warn!("Failed to enable noise cancellation: {}", e),
        }
    }

    async fn handle_app_message(&self, data: serde_json::Value) {
        let message: AppMessage = match serde_json::from_value(data) {
            Ok(message) => message,
            Err(e) => {
                debug!("Ignoring malformed app-message: {}", e);
                return;
            }
        };

        match message.classify() {
            AppMessageKind::Utterance(event) => {
                let session_id = match self.store.read().await.session() {
                    Some(session) => session.id.clone(),
                    None => {
                        debug!("Dropping utterance received without a session");
                        return;
                    }
                };

                if let Some(id) = event.conversation_id.as_deref() {
                    if id != session_id {
                        debug!("Dropping utterance for conversation {}", id);
                        return;
                    }
                }

                let appended = self.transcript.lock().await.on_utterance_event(&event).cloned();
                if let Some(message) = appended {
                    debug!("Aggregated {} message {}", message.role, message.id);
                    self.append_context(message.context_line()).await;
                }
            }
            AppMessageKind::ReplicaStartedSpeaking => {
                self.store.write().await.set_replica_speaking(true)
            }
            AppMessageKind::ReplicaStoppedSpeaking => {
                self.store.write().await.set_replica_speaking(false)
            }
            AppMessageKind::UserStartedSpeaking => self.store.write().await.set_user_speaking(true),
            AppMessageKind::UserStoppedSpeaking => {
                self.store.write().await.set_user_speaking(false)
            }
            AppMessageKind::ReplicaJoined => info!("Replica joined the conversation"),
            AppMessageKind::Other => debug!("Ignoring app-message"),
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(task) = self
            .event_task
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }

        let live = self
            .inner
            .store
            .try_read()
            .map(|store| {
                matches!(
                    store.status(),
                    SessionStatus::Creating | SessionStatus::Active
                )
            })
            .unwrap_or(false);

        if !live {
            return;
        }

        // Leave the call even when the owner goes away without ending it
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let transport = Arc::clone(&self.inner.transport);
                handle.spawn(async move {
                    if let Err(e) = transport.leave().await {
                        warn!("Failed to leave call on shutdown: {}", e);
                    }
                });
            }
            Err(_) => warn!("No runtime available; call left open on shutdown"),
        }
    }
}

fn transport_message(err: SessionError) -> String {
    match err {
        SessionError::Transport(message) => message,
        other => other.to_string(),
    }
}
