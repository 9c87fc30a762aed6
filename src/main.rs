use anyhow::{Context, Result};
use clap::Parser;
use replica_chat::{
    create_router, AppState, ChannelTransport, Config, ControllerOptions, ConversationApi,
    FeedbackClient, SessionController, TavusClient,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "replica-chat", version, about = "Replica conversation session service")]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/replica-chat")]
    config: String,

    /// Override the bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HTTP port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Replica Chat v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    if cfg.tavus.api_key.is_none() {
        warn!("TAVUS_API_KEY is not set; conversation calls will fail");
    }
    if cfg.feedback.webhook_url.is_none() {
        warn!("FEEDBACK_WEBHOOK_URL is not set; feedback submission will fail");
    }

    let api: Arc<dyn ConversationApi> = Arc::new(TavusClient::new(cfg.tavus.clone()));
    let feedback = Arc::new(FeedbackClient::new(cfg.feedback.webhook_url.clone()));

    let (transport, commands) = ChannelTransport::new();
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    let controller = Arc::new(SessionController::new(
        Arc::clone(&api),
        Arc::new(transport),
        Arc::clone(&feedback),
        ControllerOptions {
            create_timeout: cfg.session.create_timeout_secs.map(Duration::from_secs),
        },
    ));
    controller.spawn_event_pump(events_rx);

    let state = AppState::new(controller, api, feedback, commands, events_tx);
    let app = create_router(state);

    let bind = args.bind.unwrap_or(cfg.service.http.bind);
    let port = args.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", bind, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
