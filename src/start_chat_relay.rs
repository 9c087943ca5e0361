//! Startup helpers for the chat relay binaries.

use std::process::ExitCode;
use std::sync::Arc;

use crate::chat::core::config::ChatConfig;
use crate::chat::core::errors::ChatResult;
use crate::chat::core::ids::SessionId;
use crate::server::{self, AppState};

/// Install the global `tracing` subscriber (`RUST_LOG`, plus `INFO`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}

/// Run the server (used by the `chat-relay-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();
    tracing::info!("Starting chat relay v{}", env!("CARGO_PKG_VERSION"));

    let config = match ChatConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(serve(&config)) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Initialize application state without starting the server.
///
/// # Errors
/// Returns an error if the configuration is invalid or a client cannot be built.
pub async fn initialize(config: &ChatConfig) -> ChatResult<Arc<AppState>> {
    tracing::info!(
        store = ?config.store.backend,
        container = %config.store.container,
        provider = ?config.llm.provider,
        "initializing chat relay"
    );

    AppState::new(config).await.inspect_err(|e| {
        tracing::error!("Failed to initialize the document store or completion client: {e}");
    })
}

/// Send one message through a fresh session and return the session and reply.
///
/// # Errors
/// Returns an error if initialization or the chat turn fails.
pub async fn ask_once(config: &ChatConfig, message: &str) -> ChatResult<(SessionId, String)> {
    let state = initialize(config).await?;
    let session_id = SessionId::generate();
    let reply = state.conversation.respond(&session_id, message).await?;
    Ok((session_id, reply))
}

async fn serve(config: &ChatConfig) -> ChatResult<()> {
    let state = initialize(config).await?;
    server::run_server_with_shutdown(state, config.server.port, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
