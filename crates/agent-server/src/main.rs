//! rust-agent HTTP Server
//!
//! Axum-based server exposing the agent catalog, the provider table and
//! chat endpoints (REST and WebSocket) over registry-built agents.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_registry::{AgentLoader, CredentialStore, Environment, LoaderConfig};
use agent_runtime::DefaultRuntime;

use crate::config::ServerConfig;
use crate::handlers::{chat_handler, chat_stream_handler, health_check, list_agents, list_providers};
use crate::state::AppState;

fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/agents", get(list_agents))
        .route("/api/providers", get(list_providers))
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/stream", get(chat_stream_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Process env plus .env; the runtime never reads the real env after this
    let env = Environment::from_process();
    let config = ServerConfig::from_env(&env);
    let loader_config = LoaderConfig::from_env(&env);
    let store = Arc::new(CredentialStore::new(env));

    let runtime = Arc::new(DefaultRuntime::new(config.runtime.clone()));
    let loader = AgentLoader::with_builtins(store, runtime, loader_config)?;

    tracing::info!("Registered {} agents:", loader.registry().len());
    for (ordinal, info) in loader.registry().catalog() {
        tracing::info!("  {}. {} ({}) - {}", ordinal, info.name, info.id, info.description);
    }
    tracing::info!("Model provider: {}", loader.selected_provider());

    let state = AppState {
        loader: Arc::new(loader),
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 rust-agent server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health          - Health check");
    tracing::info!("  GET  /api/agents      - Agent catalog");
    tracing::info!("  GET  /api/providers   - Model providers");
    tracing::info!("  POST /api/chat        - Send message");
    tracing::info!("  GET  /api/chat/stream - WebSocket streaming");

    axum::serve(listener, app(state)).await?;

    Ok(())
}
