mod auth;
mod config;
mod errors;
mod generation;
mod history;
mod llm_client;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::networks::NetworkProfileTable;
use crate::generation::pipeline::GenerationPipeline;
use crate::history::RedisPostStore;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting PostGen API v{}", env!("CARGO_PKG_VERSION"));

    // Network profiles: built-in defaults, optionally extended from a JSON file
    let profiles = load_profiles(&config).await?;
    info!(
        "Network profiles loaded: {}",
        profiles.known_identifiers().collect::<Vec<_>>().join(", ")
    );

    // Initialize LLM client
    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    )?;
    info!(
        "LLM client initialized (model: {}, timeout: {}s)",
        llm_client::MODEL,
        config.llm_timeout_secs
    );

    // Initialize Redis-backed history
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    let state = AppState {
        pipeline: GenerationPipeline::new(Arc::new(llm), Arc::new(profiles)),
        store: Arc::new(RedisPostStore::new(redis)),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn load_profiles(config: &Config) -> Result<NetworkProfileTable> {
    let table = NetworkProfileTable::default();
    match &config.network_profiles_path {
        Some(path) => table.extend_from_file(path).await,
        None => Ok(table),
    }
}
