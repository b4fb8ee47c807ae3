mod config;
mod errors;
mod generation;
mod llm_client;
mod models;
mod observability;
mod routes;
mod state;
mod validation;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::pipeline::Pipeline;
use crate::llm_client::OpenAiClient;
use crate::observability::MetricsRecorder;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={},metrics={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Maker API v{}", env!("CARGO_PKG_VERSION"));

    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; generation requests will fail until it is configured");
    }

    // Initialize LLM client
    let llm = OpenAiClient::new(config.provider())?;
    info!("LLM client initialized (model: {})", llm.model());

    // Initialize metrics recorder
    let metrics = MetricsRecorder::init();

    let pipeline_config = config.pipeline();
    info!(
        "Pipeline configured: request timeout {}s, {} attempts per call",
        pipeline_config.request_timeout.as_secs(),
        pipeline_config.retry.max_attempts
    );
    let pipeline = Pipeline::new(pipeline_config, Arc::new(llm), metrics.clone());

    // Build app state
    let state = AppState {
        pipeline: Arc::new(pipeline),
        metrics,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
