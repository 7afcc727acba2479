use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::{info, warn};

use autofit::config::{Config, ModelEndpoint};
use autofit::handlers::router;
use autofit::llm::GeminiGateway;
use autofit::state::AppState;
use autofit::utils::http::build_http_client;
use autofit::utils::logging::init_logging;

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Config::load()?;
    let _guards = init_logging(&config.log_level, &config.log_dir);

    match &config.model_endpoint {
        ModelEndpoint::Vertex {
            project,
            location,
            image_location,
            ..
        } => info!(
            "Model endpoint: Vertex AI project={} location={} image_location={}",
            project, location, image_location
        ),
        ModelEndpoint::GenerativeLanguage { .. } => {
            info!("Model endpoint: Generative Language API")
        }
        ModelEndpoint::Unconfigured { reason } => {
            warn!("Model endpoint unavailable, AI calls will fail: {}", reason)
        }
    }

    let http = build_http_client(&config).context("failed to build HTTP client")?;
    let gateway = GeminiGateway::new(&config, http);
    let bind_address = config.bind_address;
    let state = AppState::new(Arc::new(config), Arc::new(gateway));

    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    info!("Starting AutoFit API on {}", bind_address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
