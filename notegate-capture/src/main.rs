//! notegate-capture - Main entry point
//!
//! Single-user message capture service. Receives chat messages from the
//! gateway webhook, files them into typed category stores (directly for
//! reference prefixes, through the classification oracle and confidence
//! gate otherwise), and serves the review and event endpoints.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notegate_capture::config::{CaptureConfig, ConfigOverrides};
use notegate_capture::services::{HttpClassifier, HttpGateway};
use notegate_capture::{build_router, maintenance, AppState};

/// Command-line arguments for notegate-capture
#[derive(Parser, Debug)]
#[command(name = "notegate-capture")]
#[command(about = "Chat message capture service")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "NOTEGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "NOTEGATE_PORT")]
    port: Option<u16>,

    /// Database file path (overrides config)
    #[arg(short, long, env = "NOTEGATE_DATABASE")]
    database: Option<PathBuf>,

    /// Chat gateway base URL (overrides config)
    #[arg(long, env = "NOTEGATE_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Classification oracle base URL (overrides config)
    #[arg(long, env = "NOTEGATE_CLASSIFIER_URL")]
    classifier_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config loads before tracing so the log level can come from the file
    let mut config = CaptureConfig::load(args.config.as_deref())?;
    config.apply_overrides(ConfigOverrides {
        port: args.port,
        database_path: args.database,
        gateway_url: args.gateway_url,
        classifier_url: args.classifier_url,
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("notegate_capture={},tower_http=info", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting notegate-capture v{}", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", config.database_path.display());

    let db = notegate_common::db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    info!("Gateway: {}", config.gateway.base_url);
    info!("Classifier: {}", config.classifier.base_url);

    let classifier = Arc::new(HttpClassifier::new(&config.classifier));
    let transport = Arc::new(HttpGateway::new(&config.gateway));

    let port = config.port;
    let state = AppState::new(db, config, classifier, transport);

    maintenance::spawn_stale_clarification_sweeper(state.clone());

    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
