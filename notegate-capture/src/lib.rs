//! notegate-capture library - message capture service
//!
//! Routes inbound chat messages into typed category stores, either through
//! an explicit reference prefix or through the classification oracle behind
//! a confidence gate, and keeps the append-only audit log that the
//! clarification and fix flows resolve against.

use std::sync::Arc;

use axum::Router;
use notegate_common::events::EventBus;
use sqlx::SqlitePool;

use crate::config::CaptureConfig;
use crate::services::{Classifier, Transport};

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod maintenance;
pub mod services;

/// Application state shared across HTTP handlers and the ingest pipeline
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Service configuration (thresholds, endpoints, sweep intervals)
    pub config: Arc<CaptureConfig>,
    /// Broadcast bus for capture events
    pub event_bus: Arc<EventBus>,
    /// Classification oracle adapter
    pub classifier: Arc<dyn Classifier>,
    /// Outbound chat gateway
    pub transport: Arc<dyn Transport>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        db: SqlitePool,
        config: CaptureConfig,
        classifier: Arc<dyn Classifier>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            event_bus: Arc::new(EventBus::new(256)),
            classifier,
            transport,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use tower_http::trace::TraceLayer;

    Router::new()
        .merge(api::health::routes())
        .merge(api::inbound::routes())
        .merge(api::review::routes())
        .merge(api::sse::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
