//! harbor-migrate library interface
//!
//! Migrates a yacht listing from an external source URL into the canonical
//! record: classify the source, extract raw fields, map and normalize them,
//! score completeness, fill gaps from the model knowledge base or schema
//! defaults, and re-host the listing images.

pub mod adapters;
pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod fallback;
pub mod images;
pub mod knowledge_base;
pub mod mapping;
pub mod models;
pub mod record;
pub mod scoring;
pub mod services;
pub mod types;

pub use crate::error::{ApiError, ApiResult};
pub use crate::services::MigrationOrchestrator;

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Read-only pipeline shared by all requests
    pub orchestrator: Arc<MigrationOrchestrator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last migration failure for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(orchestrator: MigrationOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::migrate_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
