//! booktrack-server library interface
//!
//! Exposes the router, state and services for the binary and for
//! integration tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult, LibraryError};

use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::IdentityProvider;
use crate::services::{
    CompletionProvider, CoverProvider, CoverService, IngestionPipeline, OcrProvider,
};

/// Uniform `{success, data?, error?}` response envelope
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    pub identity: Arc<dyn IdentityProvider>,
    pub pipeline: IngestionPipeline,
    pub completion: Arc<dyn CompletionProvider>,
    pub covers: CoverService,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        identity: Arc<dyn IdentityProvider>,
        ocr: Arc<dyn OcrProvider>,
        completion: Arc<dyn CompletionProvider>,
        cover_provider: Arc<dyn CoverProvider>,
    ) -> Self {
        let covers = CoverService::new(db.clone(), cover_provider);
        let pipeline =
            IngestionPipeline::new(db.clone(), ocr, Arc::clone(&completion), covers.clone());

        Self {
            db,
            identity,
            pipeline,
            completion,
            covers,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::ingest_routes())
        .merge(api::cover_routes())
        .merge(api::book_routes())
        .merge(api::bookshelf_routes())
        .merge(api::analytics_routes())
        .merge(api::recommendation_routes())
        .merge(api::webhook_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
