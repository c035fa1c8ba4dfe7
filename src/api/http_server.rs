// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::detect::{detect_all_handler, detect_handler};
use crate::cache::CacheStats;
use crate::modes::{Language, ModeDescriptor};
use crate::orchestrator::Detector;
use crate::vision::image_utils::MAX_IMAGE_SIZE;

/// Request bodies carry base64 images plus a little JSON
const MAX_BODY_SIZE: usize = MAX_IMAGE_SIZE / 3 * 4 + 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<Detector>,
    /// Language used when a request does not name one
    pub default_language: Language,
}

impl AppState {
    pub fn new(detector: Arc<Detector>, default_language: Language) -> Self {
        Self {
            detector,
            default_language,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/modes", get(modes_handler))
        .route("/v1/detect", post(detect_handler))
        .route("/v1/detect/all", post(detect_all_handler))
        .route("/v1/cache/stats", get(cache_stats_handler))
        .route("/v1/cache", delete(clear_cache_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API until `shutdown` resolves
pub async fn serve(
    state: AppState,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn modes_handler(State(state): State<AppState>) -> Json<Vec<ModeDescriptor>> {
    Json(state.detector.available_modes())
}

async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.detector.cache_stats())
}

async fn clear_cache_handler(State(state): State<AppState>) -> impl IntoResponse {
    let cleared = state.detector.clear_cache();
    Json(json!({ "cleared": cleared }))
}
