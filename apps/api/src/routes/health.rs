//! Health check HTTP route handlers
//!
//! - `GET /health` - Simple liveness check
//! - `GET /health/ready` - Readiness check (verifies store and cache)

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use sqlx::PgPool;

use crate::services::RecommendationCache;

/// Shared state for health check handlers
#[derive(Clone)]
pub struct HealthState {
    pub pool: PgPool,
    pub cache: RecommendationCache,
}

impl HealthState {
    pub fn new(pool: PgPool, cache: RecommendationCache) -> Self {
        Self { pool, cache }
    }
}

#[derive(Debug, Serialize)]
struct ReadinessResponse {
    status: &'static str,
    store: &'static str,
    cache: &'static str,
}

/// Create health check router
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/ready", get(readiness))
        .with_state(state)
}

/// Liveness check - returns ok if the process is serving requests
async fn liveness() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Readiness check - verifies connectivity to the store and the cache
async fn readiness(State(state): State<HealthState>) -> impl IntoResponse {
    let store_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .is_ok();
    let cache_ok = state.cache.ping().await.is_ok();

    let response = ReadinessResponse {
        status: if store_ok && cache_ok { "ok" } else { "degraded" },
        store: if store_ok { "up" } else { "down" },
        cache: if cache_ok { "up" } else { "down" },
    };

    let status_code = if store_ok && cache_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
