use axum::{
    extract::Extension,
    http::{header, Method},
    routing::get,
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod deadline;
mod error;
mod middleware;
mod models;
mod repositories;
mod routes;
mod services;
mod websocket;

pub use error::{ApiError, ApiResult, ErrorResponse};

use repositories::{
    InteractionRepository, InterestGraphRepository, ProfileRepository, TrackRepository,
};
use routes::{
    health_router, interactions_router, profile_router, recommendations_router, HealthState,
    InteractionState, ProfileState, RecommendationState,
};
use services::{
    InterestGraphService, ProfileEmbeddingService, RecommendationCache, RecommendationPipeline,
};
use websocket::{ws_handler, PushEngine, SessionRegistry};

/// Build the CORS layer based on configuration.
///
/// In production mode:
/// - If `CORS_ALLOWED_ORIGINS` is set, only those origins are allowed
/// - If `CORS_ALLOWED_ORIGINS` is not set, CORS requests are rejected
///
/// In development mode:
/// - If `CORS_ALLOWED_ORIGINS` is set, those origins are used
/// - If `CORS_ALLOWED_ORIGINS` is not set, permissive CORS is used
fn build_cors_layer(config: &config::Config) -> CorsLayer {
    let is_production = config.is_production();

    match &config.cors_allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let allowed_origins: Vec<_> = origins
                .iter()
                .filter_map(|origin| {
                    origin.parse().ok().or_else(|| {
                        tracing::warn!("Invalid CORS origin '{}', skipping", origin);
                        None
                    })
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::error!("No valid CORS origins configured, CORS requests will be rejected");
                CorsLayer::new()
            } else {
                tracing::info!(
                    "CORS configured with {} allowed origin(s): {:?}",
                    allowed_origins.len(),
                    origins
                );
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
                    .allow_credentials(true)
                    .max_age(std::time::Duration::from_secs(3600))
            }
        }
        _ if is_production => {
            tracing::warn!(
                "CORS_ALLOWED_ORIGINS not configured in production mode. \
                 CORS requests will be rejected."
            );
            CorsLayer::new()
        }
        _ => {
            tracing::warn!(
                "Using permissive CORS in development mode. \
                 Set CORS_ALLOWED_ORIGINS for production-like behavior."
            );
            CorsLayer::permissive()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting Cadence API server on port {}", config.port);

    // Initialize database pool
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database().max_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database().connect_timeout_secs,
        ))
        .connect(&config.database().url)
        .await?;
    tracing::info!("Database connection established");

    // Redis client; connections are established lazily per call and every
    // cache failure degrades to a miss, so startup does not gate on it.
    let redis_client = redis::Client::open(config.redis().connection_url())?;

    let recs_config = config.recommendation().clone();
    let request_timeout = config.request_timeout();

    // Repositories (store gateway)
    let profiles = ProfileRepository::new(pool.clone());
    let tracks = TrackRepository::new(pool.clone());
    let interactions = InteractionRepository::new(pool.clone());
    let graphs = InterestGraphRepository::new(pool.clone());

    // Services
    let cache = RecommendationCache::new(redis_client.clone(), recs_config.cache_ttl_secs);
    let interest_graph = InterestGraphService::new(interactions.clone(), graphs);
    let profile_embedding = ProfileEmbeddingService::new(profiles.clone());
    let pipeline = RecommendationPipeline::new(
        profiles.clone(),
        tracks,
        interactions,
        interest_graph,
        profile_embedding,
        cache.clone(),
        recs_config,
    );

    // Push channel
    let registry = SessionRegistry::new();
    let push = PushEngine::new(registry.clone(), pipeline.clone());

    tracing::info!("Recommendation pipeline initialized");

    // Build the CORS layer from configuration
    let cors_layer = build_cors_layer(&config);

    // Build the router
    let app = Router::new()
        .route("/", get(root))
        // Nested health routes: /health, /health/ready
        .nest("/health", health_router(HealthState::new(pool.clone(), cache)))
        .merge(profile_router(ProfileState::new(
            profiles,
            request_timeout,
        )))
        .merge(recommendations_router(RecommendationState::new(
            pipeline.clone(),
            request_timeout,
        )))
        .merge(interactions_router(InteractionState::new(
            pipeline,
            push.clone(),
            request_timeout,
        )))
        // Push channel
        .route("/recommendations/ws", get(ws_handler))
        .layer(Extension(registry))
        .layer(Extension(push))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn root() -> &'static str {
    "Cadence - personalized music recommendations"
}
