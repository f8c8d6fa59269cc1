mod config;
mod dataset;
mod errors;
mod features;
mod handlers;
mod model;
mod models;
mod scoring;
mod synthetic;
mod trainer;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - Conversion model initialization (load the persisted artifact, or run
///   bootstrap training when none exists).
/// - HTTP routes and middleware (CORS, Rate Limiting).
///
/// It then starts the Axum server.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_score_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Explicit model initialization: load-or-train, never a side effect of
    // first use. A corrupt artifact is fatal here by design.
    let model = trainer::load_or_train(&config)
        .map_err(|e| anyhow::anyhow!("model initialization failed: {}", e))?;
    tracing::info!(
        "Conversion model {} ready (held-out accuracy {:.2})",
        model.model_id,
        model.holdout_accuracy
    );

    // Build application state
    let app_state = Arc::new(handlers::AppState::new(config.clone(), Some(model)));

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        // Scoring endpoint
        .route("/api/v1/leads/score", post(handlers::score_lead))
        // Model lifecycle endpoints
        .route("/api/v1/model", get(handlers::model_info))
        .route("/api/v1/model/retrain", post(handlers::retrain_model))
        .layer(
            ServiceBuilder::new()
                // Request size limit: lead payloads are small
                .layer(RequestBodyLimitLayer::new(64 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
