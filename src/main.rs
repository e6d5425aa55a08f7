mod analytics;
mod auth;
mod config;
mod db;
mod errors;
mod handlers;
mod ingest;
mod models;
mod profile;
mod repository;
mod scoring;

use axum::{
    routing::{delete, get, post, put},
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
use crate::db::Database;
use crate::scoring::ScoringClient;

/// Main entry point.
///
/// Initializes tracing, configuration, the database pool and schema, the
/// prediction-service client, then serves the HTTP API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartconvert_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Initialize database connection pool and schema
    let db = Database::new(&config.database_url).await?;
    db::init_schema(&db.pool).await?;
    tracing::info!("Database connection pool established");

    // Prediction service client (circuit-broken)
    let scoring = ScoringClient::new(&config);
    tracing::info!("Prediction service client initialized: {}", config.scoring_base_url);

    let port = config.port;
    let app_state = Arc::new(handlers::AppState {
        db: db.pool.clone(),
        config,
        scoring,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    let api_routes = Router::new()
        // Auth
        .route("/api/v1/register", post(handlers::register))
        .route("/api/v1/login", post(handlers::login))
        // Ingestion
        .route("/api/v1/upload-csv", post(handlers::upload_csv))
        // Leads
        .route("/api/v1/leads", get(handlers::list_leads))
        .route("/api/v1/leads/all", delete(handlers::delete_all_leads))
        .route("/api/v1/leads/bulk-delete", post(handlers::bulk_delete_leads))
        .route("/api/v1/leads/bulk-status", put(handlers::bulk_update_status))
        .route("/api/v1/leads/:id", get(handlers::get_lead))
        .route("/api/v1/leads/:id/notes", put(handlers::update_lead_notes))
        // Dashboard
        .route("/api/v1/dashboard/stats", get(handlers::dashboard_stats))
        // User profile
        .route("/api/v1/user/profile", get(handlers::get_user_profile))
        .route("/api/v1/user/profile", put(handlers::update_user_profile))
        // Prediction service pass-throughs
        .route("/api/v1/ai/simulate", post(handlers::simulate))
        .route("/api/v1/ai/insights", get(handlers::insights))
        .layer(
            ServiceBuilder::new()
                // Request size limit: 5MB max payload
                .layer(RequestBodyLimitLayer::new(5 * 1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Health check bypasses the rate limiter
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(api_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
