//! Route definitions for the GrainHero storage risk platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Sensor and weather endpoints
        .nest("/sensors", sensor_routes())
        // Admin dashboard endpoints
        .nest("/dashboard", dashboard_routes())
        // Batch risk endpoints
        .nest("/batches", batch_routes())
}

/// Sensor and weather routes
fn sensor_routes() -> Router<AppState> {
    Router::new()
        .route("/weather-data", get(handlers::get_weather_data))
        .route("/ai-weather-sync", post(handlers::ai_weather_sync))
}

/// Admin dashboard routes
fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/admin/system-override", post(handlers::system_override))
}

/// Batch risk routes
fn batch_routes() -> Router<AppState> {
    Router::new().route("/:batch_id/risk", get(handlers::get_batch_risk))
}
