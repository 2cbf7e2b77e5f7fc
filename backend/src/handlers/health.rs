//! Health and readiness reporting
//!
//! Beyond liveness, the payload surfaces the operational facts that matter
//! when diagnosing this service: whether risk adjustments are running
//! against live weather or the synthetic generator, and which policy knobs
//! the reconciliation engine is applying.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub database: &'static str,
    /// "live" or "synthetic"
    pub weather_source: &'static str,
    pub risk_policy: RiskPolicySummary,
}

#[derive(Serialize)]
pub struct RiskPolicySummary {
    pub min_change_delta: f64,
    pub automated_confidence: f64,
    pub override_confidence: f64,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        database,
        weather_source: state.weather.source_name(),
        risk_policy: RiskPolicySummary {
            min_change_delta: state.config.risk.min_change_delta,
            automated_confidence: state.config.risk.automated_confidence,
            override_confidence: state.config.risk.override_confidence,
        },
    })
}
