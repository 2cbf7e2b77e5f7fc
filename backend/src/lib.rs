//! GrainHero Storage Risk Platform - Backend
//!
//! Ingests weather and air-quality signals for silo locations, derives a
//! composite risk multiplier, and reconciles it against each grain batch's
//! stored spoilage risk score.

use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;

pub use config::Config;

use external::WeatherProvider;
use services::{PgStore, RiskEngine};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub weather: Arc<WeatherProvider>,
    pub engine: Arc<RiskEngine<PgStore>>,
}

impl AppState {
    pub fn new(config: Config, db: PgPool) -> Self {
        let weather = Arc::new(WeatherProvider::from_config(&config.weather));
        let store = Arc::new(PgStore::new(db.clone()));
        let engine = Arc::new(RiskEngine::new(store, config.risk.clone()));
        Self {
            db,
            config: Arc::new(config),
            weather,
            engine,
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
