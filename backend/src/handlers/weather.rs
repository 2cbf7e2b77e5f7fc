//! HTTP handlers for weather data endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use shared::models::{
    AirQualityReading, EnvironmentalReading, RegionalContext, StorageRecommendation,
    WeatherImpact,
};
use shared::types::GpsCoordinates;
use shared::validation::validate_coordinates;

use crate::error::{AppError, AppResult};
use crate::services::{recommendation, seasonal};
use crate::AppState;

const DEFAULT_FORECAST_DAYS: u32 = 5;
const MAX_FORECAST_DAYS: u32 = 5;

/// Query parameters for the weather data endpoint
#[derive(Debug, Deserialize)]
pub struct WeatherDataQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct WeatherDataResponse {
    pub current: EnvironmentalReading,
    pub forecast: Vec<EnvironmentalReading>,
    pub air_quality: AirQualityReading,
    pub impact: WeatherImpact,
    pub recommendations: Vec<StorageRecommendation>,
    pub regional_context: RegionalContext,
}

/// Weather data for a location: current conditions, daily forecast, air
/// quality, impact assessment, storage recommendations, and the regional
/// context used by the risk pipeline.
pub async fn get_weather_data(
    State(state): State<AppState>,
    Query(query): Query<WeatherDataQuery>,
) -> AppResult<Json<WeatherDataResponse>> {
    let coords = GpsCoordinates::new(query.latitude, query.longitude);
    validate_coordinates(&coords).map_err(|msg| AppError::Validation {
        field: "coordinates".to_string(),
        message: msg.to_string(),
    })?;

    let days = query
        .days
        .unwrap_or(DEFAULT_FORECAST_DAYS)
        .clamp(1, MAX_FORECAST_DAYS);

    let current = state
        .weather
        .fetch_current(query.latitude, query.longitude)
        .await;
    let forecast = state
        .weather
        .fetch_forecast(query.latitude, query.longitude, days)
        .await;
    let air_quality = state
        .weather
        .fetch_air_quality(query.latitude, query.longitude)
        .await;

    let max_precipitation = forecast
        .iter()
        .map(|r| r.precipitation_probability)
        .fold(current.precipitation_probability, f64::max);

    let regional_context = seasonal::classify_at(
        Utc::now(),
        query.latitude,
        query.longitude,
        max_precipitation,
    );
    let impact = recommendation::assess_impact(&current);
    let recommendations = recommendation::recommend(&forecast, &air_quality);

    Ok(Json(WeatherDataResponse {
        current,
        forecast,
        air_quality,
        impact,
        recommendations,
        regional_context,
    }))
}
