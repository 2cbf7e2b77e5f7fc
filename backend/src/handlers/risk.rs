//! HTTP handlers for risk reconciliation endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::models::{
    EnvironmentalReading, GrainBatchRiskState, RiskAdjustmentAuditEntry, WeatherCondition,
};
use shared::types::RiskLevel;

use crate::error::{AppError, AppResult};
use crate::services::{AuditLog, BatchStore, BatchOutcome, SweepReport};
use crate::AppState;

/// Externally supplied weather reading for a sync request
#[derive(Debug, Deserialize, Validate)]
pub struct WeatherDataInput {
    pub temperature: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub humidity: f64,
    pub pressure: f64,
    #[serde(default)]
    pub wind_speed: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    #[serde(default)]
    pub precipitation_probability: f64,
    #[serde(default = "default_condition")]
    pub weather_condition: WeatherCondition,
}

fn default_condition() -> WeatherCondition {
    WeatherCondition::PartlyCloudy
}

impl WeatherDataInput {
    fn into_reading(self) -> EnvironmentalReading {
        EnvironmentalReading {
            timestamp: Utc::now(),
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
            wind_speed: self.wind_speed,
            precipitation_probability: self.precipitation_probability,
            weather_condition: self.weather_condition,
        }
    }
}

/// Request body for the weather sync endpoint
#[derive(Debug, Deserialize, Validate)]
pub struct AiWeatherSyncInput {
    pub silo_id: Uuid,
    #[validate]
    pub weather_data: Option<WeatherDataInput>,
}

/// Sweep all batches in a silo through the risk adjustment pipeline.
///
/// The external reading comes from the request when supplied, otherwise it
/// is fetched for the silo's coordinates.
pub async fn ai_weather_sync(
    State(state): State<AppState>,
    Json(input): Json<AiWeatherSyncInput>,
) -> AppResult<Json<SweepReport>> {
    input.validate().map_err(|e| AppError::Validation {
        field: "weather_data".to_string(),
        message: e.to_string(),
    })?;

    let environment = match input.weather_data {
        Some(data) => data.into_reading(),
        None => {
            let silo = state
                .engine
                .store()
                .find_silo(input.silo_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Silo {}", input.silo_id)))?;
            state
                .weather
                .fetch_current(silo.latitude, silo.longitude)
                .await
        }
    };

    let report = state
        .engine
        .sweep_silo(input.silo_id, &environment, Utc::now())
        .await?;

    Ok(Json(report))
}

/// Request body for the admin system override endpoint
#[derive(Debug, Deserialize)]
pub struct SystemOverrideInput {
    pub override_type: String,
    pub target_id: Uuid,
    pub override_value: f64,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SystemOverrideResponse {
    pub batch_id: Uuid,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

/// Apply an administrative override to a batch's risk score.
///
/// Bypasses the automated pipeline entirely; the change is committed
/// unconditionally and audited as a manual override.
pub async fn system_override(
    State(state): State<AppState>,
    Json(input): Json<SystemOverrideInput>,
) -> AppResult<Json<SystemOverrideResponse>> {
    if input.override_type != "risk_score" {
        return Err(AppError::Validation {
            field: "override_type".to_string(),
            message: format!("Unsupported override type: {}", input.override_type),
        });
    }

    let outcome = state
        .engine
        .override_risk(input.target_id, input.override_value, Utc::now())
        .await?;

    if let Some(reason) = &input.reason {
        tracing::info!(
            "Override on batch {} requested with reason: {}",
            input.target_id,
            reason
        );
    }

    Ok(Json(SystemOverrideResponse {
        batch_id: input.target_id,
        outcome,
    }))
}

#[derive(Debug, Serialize)]
pub struct BatchRiskResponse {
    pub batch: GrainBatchRiskState,
    pub risk_level: RiskLevel,
    /// High and critical bands need operator action
    pub requires_action: bool,
    /// Critical band triggers alert notifications
    pub requires_alert: bool,
    pub history: Vec<RiskAdjustmentAuditEntry>,
}

/// Current risk state for a batch plus its adjustment history
pub async fn get_batch_risk(
    State(state): State<AppState>,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<BatchRiskResponse>> {
    let store = state.engine.store();
    let batch = store
        .find_batch(batch_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Batch {}", batch_id)))?;
    let history = store.entries_for_batch(batch_id).await?;

    let risk_level = RiskLevel::from_score(batch.risk_score);
    Ok(Json(BatchRiskResponse {
        risk_level,
        requires_action: risk_level.requires_action(),
        requires_alert: risk_level.requires_alert(),
        batch,
        history,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{GrainType, SpoilageLabel};

    fn batch_with_score(risk_score: f64) -> GrainBatchRiskState {
        GrainBatchRiskState {
            batch_id: Uuid::new_v4(),
            silo_id: Uuid::new_v4(),
            grain_type: GrainType::Wheat,
            risk_score,
            confidence: Some(0.85),
            spoilage_label: SpoilageLabel::from_score(risk_score),
            last_risk_assessment: Some(Utc::now()),
            created_at: Utc::now(),
        }
    }

    fn response_for(risk_score: f64) -> serde_json::Value {
        let risk_level = RiskLevel::from_score(risk_score);
        let response = BatchRiskResponse {
            risk_level,
            requires_action: risk_level.requires_action(),
            requires_alert: risk_level.requires_alert(),
            batch: batch_with_score(risk_score),
            history: vec![],
        };
        serde_json::to_value(&response).unwrap()
    }

    #[test]
    fn test_batch_risk_flags_follow_the_band() {
        let low = response_for(20.0);
        assert_eq!(low["risk_level"], "low");
        assert_eq!(low["requires_action"], false);
        assert_eq!(low["requires_alert"], false);

        let high = response_for(65.0);
        assert_eq!(high["risk_level"], "high");
        assert_eq!(high["requires_action"], true);
        assert_eq!(high["requires_alert"], false);

        let critical = response_for(85.0);
        assert_eq!(critical["risk_level"], "critical");
        assert_eq!(critical["requires_action"], true);
        assert_eq!(critical["requires_alert"], true);
    }
}
