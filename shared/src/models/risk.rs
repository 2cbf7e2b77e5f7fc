//! Risk multiplier, audit, and advisory models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Priority;

/// The dominant environmental driver behind a multiplier result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryFactor {
    Stable,
    HighExternalHumidity,
    TemperatureGradient,
    MonsoonConditions,
}

impl PrimaryFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryFactor::Stable => "stable",
            PrimaryFactor::HighExternalHumidity => "high_external_humidity",
            PrimaryFactor::TemperatureGradient => "temperature_gradient",
            PrimaryFactor::MonsoonConditions => "monsoon_conditions",
        }
    }
}

/// Coarse stable/unstable classification of current weather volatility
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StabilityLabel {
    Stable,
    Unstable,
}

/// Output of the risk multiplier calculator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskMultiplierResult {
    /// Composite multiplier; starts at 1.0 and only moves upward
    pub multiplier: f64,
    pub primary_factor: PrimaryFactor,
    pub stability: StabilityLabel,
}

/// Why a committed risk adjustment happened
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    Stable,
    HighExternalHumidity,
    TemperatureGradient,
    MonsoonConditions,
    ManualOverride,
}

impl AdjustmentReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentReason::Stable => "stable",
            AdjustmentReason::HighExternalHumidity => "high_external_humidity",
            AdjustmentReason::TemperatureGradient => "temperature_gradient",
            AdjustmentReason::MonsoonConditions => "monsoon_conditions",
            AdjustmentReason::ManualOverride => "manual_override",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "stable" => Some(AdjustmentReason::Stable),
            "high_external_humidity" => Some(AdjustmentReason::HighExternalHumidity),
            "temperature_gradient" => Some(AdjustmentReason::TemperatureGradient),
            "monsoon_conditions" => Some(AdjustmentReason::MonsoonConditions),
            "manual_override" => Some(AdjustmentReason::ManualOverride),
            _ => None,
        }
    }
}

impl From<PrimaryFactor> for AdjustmentReason {
    fn from(factor: PrimaryFactor) -> Self {
        match factor {
            PrimaryFactor::Stable => AdjustmentReason::Stable,
            PrimaryFactor::HighExternalHumidity => AdjustmentReason::HighExternalHumidity,
            PrimaryFactor::TemperatureGradient => AdjustmentReason::TemperatureGradient,
            PrimaryFactor::MonsoonConditions => AdjustmentReason::MonsoonConditions,
        }
    }
}

/// Append-only record of a committed risk adjustment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAdjustmentAuditEntry {
    pub batch_id: Uuid,
    pub old_risk_score: f64,
    pub new_risk_score: f64,
    pub adjustment_reason: AdjustmentReason,
    pub confidence: f64,
    pub applied_at: DateTime<Utc>,
}

/// Advisory categories for storage operations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationCategory {
    Ventilation,
    Cooling,
    MoistureControl,
    AirFiltration,
}

/// A single operational recommendation derived from forecast aggregates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageRecommendation {
    pub category: RecommendationCategory,
    pub priority: Priority,
    pub message: String,
    pub action: String,
}

/// Per-dimension weather impact assessment for grain storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherImpact {
    pub temperature_risk: Priority,
    pub humidity_risk: Priority,
    pub precipitation_risk: Priority,
    pub overall_risk: Priority,
    pub notes: Vec<String>,
}
