//! Grain batch risk state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Grain types tracked by the platform
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GrainType {
    Rice,
    Wheat,
    Corn,
}

impl GrainType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrainType::Rice => "rice",
            GrainType::Wheat => "wheat",
            GrainType::Corn => "corn",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "rice" => Some(GrainType::Rice),
            "wheat" => Some(GrainType::Wheat),
            "corn" => Some(GrainType::Corn),
            _ => None,
        }
    }
}

/// Spoilage classification derived from the risk score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpoilageLabel {
    Safe,
    Risky,
    Spoiled,
}

impl SpoilageLabel {
    /// Rederived on every score mutation: <50 safe, <80 risky, else spoiled
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            SpoilageLabel::Spoiled
        } else if score >= 50.0 {
            SpoilageLabel::Risky
        } else {
            SpoilageLabel::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpoilageLabel::Safe => "safe",
            SpoilageLabel::Risky => "risky",
            SpoilageLabel::Spoiled => "spoiled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "safe" => Some(SpoilageLabel::Safe),
            "risky" => Some(SpoilageLabel::Risky),
            "spoiled" => Some(SpoilageLabel::Spoiled),
            _ => None,
        }
    }
}

/// Persisted risk state for a grain batch
///
/// `risk_score` is always clamped to [0, 100]; every mutation also updates
/// `last_risk_assessment` and rederives `spoilage_label`. Batches are never
/// deleted, only superseded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrainBatchRiskState {
    pub batch_id: Uuid,
    pub silo_id: Uuid,
    pub grain_type: GrainType,
    /// Spoilage likelihood estimate, 0-100
    pub risk_score: f64,
    /// Certainty of the last update, 0-1
    pub confidence: Option<f64>,
    pub spoilage_label: SpoilageLabel,
    pub last_risk_assessment: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spoilage_label_bands() {
        assert_eq!(SpoilageLabel::from_score(0.0), SpoilageLabel::Safe);
        assert_eq!(SpoilageLabel::from_score(49.0), SpoilageLabel::Safe);
        assert_eq!(SpoilageLabel::from_score(50.0), SpoilageLabel::Risky);
        assert_eq!(SpoilageLabel::from_score(79.0), SpoilageLabel::Risky);
        assert_eq!(SpoilageLabel::from_score(80.0), SpoilageLabel::Spoiled);
        assert_eq!(SpoilageLabel::from_score(100.0), SpoilageLabel::Spoiled);
    }

    #[test]
    fn test_grain_type_round_trip() {
        for grain in [GrainType::Rice, GrainType::Wheat, GrainType::Corn] {
            assert_eq!(GrainType::parse(grain.as_str()), Some(grain));
        }
        assert_eq!(GrainType::parse("barley"), None);
    }
}
