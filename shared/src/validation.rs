//! Validation utilities for the GrainHero storage risk platform

use thiserror::Error;

use crate::types::GpsCoordinates;

/// Why an input value was rejected
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Coordinates must be finite numbers")]
    NonFiniteCoordinates,
    #[error("Latitude must be between -90 and 90")]
    LatitudeOutOfRange,
    #[error("Longitude must be between -180 and 180")]
    LongitudeOutOfRange,
    #[error("Risk score must be a finite number between 0 and 100")]
    RiskScoreOutOfRange,
    #[error("Confidence must be between 0 and 1")]
    ConfidenceOutOfRange,
}

/// Validate that coordinates are on the globe
pub fn validate_coordinates(coords: &GpsCoordinates) -> Result<(), ValidationError> {
    if !coords.latitude.is_finite() || !coords.longitude.is_finite() {
        return Err(ValidationError::NonFiniteCoordinates);
    }
    if !(-90.0..=90.0).contains(&coords.latitude) {
        return Err(ValidationError::LatitudeOutOfRange);
    }
    if !(-180.0..=180.0).contains(&coords.longitude) {
        return Err(ValidationError::LongitudeOutOfRange);
    }
    Ok(())
}

/// Validate a spoilage risk score target (manual overrides included)
pub fn validate_risk_score(score: f64) -> Result<(), ValidationError> {
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return Err(ValidationError::RiskScoreOutOfRange);
    }
    Ok(())
}

/// Validate a confidence value
pub fn validate_confidence(confidence: f64) -> Result<(), ValidationError> {
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(ValidationError::ConfidenceOutOfRange);
    }
    Ok(())
}

/// Pakistan bounding box check (24-37N, 61-77E) used by region inference
pub fn is_in_pakistan(latitude: f64, longitude: f64) -> bool {
    (24.0..=37.0).contains(&latitude) && (61.0..=77.0).contains(&longitude)
}
