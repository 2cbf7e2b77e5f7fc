//! Risk multiplier calculation
//!
//! Derives a composite environmental risk multiplier from the latest
//! internal sensor sample and the external conditions. Pure and
//! deterministic; the reconciliation engine applies the result to the
//! stored risk score.

use shared::models::{
    EnvironmentalReading, PrimaryFactor, RiskMultiplierResult, SensorSample, StabilityLabel,
};

const EXTERNAL_HUMIDITY_THRESHOLD: f64 = 75.0;
const TEMPERATURE_GRADIENT_THRESHOLD: f64 = 15.0;
const PRECIPITATION_THRESHOLD: f64 = 70.0;
const LOW_PRESSURE_THRESHOLD: f64 = 1000.0;

/// Final multiplier at or above this value classifies conditions as unstable
const STABILITY_THRESHOLD: f64 = 1.2;

/// One row of the adjustment rule table
struct Rule {
    triggered: bool,
    factor: f64,
    label: Option<PrimaryFactor>,
}

/// Compute the composite risk multiplier for a batch's conditions.
///
/// Rules are evaluated in a fixed order; each triggered rule multiplies the
/// accumulator, and labeled rules overwrite the primary factor so the last
/// triggered label wins. The multiplier never drops below 1.0.
pub fn compute_multiplier(
    sensor: &SensorSample,
    environment: &EnvironmentalReading,
    precipitation_probability: f64,
) -> RiskMultiplierResult {
    let gradient = (sensor.temperature - environment.temperature).abs();

    let rules = [
        Rule {
            triggered: environment.humidity > EXTERNAL_HUMIDITY_THRESHOLD,
            factor: 1.3,
            label: Some(PrimaryFactor::HighExternalHumidity),
        },
        Rule {
            triggered: gradient > TEMPERATURE_GRADIENT_THRESHOLD,
            factor: 1.2,
            label: Some(PrimaryFactor::TemperatureGradient),
        },
        Rule {
            triggered: precipitation_probability > PRECIPITATION_THRESHOLD,
            factor: 1.4,
            label: Some(PrimaryFactor::MonsoonConditions),
        },
        Rule {
            triggered: environment.pressure < LOW_PRESSURE_THRESHOLD,
            factor: 1.1,
            label: None,
        },
    ];

    let (multiplier, primary_factor) = rules.iter().filter(|rule| rule.triggered).fold(
        (1.0_f64, PrimaryFactor::Stable),
        |(acc, label), rule| (acc * rule.factor, rule.label.unwrap_or(label)),
    );

    let stability = if multiplier < STABILITY_THRESHOLD {
        StabilityLabel::Stable
    } else {
        StabilityLabel::Unstable
    };

    RiskMultiplierResult {
        multiplier,
        primary_factor,
        stability,
    }
}
