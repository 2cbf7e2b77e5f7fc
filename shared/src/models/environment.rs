//! Environmental reading models
//!
//! Canonical shapes for weather and air-quality observations. Readings are
//! immutable snapshots; they are consumed transiently by the risk pipeline
//! and may be archived alongside sensor reading records for traceability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sky condition, normalized from provider payloads
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Rainy,
    Stormy,
    Hazy,
}

impl WeatherCondition {
    /// Normalize an OpenWeatherMap `weather.main` value
    pub fn from_provider(main: &str) -> Self {
        match main {
            "Clear" => WeatherCondition::Clear,
            "Clouds" => WeatherCondition::Cloudy,
            "Rain" | "Drizzle" => WeatherCondition::Rainy,
            "Thunderstorm" => WeatherCondition::Stormy,
            "Mist" | "Haze" | "Smoke" | "Dust" | "Fog" => WeatherCondition::Hazy,
            _ => WeatherCondition::PartlyCloudy,
        }
    }
}

/// A snapshot of external conditions at a point in time
///
/// Every numeric field is required: the provider adapter guarantees a fully
/// populated reading even when the upstream call fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentalReading {
    pub timestamp: DateTime<Utc>,
    /// Air temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity, 0-100
    pub humidity: f64,
    /// Atmospheric pressure in hPa
    pub pressure: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Probability of precipitation, 0-100
    pub precipitation_probability: f64,
    pub weather_condition: WeatherCondition,
}

/// Air quality level derived from an AQI value via fixed breakpoints
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AirQualityLevel {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AirQualityLevel {
    pub fn from_aqi(aqi: i32) -> Self {
        match aqi {
            i32::MIN..=50 => AirQualityLevel::Good,
            51..=100 => AirQualityLevel::Moderate,
            101..=150 => AirQualityLevel::UnhealthySensitive,
            151..=200 => AirQualityLevel::Unhealthy,
            201..=300 => AirQualityLevel::VeryUnhealthy,
            _ => AirQualityLevel::Hazardous,
        }
    }
}

/// Air quality observation for a location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirQualityReading {
    /// Air quality index, typically 0-500
    pub aqi: i32,
    pub pm2_5: f64,
    pub pm10: f64,
    pub no2: f64,
    pub so2: f64,
    pub co: f64,
    pub quality_level: AirQualityLevel,
    pub timestamp: DateTime<Utc>,
}

impl AirQualityReading {
    pub fn new(
        aqi: i32,
        pm2_5: f64,
        pm10: f64,
        no2: f64,
        so2: f64,
        co: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            aqi,
            pm2_5,
            pm10,
            no2,
            so2,
            co,
            quality_level: AirQualityLevel::from_aqi(aqi),
            timestamp,
        }
    }
}

/// Latest internal reading from a silo's sensors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSample {
    /// Internal grain mass temperature in degrees Celsius
    pub temperature: f64,
    /// Internal relative humidity, 0-100
    pub humidity: f64,
    pub recorded_at: DateTime<Utc>,
}
