//! Weather and air-quality provider adapter
//!
//! Integrates with OpenWeatherMap for current conditions, forecasts, and
//! air pollution data, normalizing provider payloads into the canonical
//! reading shapes. The source is selected at construction time: a live
//! provider or a synthetic generator. Live failures degrade to synthetic
//! readings so the risk pipeline keeps running; callers never observe a
//! missing numeric field.

use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;

use shared::models::{
    AirQualityReading, EnvironmentalReading, WeatherCondition,
};

use crate::config::WeatherConfig;
use crate::error::{AppError, AppResult};

/// Number of 3-hour forecast steps per day in the provider payload
const FORECAST_STEPS_PER_DAY: usize = 8;

/// Where environmental readings come from
pub enum WeatherSource {
    Live {
        client: Client,
        api_key: String,
        base_url: String,
        timeout: Duration,
    },
    Synthetic,
}

/// Provider adapter for environmental readings
pub struct WeatherProvider {
    source: WeatherSource,
}

/// OpenWeatherMap current weather response
#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    weather: Vec<OwmWeather>,
    main: OwmMain,
    wind: Option<OwmWind>,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    temp_max: Option<f64>,
    pressure: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

/// OpenWeatherMap 5-day/3-hour forecast response
#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<OwmForecastItem>,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt: i64,
    main: OwmMain,
    weather: Vec<OwmWeather>,
    wind: Option<OwmWind>,
    pop: Option<f64>,
}

/// OpenWeatherMap air pollution response
#[derive(Debug, Deserialize)]
struct OwmAirResponse {
    list: Vec<OwmAirItem>,
}

#[derive(Debug, Deserialize)]
struct OwmAirItem {
    main: OwmAirIndex,
    components: OwmAirComponents,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct OwmAirIndex {
    aqi: i32,
}

#[derive(Debug, Deserialize)]
struct OwmAirComponents {
    co: f64,
    no2: f64,
    so2: f64,
    pm2_5: f64,
    pm10: f64,
}

impl WeatherProvider {
    /// Create a provider backed by the live weather API
    pub fn live(api_key: String, base_url: String, timeout: Duration) -> Self {
        Self {
            source: WeatherSource::Live {
                client: Client::new(),
                api_key,
                base_url,
                timeout,
            },
        }
    }

    /// Create a provider that only generates synthetic readings
    pub fn synthetic() -> Self {
        Self {
            source: WeatherSource::Synthetic,
        }
    }

    /// Select the source from configuration: an empty API key means no
    /// upstream is configured and the synthetic generator is used.
    pub fn from_config(config: &WeatherConfig) -> Self {
        if config.api_key.is_empty() {
            tracing::info!("No weather API key configured, using synthetic readings");
            Self::synthetic()
        } else {
            Self::live(
                config.api_key.clone(),
                config.api_endpoint.clone(),
                Duration::from_secs(config.request_timeout_secs),
            )
        }
    }

    /// Which source this provider reads from, for diagnostics
    pub fn source_name(&self) -> &'static str {
        match &self.source {
            WeatherSource::Live { .. } => "live",
            WeatherSource::Synthetic => "synthetic",
        }
    }

    /// Fetch current conditions for a location.
    ///
    /// Never fails: upstream errors are logged and replaced with a
    /// synthetic reading.
    pub async fn fetch_current(&self, latitude: f64, longitude: f64) -> EnvironmentalReading {
        match &self.source {
            WeatherSource::Synthetic => synthetic_reading(Utc::now()),
            WeatherSource::Live { .. } => {
                match self.live_current(latitude, longitude).await {
                    Ok(reading) => reading,
                    Err(err) => {
                        tracing::warn!(
                            "Current weather fetch failed ({}), falling back to synthetic",
                            err
                        );
                        synthetic_reading(Utc::now())
                    }
                }
            }
        }
    }

    /// Fetch a daily forecast for a location.
    ///
    /// Returns one reading per day, `days` entries when data is available
    /// (possibly fewer from a short upstream payload). Upstream failure
    /// falls back to a full synthetic sequence.
    pub async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u32,
    ) -> Vec<EnvironmentalReading> {
        let days = days.max(1);
        match &self.source {
            WeatherSource::Synthetic => synthetic_forecast(Utc::now(), days),
            WeatherSource::Live { .. } => {
                match self.live_forecast(latitude, longitude, days).await {
                    Ok(readings) if !readings.is_empty() => readings,
                    Ok(_) => {
                        tracing::warn!("Forecast payload was empty, falling back to synthetic");
                        synthetic_forecast(Utc::now(), days)
                    }
                    Err(err) => {
                        tracing::warn!(
                            "Forecast fetch failed ({}), falling back to synthetic",
                            err
                        );
                        synthetic_forecast(Utc::now(), days)
                    }
                }
            }
        }
    }

    /// Fetch the air quality index for a location.
    ///
    /// Never fails: upstream errors are logged and replaced with a
    /// synthetic reading.
    pub async fn fetch_air_quality(&self, latitude: f64, longitude: f64) -> AirQualityReading {
        match &self.source {
            WeatherSource::Synthetic => synthetic_air_quality(Utc::now()),
            WeatherSource::Live { .. } => {
                match self.live_air_quality(latitude, longitude).await {
                    Ok(reading) => reading,
                    Err(err) => {
                        tracing::warn!(
                            "Air quality fetch failed ({}), falling back to synthetic",
                            err
                        );
                        synthetic_air_quality(Utc::now())
                    }
                }
            }
        }
    }

    async fn live_current(&self, latitude: f64, longitude: f64) -> AppResult<EnvironmentalReading> {
        let data: OwmCurrentResponse = self.get_json("weather", latitude, longitude).await?;
        let condition = data
            .weather
            .first()
            .map(|w| WeatherCondition::from_provider(&w.main))
            .unwrap_or(WeatherCondition::PartlyCloudy);

        Ok(EnvironmentalReading {
            timestamp: DateTime::from_timestamp(data.dt, 0).unwrap_or_else(Utc::now),
            temperature: data.main.temp,
            humidity: data.main.humidity,
            pressure: data.main.pressure,
            wind_speed: data.wind.map(|w| w.speed).unwrap_or(0.0),
            // The current-conditions endpoint has no pop field; rain now
            // counts as certain precipitation
            precipitation_probability: if condition == WeatherCondition::Rainy {
                100.0
            } else {
                0.0
            },
            weather_condition: condition,
        })
    }

    async fn live_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u32,
    ) -> AppResult<Vec<EnvironmentalReading>> {
        let data: OwmForecastResponse = self.get_json("forecast", latitude, longitude).await?;

        let readings = data
            .list
            .chunks(FORECAST_STEPS_PER_DAY)
            .take(days as usize)
            .map(daily_reading)
            .collect();

        Ok(readings)
    }

    async fn live_air_quality(&self, latitude: f64, longitude: f64) -> AppResult<AirQualityReading> {
        let data: OwmAirResponse = self.get_json("air_pollution", latitude, longitude).await?;
        let item = data
            .list
            .into_iter()
            .next()
            .ok_or_else(|| AppError::UpstreamUnavailable("empty air pollution payload".into()))?;

        let timestamp = DateTime::from_timestamp(item.dt, 0).unwrap_or_else(Utc::now);
        Ok(AirQualityReading::new(
            scale_owm_aqi(item.main.aqi),
            item.components.pm2_5,
            item.components.pm10,
            item.components.no2,
            item.components.so2,
            item.components.co,
            timestamp,
        ))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        latitude: f64,
        longitude: f64,
    ) -> AppResult<T> {
        let WeatherSource::Live {
            client,
            api_key,
            base_url,
            timeout,
        } = &self.source
        else {
            return Err(AppError::UpstreamUnavailable(
                "no live provider configured".into(),
            ));
        };

        let url = format!(
            "{}/{}?lat={}&lon={}&appid={}&units=metric",
            base_url, path, latitude, longitude, api_key
        );

        let response = client
            .get(&url)
            .timeout(*timeout)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("malformed payload: {}", e)))
    }
}

/// Collapse one day of 3-hour forecast steps into a single daily reading.
///
/// Temperature and precipitation probability take the daily maximum (the
/// values the advisory rules care about); humidity and pressure are averaged.
fn daily_reading(steps: &[OwmForecastItem]) -> EnvironmentalReading {
    let count = steps.len().max(1) as f64;
    let temperature = steps
        .iter()
        .map(|s| s.main.temp_max.unwrap_or(s.main.temp))
        .fold(f64::MIN, f64::max);
    let humidity = steps.iter().map(|s| s.main.humidity).sum::<f64>() / count;
    let pressure = steps.iter().map(|s| s.main.pressure).sum::<f64>() / count;
    let wind_speed = steps
        .iter()
        .map(|s| s.wind.as_ref().map(|w| w.speed).unwrap_or(0.0))
        .fold(0.0, f64::max);
    let precipitation_probability = steps
        .iter()
        .map(|s| s.pop.unwrap_or(0.0) * 100.0)
        .fold(0.0, f64::max);

    let condition = steps
        .get(steps.len() / 2)
        .or_else(|| steps.first())
        .and_then(|s| s.weather.first())
        .map(|w| WeatherCondition::from_provider(&w.main))
        .unwrap_or(WeatherCondition::PartlyCloudy);

    EnvironmentalReading {
        timestamp: steps
            .first()
            .and_then(|s| DateTime::from_timestamp(s.dt, 0))
            .unwrap_or_else(Utc::now),
        temperature,
        humidity,
        pressure,
        wind_speed,
        precipitation_probability,
        weather_condition: condition,
    }
}

/// Map the provider's 1-5 air quality index onto the 0-500 AQI scale
/// using band midpoints.
fn scale_owm_aqi(index: i32) -> i32 {
    match index {
        1 => 25,
        2 => 75,
        3 => 125,
        4 => 175,
        _ => 300,
    }
}

/// Generate a plausible reading when no upstream data is available.
///
/// Ranges are fixed so downstream stages stay exercised in degraded mode:
/// temperature 15-35, humidity 60-90, pressure 1010-1030.
pub fn synthetic_reading(timestamp: DateTime<Utc>) -> EnvironmentalReading {
    let mut rng = rand::rng();
    let humidity = rng.random_range(60.0..=90.0);
    let precipitation_probability = rng.random_range(10.0..=80.0);
    let weather_condition = if precipitation_probability > 60.0 {
        WeatherCondition::Rainy
    } else if humidity > 80.0 {
        WeatherCondition::Cloudy
    } else {
        WeatherCondition::PartlyCloudy
    };

    EnvironmentalReading {
        timestamp,
        temperature: rng.random_range(15.0..=35.0),
        humidity,
        pressure: rng.random_range(1010.0..=1030.0),
        wind_speed: rng.random_range(0.5..=8.0),
        precipitation_probability,
        weather_condition,
    }
}

/// Generate a synthetic daily forecast sequence of exactly `days` readings
pub fn synthetic_forecast(start: DateTime<Utc>, days: u32) -> Vec<EnvironmentalReading> {
    (0..days)
        .map(|day| synthetic_reading(start + ChronoDuration::days(day as i64)))
        .collect()
}

/// Generate a plausible air quality reading
pub fn synthetic_air_quality(timestamp: DateTime<Utc>) -> AirQualityReading {
    let mut rng = rand::rng();
    AirQualityReading::new(
        rng.random_range(20..=180),
        rng.random_range(5.0..=120.0),
        rng.random_range(10.0..=180.0),
        rng.random_range(5.0..=80.0),
        rng.random_range(2.0..=40.0),
        rng.random_range(200.0..=800.0),
        timestamp,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_reading_in_documented_ranges() {
        for _ in 0..50 {
            let reading = synthetic_reading(Utc::now());
            assert!((15.0..=35.0).contains(&reading.temperature));
            assert!((60.0..=90.0).contains(&reading.humidity));
            assert!((1010.0..=1030.0).contains(&reading.pressure));
            assert!((0.0..=100.0).contains(&reading.precipitation_probability));
            assert!(reading.wind_speed >= 0.0);
        }
    }

    #[test]
    fn test_synthetic_forecast_length() {
        for days in [1, 3, 7] {
            assert_eq!(synthetic_forecast(Utc::now(), days).len(), days as usize);
        }
    }

    #[test]
    fn test_source_name_reflects_construction() {
        assert_eq!(WeatherProvider::synthetic().source_name(), "synthetic");
        let live = WeatherProvider::live(
            "key".to_string(),
            "http://localhost".to_string(),
            Duration::from_secs(1),
        );
        assert_eq!(live.source_name(), "live");
    }

    #[test]
    fn test_owm_aqi_scaling() {
        assert_eq!(scale_owm_aqi(1), 25);
        assert_eq!(scale_owm_aqi(3), 125);
        assert_eq!(scale_owm_aqi(5), 300);
    }

    #[test]
    fn test_daily_reading_aggregates() {
        let steps = vec![
            OwmForecastItem {
                dt: 1_700_000_000,
                main: OwmMain {
                    temp: 20.0,
                    temp_max: Some(22.0),
                    pressure: 1010.0,
                    humidity: 60.0,
                },
                weather: vec![OwmWeather {
                    main: "Clear".to_string(),
                }],
                wind: Some(OwmWind { speed: 3.0 }),
                pop: Some(0.2),
            },
            OwmForecastItem {
                dt: 1_700_010_800,
                main: OwmMain {
                    temp: 30.0,
                    temp_max: Some(36.0),
                    pressure: 1014.0,
                    humidity: 80.0,
                },
                weather: vec![OwmWeather {
                    main: "Rain".to_string(),
                }],
                wind: Some(OwmWind { speed: 6.0 }),
                pop: Some(0.9),
            },
        ];

        let reading = daily_reading(&steps);
        assert_eq!(reading.temperature, 36.0);
        assert_eq!(reading.humidity, 70.0);
        assert_eq!(reading.pressure, 1012.0);
        assert_eq!(reading.wind_speed, 6.0);
        assert!((reading.precipitation_probability - 90.0).abs() < 1e-9);
    }
}
