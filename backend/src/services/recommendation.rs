//! Storage recommendations and weather impact assessment
//!
//! Advisory output derived from forecast aggregates and air quality. These
//! functions never touch batch state.

use shared::models::{
    AirQualityReading, EnvironmentalReading, RecommendationCategory, StorageRecommendation,
    WeatherImpact,
};
use shared::types::Priority;

const VENTILATION_HUMIDITY_THRESHOLD: f64 = 70.0;
const COOLING_TEMPERATURE_THRESHOLD: f64 = 35.0;
const MOISTURE_PRECIP_THRESHOLD: f64 = 70.0;
const FILTRATION_AQI_THRESHOLD: i32 = 150;

/// Generate storage recommendations from a daily forecast and the current
/// air quality.
///
/// Rules are independent and evaluated in a fixed order; the output
/// preserves that order.
pub fn recommend(
    forecast: &[EnvironmentalReading],
    air_quality: &AirQualityReading,
) -> Vec<StorageRecommendation> {
    let mut recommendations = Vec::new();
    if forecast.is_empty() {
        return recommendations;
    }

    let avg_humidity =
        forecast.iter().map(|r| r.humidity).sum::<f64>() / forecast.len() as f64;
    let max_temperature = forecast
        .iter()
        .map(|r| r.temperature)
        .fold(f64::MIN, f64::max);
    let max_precipitation = forecast
        .iter()
        .map(|r| r.precipitation_probability)
        .fold(0.0, f64::max);

    if avg_humidity > VENTILATION_HUMIDITY_THRESHOLD {
        recommendations.push(StorageRecommendation {
            category: RecommendationCategory::Ventilation,
            priority: Priority::High,
            message: format!(
                "Average humidity of {:.0}% expected over the forecast window",
                avg_humidity
            ),
            action: "Increase silo ventilation to prevent moisture buildup".to_string(),
        });
    }

    if max_temperature > COOLING_TEMPERATURE_THRESHOLD {
        recommendations.push(StorageRecommendation {
            category: RecommendationCategory::Cooling,
            priority: Priority::Medium,
            message: format!("Peak temperature of {:.0}\u{b0}C expected", max_temperature),
            action: "Activate cooling systems during peak afternoon hours".to_string(),
        });
    }

    if max_precipitation > MOISTURE_PRECIP_THRESHOLD {
        recommendations.push(StorageRecommendation {
            category: RecommendationCategory::MoistureControl,
            priority: Priority::High,
            message: format!(
                "Heavy precipitation likely ({:.0}% probability)",
                max_precipitation
            ),
            action: "Seal silo openings and verify drainage around storage areas".to_string(),
        });
    }

    if air_quality.aqi > FILTRATION_AQI_THRESHOLD {
        recommendations.push(StorageRecommendation {
            category: RecommendationCategory::AirFiltration,
            priority: Priority::Medium,
            message: format!("Air quality index at {} (unhealthy)", air_quality.aqi),
            action: "Run intake air through filtration before ventilating".to_string(),
        });
    }

    recommendations
}

/// Assess the storage impact of current conditions along each weather
/// dimension. The overall level is the worst of the dimensions.
pub fn assess_impact(reading: &EnvironmentalReading) -> WeatherImpact {
    let mut notes = Vec::new();

    let temperature_risk = if reading.temperature > 30.0 {
        notes.push("High temperature accelerates grain respiration and pest activity".to_string());
        Priority::High
    } else if reading.temperature > 25.0 {
        Priority::Medium
    } else {
        Priority::Low
    };

    let humidity_risk = if reading.humidity > 80.0 {
        notes.push("High humidity promotes mold growth in stored grain".to_string());
        Priority::High
    } else if reading.humidity > 70.0 {
        Priority::Medium
    } else {
        Priority::Low
    };

    let precipitation_risk = if reading.precipitation_probability > 70.0 {
        notes.push("Rain expected; check silo sealing and drainage".to_string());
        Priority::High
    } else if reading.precipitation_probability > 40.0 {
        Priority::Medium
    } else {
        Priority::Low
    };

    let overall_risk = [temperature_risk, humidity_risk, precipitation_risk]
        .into_iter()
        .max()
        .unwrap_or(Priority::Low);

    WeatherImpact {
        temperature_risk,
        humidity_risk,
        precipitation_risk,
        overall_risk,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::models::WeatherCondition;

    fn reading(temperature: f64, humidity: f64, precip: f64) -> EnvironmentalReading {
        EnvironmentalReading {
            timestamp: Utc::now(),
            temperature,
            humidity,
            pressure: 1013.0,
            wind_speed: 2.0,
            precipitation_probability: precip,
            weather_condition: WeatherCondition::Clear,
        }
    }

    fn air(aqi: i32) -> AirQualityReading {
        AirQualityReading::new(aqi, 20.0, 40.0, 15.0, 5.0, 300.0, Utc::now())
    }

    #[test]
    fn test_benign_forecast_yields_no_recommendations() {
        let forecast = vec![reading(22.0, 50.0, 10.0), reading(24.0, 55.0, 20.0)];
        assert!(recommend(&forecast, &air(40)).is_empty());
    }

    #[test]
    fn test_each_rule_fires_on_its_aggregate() {
        // One hot day among mild ones still triggers cooling
        let forecast = vec![reading(22.0, 50.0, 10.0), reading(37.0, 50.0, 10.0)];
        let recs = recommend(&forecast, &air(40));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].category, RecommendationCategory::Cooling);
        assert_eq!(recs[0].priority, Priority::Medium);

        // Sustained humidity triggers ventilation
        let forecast = vec![reading(22.0, 75.0, 10.0), reading(24.0, 72.0, 10.0)];
        let recs = recommend(&forecast, &air(40));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].category, RecommendationCategory::Ventilation);
        assert_eq!(recs[0].priority, Priority::High);

        // AQI alone triggers filtration
        let forecast = vec![reading(22.0, 50.0, 10.0)];
        let recs = recommend(&forecast, &air(180));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].category, RecommendationCategory::AirFiltration);
    }

    #[test]
    fn test_rules_are_independent_and_ordered() {
        let forecast = vec![reading(38.0, 80.0, 90.0)];
        let recs = recommend(&forecast, &air(200));
        let categories: Vec<_> = recs.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            vec![
                RecommendationCategory::Ventilation,
                RecommendationCategory::Cooling,
                RecommendationCategory::MoistureControl,
                RecommendationCategory::AirFiltration,
            ]
        );
    }

    #[test]
    fn test_empty_forecast_is_safe() {
        assert!(recommend(&[], &air(300)).is_empty());
    }

    #[test]
    fn test_impact_levels() {
        let calm = assess_impact(&reading(20.0, 50.0, 10.0));
        assert_eq!(calm.overall_risk, Priority::Low);
        assert!(calm.notes.is_empty());

        let warm = assess_impact(&reading(27.0, 72.0, 50.0));
        assert_eq!(warm.temperature_risk, Priority::Medium);
        assert_eq!(warm.humidity_risk, Priority::Medium);
        assert_eq!(warm.precipitation_risk, Priority::Medium);
        assert_eq!(warm.overall_risk, Priority::Medium);

        let severe = assess_impact(&reading(33.0, 85.0, 80.0));
        assert_eq!(severe.overall_risk, Priority::High);
        assert_eq!(severe.notes.len(), 3);
    }

    #[test]
    fn test_overall_is_worst_dimension() {
        let impact = assess_impact(&reading(20.0, 85.0, 10.0));
        assert_eq!(impact.temperature_risk, Priority::Low);
        assert_eq!(impact.humidity_risk, Priority::High);
        assert_eq!(impact.overall_risk, Priority::High);
    }
}
