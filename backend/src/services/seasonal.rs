//! Seasonal and regional classification
//!
//! Maps a date, region, and precipitation signal onto the threshold profile
//! the risk pipeline evaluates against. The lookup is total: every region
//! and season resolves to a profile, with unknown regions falling back to
//! the Punjab plains profile.

use chrono::{DateTime, Datelike, Utc};

use shared::models::{
    Region, RegionalContext, RegionalThresholds, RiskFactors, Season, ThresholdBand,
};

/// Precipitation probability above which monsoon conditions are assumed
/// for monsoon-prone regions, regardless of the calendar month
const MONSOON_PRECIP_THRESHOLD: f64 = 70.0;

/// Baseline plains profile (Punjab and unknown regions)
const PLAINS_TEMPERATURE: ThresholdBand = ThresholdBand::new(10.0, 35.0, 5.0, 40.0);
const PLAINS_HUMIDITY: ThresholdBand = ThresholdBand::new(40.0, 70.0, 30.0, 80.0);

/// Silos on the Karachi coastal strip tolerate higher ambient humidity
const COASTAL_HUMIDITY: ThresholdBand = ThresholdBand::new(40.0, 75.0, 30.0, 85.0);

/// Mountain regions run cooler; heat limits tighten
const MOUNTAIN_TEMPERATURE: ThresholdBand = ThresholdBand::new(5.0, 30.0, 0.0, 35.0);

/// Classify a date and region into the regional context used by the
/// risk pipeline.
///
/// Season follows the calendar month, except that a strong precipitation
/// signal in Punjab selects Monsoon directly. `now` is always supplied by
/// the caller.
pub fn classify(
    now: DateTime<Utc>,
    region: Region,
    precipitation_probability: f64,
) -> RegionalContext {
    build_context(now, region, precipitation_probability, thresholds_for(region))
}

/// Classify a date and location, inferring the region from coordinates.
///
/// Points on the Karachi coastal strip get the coastal humidity band on
/// top of their region profile.
pub fn classify_at(
    now: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
    precipitation_probability: f64,
) -> RegionalContext {
    let region = Region::from_coordinates(latitude, longitude);
    let mut thresholds = thresholds_for(region);
    if Region::is_coastal(latitude, longitude) {
        thresholds.humidity = COASTAL_HUMIDITY;
    }
    build_context(now, region, precipitation_probability, thresholds)
}

fn build_context(
    now: DateTime<Utc>,
    region: Region,
    precipitation_probability: f64,
    thresholds: RegionalThresholds,
) -> RegionalContext {
    let calendar_season = Season::from_month(now.month());
    let season = if region == Region::Punjab
        && precipitation_probability > MONSOON_PRECIP_THRESHOLD
    {
        Season::Monsoon
    } else {
        calendar_season
    };

    RegionalContext {
        region,
        season,
        thresholds,
        risk_factors: risk_factors_for(region, season),
    }
}

/// Threshold profile per region. Total over all variants; `Other` uses the
/// plains profile.
pub fn thresholds_for(region: Region) -> RegionalThresholds {
    match region {
        Region::KhyberPakhtunkhwa => RegionalThresholds {
            temperature: MOUNTAIN_TEMPERATURE,
            humidity: PLAINS_HUMIDITY,
        },
        Region::Punjab | Region::Sindh | Region::Balochistan | Region::Other => {
            RegionalThresholds {
                temperature: PLAINS_TEMPERATURE,
                humidity: PLAINS_HUMIDITY,
            }
        }
    }
}

/// Structural risk flags per region+season combination
pub fn risk_factors_for(region: Region, season: Season) -> RiskFactors {
    let mut factors = RiskFactors::default();

    match season {
        Season::Monsoon => {
            factors.high_humidity_risk = true;
            factors.flood_risk = true;
        }
        Season::Summer => {
            factors.extreme_heat_risk = true;
            if region == Region::Balochistan {
                factors.drought_risk = true;
            }
        }
        // Smog season on the Punjab plains runs October through January
        Season::Autumn | Season::Winter => {
            if matches!(region, Region::Punjab | Region::Other) {
                factors.air_pollution_risk = true;
            }
        }
        Season::Spring => {}
    }

    if region == Region::Sindh {
        factors.high_humidity_risk = true;
    }

    factors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_month(month: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, month, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_calendar_seasons() {
        let ctx = classify(at_month(4), Region::Punjab, 20.0);
        assert_eq!(ctx.season, Season::Spring);
        let ctx = classify(at_month(7), Region::Punjab, 20.0);
        assert_eq!(ctx.season, Season::Summer);
        let ctx = classify(at_month(10), Region::Punjab, 20.0);
        assert_eq!(ctx.season, Season::Autumn);
        let ctx = classify(at_month(1), Region::Punjab, 20.0);
        assert_eq!(ctx.season, Season::Winter);
    }

    #[test]
    fn test_punjab_precipitation_selects_monsoon() {
        let ctx = classify(at_month(7), Region::Punjab, 85.0);
        assert_eq!(ctx.season, Season::Monsoon);
        assert!(ctx.risk_factors.high_humidity_risk);
        assert!(ctx.risk_factors.flood_risk);

        // Calendar winter is also overridden by a strong signal
        let ctx = classify(at_month(1), Region::Punjab, 75.0);
        assert_eq!(ctx.season, Season::Monsoon);
    }

    #[test]
    fn test_monsoon_override_is_punjab_only() {
        let ctx = classify(at_month(7), Region::Sindh, 85.0);
        assert_eq!(ctx.season, Season::Summer);
    }

    #[test]
    fn test_lookup_is_total() {
        let regions = [
            Region::Punjab,
            Region::Sindh,
            Region::KhyberPakhtunkhwa,
            Region::Balochistan,
            Region::Other,
        ];
        for region in regions {
            for month in 1..=12 {
                let ctx = classify(at_month(month), region, 0.0);
                assert!(ctx.thresholds.temperature.max > ctx.thresholds.temperature.min);
                assert!(ctx.thresholds.humidity.max > ctx.thresholds.humidity.min);
            }
        }
    }

    #[test]
    fn test_unknown_region_gets_plains_profile() {
        assert_eq!(thresholds_for(Region::Other), thresholds_for(Region::Punjab));
    }

    #[test]
    fn test_coastal_strip_raises_the_humidity_band() {
        // Karachi sits on the coastal strip
        let karachi = classify_at(at_month(7), 24.9, 67.0, 20.0);
        assert_eq!(karachi.region, Region::Sindh);
        assert_eq!(karachi.thresholds.humidity.max, 75.0);
        assert_eq!(karachi.thresholds.humidity.critical_max, 85.0);

        // Inland Sindh keeps the plains band
        let sukkur = classify_at(at_month(7), 27.7, 68.8, 20.0);
        assert_eq!(sukkur.region, Region::Sindh);
        assert_eq!(sukkur.thresholds.humidity.max, 70.0);

        // Lahore is far from the coast
        let lahore = classify_at(at_month(7), 31.5, 74.3, 20.0);
        assert_eq!(lahore.region, Region::Punjab);
        assert_eq!(lahore.thresholds.humidity.max, 70.0);
    }

    #[test]
    fn test_classify_at_applies_the_monsoon_override() {
        let ctx = classify_at(at_month(12), 31.5, 74.3, 80.0);
        assert_eq!(ctx.region, Region::Punjab);
        assert_eq!(ctx.season, Season::Monsoon);
    }

    #[test]
    fn test_seasonal_risk_factors() {
        let summer = risk_factors_for(Region::Balochistan, Season::Summer);
        assert!(summer.extreme_heat_risk);
        assert!(summer.drought_risk);

        let smog = risk_factors_for(Region::Punjab, Season::Winter);
        assert!(smog.air_pollution_risk);

        let spring = risk_factors_for(Region::KhyberPakhtunkhwa, Season::Spring);
        assert_eq!(spring, RiskFactors::default());
    }
}
