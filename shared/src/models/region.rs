//! Regional and seasonal context models

use serde::{Deserialize, Serialize};

use crate::validation::is_in_pakistan;

/// Growing/storage regions the platform recognizes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Punjab,
    Sindh,
    KhyberPakhtunkhwa,
    Balochistan,
    #[serde(other)]
    Other,
}

impl Region {
    /// Infer a region from coordinates using coarse bounding boxes.
    ///
    /// Locations outside the known boxes resolve to `Other`, which downstream
    /// lookups treat as the Punjab profile.
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        if !is_in_pakistan(latitude, longitude) {
            return Region::Other;
        }
        if latitude >= 33.0 {
            return Region::KhyberPakhtunkhwa;
        }
        if (30.0..=32.5).contains(&latitude) && (72.0..=74.5).contains(&longitude) {
            return Region::Punjab;
        }
        if latitude <= 28.0 && longitude >= 66.5 {
            return Region::Sindh;
        }
        if longitude < 68.0 {
            return Region::Balochistan;
        }
        Region::Punjab
    }

    /// Karachi coastal strip; coastal silos tolerate slightly higher humidity
    pub fn is_coastal(latitude: f64, longitude: f64) -> bool {
        (24.0..=25.5).contains(&latitude) && (66.5..=67.5).contains(&longitude)
    }
}

/// Season labels used by the classifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Monsoon,
    Autumn,
    Winter,
}

impl Season {
    /// Calendar-month season: 3-5 spring, 6-8 summer, 9-11 autumn, else winter.
    ///
    /// Monsoon is not calendar-derived; the classifier selects it from the
    /// precipitation signal for monsoon-prone regions.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }
}

/// A min/max band with critical outer bounds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdBand {
    pub min: f64,
    pub max: f64,
    pub critical_min: f64,
    pub critical_max: f64,
}

impl ThresholdBand {
    pub const fn new(min: f64, max: f64, critical_min: f64, critical_max: f64) -> Self {
        Self {
            min,
            max,
            critical_min,
            critical_max,
        }
    }
}

/// Environmental thresholds for a region+season combination
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RegionalThresholds {
    pub temperature: ThresholdBand,
    pub humidity: ThresholdBand,
}

/// Structural risk flags for a region+season combination
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskFactors {
    pub high_humidity_risk: bool,
    pub extreme_heat_risk: bool,
    pub air_pollution_risk: bool,
    pub flood_risk: bool,
    pub drought_risk: bool,
}

/// Combined regional context handed to the risk pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionalContext {
    pub region: Region,
    pub season: Season,
    pub thresholds: RegionalThresholds,
    pub risk_factors: RiskFactors,
}
