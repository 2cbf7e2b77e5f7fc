//! Configuration management for the GrainHero storage risk platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with GH_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

use shared::validation::validate_confidence;

use crate::error::{AppError, AppResult};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Weather provider configuration
    pub weather: WeatherConfig,

    /// Risk reconciliation policy
    pub risk: RiskPolicyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Weather API endpoint
    pub api_endpoint: String,

    /// Weather API key; empty selects the synthetic provider
    pub api_key: String,

    /// Upstream request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Policy parameters for the reconciliation engine.
///
/// The defaults are product-approved; change them only with product input.
#[derive(Debug, Deserialize, Clone)]
pub struct RiskPolicyConfig {
    /// Minimum score delta required before a weather-driven adjustment
    /// is persisted
    pub min_change_delta: f64,

    /// Confidence recorded on automated adjustments
    pub automated_confidence: f64,

    /// Confidence recorded on manual overrides
    pub override_confidence: f64,
}

impl Config {
    /// Load configuration from files and environment variables, rejecting
    /// policy values an operator could not have meant
    pub fn load() -> AppResult<Self> {
        let config =
            Self::build().map_err(|e| AppError::Configuration(e.to_string()))?;
        config.validate_policy()?;
        Ok(config)
    }

    /// Reject policy values outside their documented ranges
    pub fn validate_policy(&self) -> AppResult<()> {
        if !self.risk.min_change_delta.is_finite() || self.risk.min_change_delta < 0.0 {
            return Err(AppError::Configuration(
                "risk.min_change_delta must be a non-negative number".to_string(),
            ));
        }
        validate_confidence(self.risk.automated_confidence).map_err(|e| {
            AppError::Configuration(format!("risk.automated_confidence: {}", e))
        })?;
        validate_confidence(self.risk.override_confidence).map_err(|e| {
            AppError::Configuration(format!("risk.override_confidence: {}", e))
        })?;
        Ok(())
    }

    fn build() -> Result<Self, ConfigError> {
        let environment = std::env::var("GH_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default(
                "weather.api_endpoint",
                "https://api.openweathermap.org/data/2.5",
            )?
            .set_default("weather.api_key", "")?
            .set_default("weather.request_timeout_secs", 8)?
            .set_default("risk.min_change_delta", 5.0)?
            .set_default("risk.automated_confidence", 0.85)?
            .set_default("risk.override_confidence", 0.99)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (GH_ prefix)
            .add_source(
                Environment::with_prefix("GH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for RiskPolicyConfig {
    fn default() -> Self {
        Self {
            min_change_delta: 5.0,
            automated_confidence: 0.85,
            override_confidence: 0.99,
        }
    }
}
