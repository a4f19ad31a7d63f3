//! Planner configuration
//!
//! One YAML file with a section per core. Every section is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::application::ips::IpsConfig;
use crate::application::optimizer::OptimizerConfig;

/// Environment variable overriding `log_level`
pub const LOG_LEVEL_ENV: &str = "PLANNER_LOG_LEVEL";

const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main planner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// IPS calculator weights, caps and thresholds
    #[serde(default)]
    pub ips: IpsConfig,

    /// Plan optimizer behavior
    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            ips: IpsConfig::default(),
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl PlannerConfig {
    /// Load configuration from YAML file
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        Self::from_yaml(&yaml_content)
    }

    /// Parse, apply environment overrides and validate
    pub fn from_yaml(yaml_content: &str) -> Result<Self> {
        let mut config: PlannerConfig = if yaml_content.trim().is_empty() {
            PlannerConfig::default()
        } else {
            serde_yaml::from_str(yaml_content)?
        };

        if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
            info!("Overriding log level from environment variable");
            config.log_level = level;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if let Some(problem) = self.ips.problems() {
            return Err(ConfigError::ValidationError(problem));
        }

        if let Some(problem) = self.optimizer.problems() {
            return Err(ConfigError::ValidationError(problem));
        }

        Ok(())
    }

    /// Log configuration summary
    pub fn log(&self) {
        let weights = &self.ips.weights;
        info!("Configuration loaded:");
        info!("  Log level: {}", self.log_level);
        info!(
            "  IPS weights: deck={} queued={} velocity={} alert={}",
            weights.deck, weights.queued, weights.velocity, weights.alert
        );
        info!(
            "  Tier thresholds: A>={} B>={} (min margin {}, min liquidity {})",
            self.ips.tier_a, self.ips.tier_b, self.ips.min_margin, self.ips.min_liquidity
        );
        info!("  Hot-list filler: {}", self.optimizer.allow_hot_list_filler);
        info!(
            "  Max filler cards per basket: {}",
            self.optimizer.max_filler_cards_per_basket
        );
        info!("  Reference seller: {}", self.optimizer.reference_seller_id);
    }
}
