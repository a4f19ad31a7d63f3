//! CLI utilities for binaries
//!
//! Handles configuration path resolution and argument parsing.

use std::path::PathBuf;

/// Type of configuration to load
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// Planner configuration (planner_config.yaml)
    Planner,
    /// Custom path
    Custom(String),
}

impl ConfigType {
    /// Get the default path for this config type
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Planner => "config/planner_config.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    /// Get the environment variable name for this config type
    pub fn env_var_name(&self) -> &str {
        match self {
            ConfigType::Planner => "PLANNER_CONFIG_PATH",
            ConfigType::Custom(_) => "PLANNER_CONFIG_PATH",
        }
    }
}

/// Load configuration path from environment or use default
///
/// # Examples
/// ```
/// use card_procurement::bin_common::{load_config_from_env, ConfigType};
///
/// let path = load_config_from_env(ConfigType::Planner);
/// ```
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    std::env::var(config_type.env_var_name())
        .unwrap_or_else(|_| config_type.default_path().to_string())
        .into()
}

/// Parse command line arguments for a binary
///
/// Returns a vector of arguments (excluding the program name)
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}

/// What the planner binary computes from stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// `PlannerInput` in, `Plan` out
    Plan,
    /// `HotListRequest` in, hot list out
    HotList,
}

impl RunMode {
    /// First argument selects the mode; anything unknown is an error
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        match args.first().map(String::as_str) {
            None | Some("plan") => Ok(RunMode::Plan),
            Some("hot-list") => Ok(RunMode::HotList),
            Some(other) => Err(format!(
                "unknown mode '{}', expected 'plan' or 'hot-list'",
                other
            )),
        }
    }
}
