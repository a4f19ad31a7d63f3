//! Integration test: Configuration utilities
//!
//! Tests config path resolution and YAML loading.

use card_procurement::bin_common::{load_config_from_env, ConfigType};
use card_procurement::planner::{ConfigError, PlannerConfig};
use std::env;
use std::io::Write;

#[test]
fn test_planner_config_default_path() {
    // Clear env var to test default
    env::remove_var("PLANNER_CONFIG_PATH");

    let config_path = load_config_from_env(ConfigType::Planner);
    assert_eq!(
        config_path.to_str().unwrap(),
        "config/planner_config.yaml"
    );
}

#[test]
fn test_custom_config() {
    let custom = ConfigType::Custom("custom/path.yaml".to_string());
    assert_eq!(custom.default_path(), "custom/path.yaml");
    assert_eq!(custom.env_var_name(), "PLANNER_CONFIG_PATH");
}

#[test]
fn test_shipped_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/planner_config.yaml");
    let config = PlannerConfig::load(path).unwrap();
    assert_eq!(config.ips, Default::default());
    assert_eq!(config.optimizer, Default::default());
}

#[test]
fn test_load_from_temp_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "ips:\n  tier_a: 0.7\noptimizer:\n  max_filler_cards_per_basket: 2").unwrap();

    let config = PlannerConfig::load(file.path()).unwrap();
    assert_eq!(config.ips.tier_a, 0.7);
    assert_eq!(config.ips.tier_b, 0.4);
    assert_eq!(config.optimizer.max_filler_cards_per_basket, 2);
}

#[test]
fn test_missing_file_is_file_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = PlannerConfig::load(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileError(_)));
}

#[test]
fn test_negative_weight_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "ips:\n  weights:\n    deck: -1.0").unwrap();

    let err = PlannerConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}
