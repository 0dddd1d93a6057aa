//! Integration test: TOML configuration → validated controller.

use std::fs;
use std::path::{Path, PathBuf};

use focus_common::config::ConfigError;
use focus_common::flc::{FlcConfig, OutputLevels, ZeroSumFallback};
use focus_control_unit::config::{load_config, load_config_from_str};
use focus_control_unit::controller::FocusController;
use focus_control_unit::error::{ConfigurationError, FlcError};
use tempfile::TempDir;

fn reference_toml_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/flc.toml")
}

#[test]
fn shipped_config_is_the_reference_deployment() {
    let config = load_config(&reference_toml_path()).unwrap();
    assert_eq!(config, FlcConfig::dynamic_focus(OutputLevels::TWO_FOUR_SIX));
}

#[test]
fn shipped_config_drives_the_controller() {
    let config = load_config(&reference_toml_path()).unwrap();
    let mut flc = FocusController::new(config);
    flc.setup().unwrap();
    let v = flc.run(45.0, 79000.0).unwrap();
    assert!((v - 5.6).abs() < 1e-9, "{v}");
}

#[test]
fn edited_copy_in_temp_dir() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flc.toml");
    let original = fs::read_to_string(reference_toml_path()).unwrap();
    let edited = original
        .replace("\"hold_last\"", "\"midpoint\"")
        .replace("points = [2.0, 4.0, 6.0]", "points = [0.0, 1.0, 2.0]")
        .replace("[2.0, 2.0, 4.0]", "[0.0, 0.0, 1.0]")
        .replace("[2.0, 4.0, 6.0]", "[0.0, 1.0, 2.0]")
        .replace("[4.0, 6.0, 6.0]", "[1.0, 2.0, 2.0]");
    fs::write(&path, edited).unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.controller.zero_sum_fallback, ZeroSumFallback::Midpoint);
    assert_eq!(
        config.consequent,
        FlcConfig::dynamic_focus(OutputLevels::ZERO_ONE_TWO).consequent
    );
}

#[test]
fn broken_files_are_reported() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("absent.toml");
    assert_eq!(
        load_config(&missing),
        Err(FlcError::Configuration(ConfigurationError::Schema(
            ConfigError::FileNotFound
        )))
    );

    let garbage = dir.path().join("garbage.toml");
    fs::write(&garbage, "this is = = not toml").unwrap();
    assert!(matches!(
        load_config(&garbage),
        Err(FlcError::Configuration(ConfigurationError::Schema(
            ConfigError::ParseError(_)
        )))
    ));
}

#[test]
fn empty_rule_list_fails_validation() {
    let original = fs::read_to_string(reference_toml_path()).unwrap();
    let without_rules = original.split("[[rules]]").next().unwrap();
    // Top-level key, so it must precede the first table header.
    let toml = format!("rules = []\n{without_rules}");
    assert!(matches!(
        load_config_from_str(&toml),
        Err(FlcError::Configuration(ConfigurationError::EmptyRuleBase))
    ));
}

#[test]
fn zero_cycle_time_is_rejected() {
    let original = fs::read_to_string(reference_toml_path()).unwrap();
    let toml = original.replace("cycle_time_us = 33333", "cycle_time_us = 0");
    assert!(matches!(
        load_config_from_str(&toml),
        Err(FlcError::Configuration(ConfigurationError::Schema(
            ConfigError::ValidationError(_)
        )))
    ));
}
