//! Configuration loading with semantic validation.
//!
//! Parsing goes through [`ConfigLoader`]; the result is then checked by
//! building a throw-away [`InferenceEngine`], so every error `setup()` would
//! raise is reported at load time instead.

use std::path::Path;

use focus_common::config::ConfigLoader;
use focus_common::flc::FlcConfig;
use tracing::debug;

use crate::controller::INPUT_COUNT;
use crate::error::{ConfigurationError, FlcError};
use crate::fuzzy::inference::InferenceEngine;

/// Load and validate a controller configuration from a TOML file.
///
/// # Errors
///
/// `FlcError::Configuration` wrapping either the file/parse error
/// (`ConfigurationError::Schema`) or the first semantic error found.
pub fn load_config(path: &Path) -> Result<FlcConfig, FlcError> {
    let config = FlcConfig::load(path).map_err(ConfigurationError::from)?;
    validate(&config)?;
    debug!(path = %path.display(), rules = config.rules.len(), "config loaded");
    Ok(config)
}

/// [`load_config`] from an in-memory TOML document.
pub fn load_config_from_str(content: &str) -> Result<FlcConfig, FlcError> {
    let config = FlcConfig::load_str(content).map_err(ConfigurationError::from)?;
    validate(&config)?;
    Ok(config)
}

/// Semantic validation of a parsed configuration.
pub fn validate(config: &FlcConfig) -> Result<(), ConfigurationError> {
    if config.antecedents.len() != INPUT_COUNT {
        return Err(ConfigurationError::AntecedentCount {
            expected: INPUT_COUNT,
            actual: config.antecedents.len(),
        });
    }
    InferenceEngine::build(config).map(drop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_common::config::ConfigError;
    use focus_common::flc::{Combinator, ZeroSumFallback};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[controller]
zero_sum_fallback = "midpoint"

[[antecedents]]
name = "distance"
universe = { start = 0.0, stop = 10.0, step = 5.0 }
terms = [{ name = "Near", triangle = [0.0, 0.0, 10.0] }]

[[antecedents]]
name = "beam_width"
universe = { points = [1.0, 2.0] }
terms = [{ name = "Large", triangle = [1.0, 1.0, 2.0] }]

[consequent]
name = "voltage"
universe = { points = [0.0, 1.0, 2.0] }
terms = [{ name = "Low", triangle = [0.0, 0.0, 1.0] }]

[[rules]]
combinator = "or"
when = [{ variable = "distance", term = "Near" }, { variable = "beam_width", term = "Large" }]
then = "Low"
"#;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.shared.service_name, "dynfocus");
        assert_eq!(config.controller.zero_sum_fallback, ZeroSumFallback::Midpoint);
        assert!(!config.controller.strict_overrun);
        assert_eq!(config.rules[0].combinator, Combinator::Or);
        assert_eq!(config.antecedents[0].universe.samples().unwrap(), vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn loads_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.consequent.name, "voltage");
    }

    #[test]
    fn missing_file_is_schema_error() {
        let err = load_config(Path::new("/nonexistent/flc.toml")).unwrap_err();
        assert_eq!(
            err,
            FlcError::Configuration(ConfigurationError::Schema(ConfigError::FileNotFound))
        );
    }

    #[test]
    fn missing_combinator_is_parse_error() {
        let toml = MINIMAL.replace("combinator = \"or\"\n", "");
        assert!(matches!(
            load_config_from_str(&toml),
            Err(FlcError::Configuration(ConfigurationError::Schema(
                ConfigError::ParseError(_)
            )))
        ));
    }

    #[test]
    fn semantic_errors_surface_at_load() {
        let toml = MINIMAL.replace("term = \"Large\"", "term = \"Huge\"");
        assert!(matches!(
            load_config_from_str(&toml),
            Err(FlcError::Configuration(ConfigurationError::UnknownTerm { rule: 0, .. }))
        ));

        let toml = MINIMAL.replace("[1.0, 1.0, 2.0]", "[2.0, 1.0, 1.0]");
        assert!(matches!(
            load_config_from_str(&toml),
            Err(FlcError::Configuration(ConfigurationError::MalformedTerm { .. }))
        ));

        let toml = MINIMAL.replace("points = [1.0, 2.0]", "points = [2.0, 1.0]");
        assert!(matches!(
            load_config_from_str(&toml),
            Err(FlcError::Configuration(
                ConfigurationError::UniverseNotIncreasing { index: 1, .. }
            ))
        ));
    }

    #[test]
    fn reference_deployment_validates() {
        assert!(validate(&FlcConfig::default()).is_ok());
    }
}
