//! Configuration schema for racer-odds.
//!
//! Every section has defaults, so an empty YAML document is a valid config.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::board::DEFAULT_TRACK_LEN;

/// Configuration (and scenario) loading errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Board geometry.
    #[serde(default)]
    pub rules: RulesConfig,
    /// Exact enumeration settings.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Sampling mode settings.
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Log level and NDJSON outputs.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RulesConfig {
    /// Finish cell index; the track is cells `0..=track_len`.
    #[serde(default = "default_track_len")]
    pub track_len: u8,
}

fn default_track_len() -> u8 {
    DEFAULT_TRACK_LEN
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            track_len: default_track_len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Spread combinations over a rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Worker threads for the pool. None uses rayon's global pool.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Refuse exact enumeration above this many combinations.
    ///
    /// Five remaining racers need 5!·3^5 = 29160.
    #[serde(default = "default_max_exact_combinations")]
    pub max_exact_combinations: u64,
    /// Optional wall-clock budget. When it runs out the report is partial.
    #[serde(default)]
    pub time_budget_ms: Option<u64>,
}

fn default_parallel() -> bool {
    true
}

fn default_max_exact_combinations() -> u64 {
    1_000_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
            threads: None,
            max_exact_combinations: default_max_exact_combinations(),
            time_budget_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SamplingConfig {
    /// Use random trials instead of exact enumeration.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_trials")]
    pub trials: u64,
    #[serde(default)]
    pub seed: u64,
}

fn default_trials() -> u64 {
    100_000
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            trials: default_trials(),
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Append a `calc_done` NDJSON event here after each calculation.
    #[serde(default)]
    pub events_path: Option<String>,
    /// Write one NDJSON line per combination here (exact mode only).
    #[serde(default)]
    pub records_path: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            events_path: None,
            records_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.track_len < 2 {
            return Err(ConfigError::Invalid(format!(
                "rules.track_len must be at least 2, got {}",
                self.rules.track_len
            )));
        }
        if self.engine.threads == Some(0) {
            return Err(ConfigError::Invalid(
                "engine.threads must be positive".to_string(),
            ));
        }
        if self.engine.max_exact_combinations == 0 {
            return Err(ConfigError::Invalid(
                "engine.max_exact_combinations must be at least 1".to_string(),
            ));
        }
        if self.sampling.enabled && self.sampling.trials == 0 {
            return Err(ConfigError::Invalid(
                "sampling.trials must be positive when sampling is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_yaml() {
        // Load the checked-in config file from the repo
        let config = Config::load("../configs/default.yaml")
            .expect("Failed to load configs/default.yaml");

        assert_eq!(config.rules.track_len, 16);
        assert!(config.engine.parallel);
        assert_eq!(config.engine.max_exact_combinations, 1_000_000);
        assert_eq!(config.engine.time_budget_ms, None);
        assert!(!config.sampling.enabled);
        assert_eq!(config.sampling.trials, 100_000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_yaml_is_all_defaults() {
        let config = Config::from_yaml("{}").expect("empty mapping should parse");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_yaml_string() {
        let yaml = r#"
rules:
  track_len: 12

engine:
  parallel: false
  threads: 2
  time_budget_ms: 500

sampling:
  enabled: true
  trials: 1000
  seed: 9
"#;

        let config = Config::from_yaml(yaml).expect("Failed to parse YAML");
        assert_eq!(config.rules.track_len, 12);
        assert!(!config.engine.parallel);
        assert_eq!(config.engine.threads, Some(2));
        assert_eq!(config.engine.time_budget_ms, Some(500));
        assert!(config.sampling.enabled);
        assert_eq!(config.sampling.seed, 9);
        // Check defaults are applied
        assert_eq!(config.engine.max_exact_combinations, 1_000_000);
        assert_eq!(config.logging.events_path, None);
    }

    #[test]
    fn test_invalid_yaml_fails() {
        let invalid_yaml = "this is not: valid: yaml: {{{}}}";
        let result = Config::from_yaml(invalid_yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        for yaml in [
            "rules: {track_len: 1}",
            "engine: {threads: 0}",
            "engine: {max_exact_combinations: 0}",
            "sampling: {enabled: true, trials: 0}",
        ] {
            let err = Config::from_yaml(yaml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{yaml}: {err}");
        }
    }
}
