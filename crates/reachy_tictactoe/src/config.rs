//! Table configuration loaded from TOML.

use super::codec::{CodecConfig, Region};
use super::orchestrator::TurnConfig;
use super::safety::SafetyConfig;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Everything needed to set up a table.
///
/// Every field has a default, so an empty file is the reference rig.
#[derive(Debug, Clone, Default, PartialEq, Getters, Serialize, Deserialize)]
pub struct PlaygroundConfig {
    /// Board codec thresholds and regions.
    #[serde(default)]
    codec: CodecConfig,

    /// Coin-flip settings.
    #[serde(default)]
    turns: TurnConfig,

    /// Thermal limits.
    #[serde(default)]
    safety: SafetyConfig,
}

impl PlaygroundConfig {
    /// Creates a configuration from its parts.
    pub fn new(codec: CodecConfig, turns: TurnConfig, safety: SafetyConfig) -> Self {
        Self {
            codec,
            turns,
            safety,
        }
    }

    /// Loads and validates configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!("Config loaded successfully");
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::new(format!("Failed to render config: {}", e)))
    }

    /// Rejects values the table cannot run with.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_interval(
            "codec.cell_confidence_threshold",
            f64::from(*self.codec.cell_confidence_threshold()),
        )?;
        unit_interval(
            "codec.validity_confidence_threshold",
            f64::from(*self.codec.validity_confidence_threshold()),
        )?;
        unit_interval(
            "turns.robot_first_probability",
            *self.turns.robot_first_probability(),
        )?;

        for (row, regions) in self.codec.cell_regions().iter().enumerate() {
            for (col, region) in regions.iter().enumerate() {
                non_degenerate(&format!("codec.cell_regions[{row}][{col}]"), region)?;
            }
        }
        non_degenerate("codec.board_region", self.codec.board_region())?;

        let pause = *self.safety.pause_above_celsius();
        let resume = *self.safety.resume_below_celsius();
        if !pause.is_finite() || !resume.is_finite() || resume >= pause {
            return Err(ConfigError::new(format!(
                "safety.resume_below_celsius ({resume}) must be below safety.pause_above_celsius ({pause})"
            )));
        }
        if *self.safety.poll_interval_ms() == 0 {
            return Err(ConfigError::new(
                "safety.poll_interval_ms must be positive".to_string(),
            ));
        }
        if *self.safety.keep_alive_interval_ms() == 0 {
            return Err(ConfigError::new(
                "safety.keep_alive_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn unit_interval(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::new(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

fn non_degenerate(name: &str, region: &Region) -> Result<(), ConfigError> {
    if region.is_degenerate() {
        Err(ConfigError::new(format!("{name} {region} has zero area")))
    } else {
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = PlaygroundConfig::from_toml("").unwrap();
        assert_eq!(config, PlaygroundConfig::default());
        assert_eq!(*config.codec().cell_confidence_threshold(), 0.9);
        assert_eq!(*config.turns().robot_first_probability(), 0.5);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = PlaygroundConfig::from_toml(
            "[safety]\npause_above_celsius = 60.0\nresume_below_celsius = 55.0\n",
        )
        .unwrap();
        assert_eq!(*config.safety().pause_above_celsius(), 60.0);
        assert_eq!(*config.safety().poll_interval_ms(), 30_000);
        assert_eq!(*config.codec().validity_confidence_threshold(), 0.65);
    }

    #[test]
    fn test_inverted_hysteresis_rejected() {
        let err = PlaygroundConfig::from_toml(
            "[safety]\npause_above_celsius = 45.0\nresume_below_celsius = 50.0\n",
        )
        .unwrap_err();
        assert!(err.message.contains("resume_below_celsius"));
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        assert!(PlaygroundConfig::from_toml("[turns]\nrobot_first_probability = 1.5\n").is_err());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        assert!(
            PlaygroundConfig::from_toml("[codec]\ncell_confidence_threshold = -0.1\n").is_err()
        );
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        assert!(PlaygroundConfig::from_toml("[safety]\npoll_interval_ms = 0\n").is_err());
    }

    #[test]
    fn test_default_renders_and_parses_back() {
        let rendered = PlaygroundConfig::default().to_toml().unwrap();
        let parsed = PlaygroundConfig::from_toml(&rendered).unwrap();
        assert_eq!(parsed, PlaygroundConfig::default());
    }
}
