//! Environment configuration with documented defaults
//!
//! Loaded from TOML; every section and field is optional and falls back
//! to the values of the default 700 x 700 rabbit world.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    ParseError(#[from] toml::de::Error),
    /// Values parsed but are inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which spatial tree indexes the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeKind {
    #[default]
    Quad,
    Binary,
}

/// World extent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Width of the world rectangle `[0, width]`
    pub width: f32,
    /// Height of the world rectangle `[0, height]`
    pub height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 700.0,
            height: 700.0,
        }
    }
}

/// Clock settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Simulated seconds per tick
    pub step_duration: f32,
    /// Real milliseconds a driver waits between ticks
    pub delay_ms: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            step_duration: 1.0,
            delay_ms: 500,
        }
    }
}

/// Spatial index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub tree: TreeKind,
    /// Nodes at this depth keep items past capacity instead of splitting
    pub max_depth: u32,
    /// Radius of the circular field of view
    pub perception_radius: f32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            tree: TreeKind::Quad,
            max_depth: crate::spatial::DEFAULT_MAX_DEPTH,
            perception_radius: 150.0,
        }
    }
}

/// Physical limits given to spawned bodies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Radius of the circular body shape
    pub radius: f32,
    pub max_linear_speed: f32,
    pub max_linear_acceleration: f32,
    /// Radians per second
    pub max_angular_speed: f32,
    /// Radians per second squared
    pub max_angular_acceleration: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            radius: 20.0,
            max_linear_speed: 5.0,
            max_linear_acceleration: 0.5,
            max_angular_speed: PI / 4.0,
            max_angular_acceleration: PI / 10.0,
        }
    }
}

/// Full environment configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub world: WorldConfig,
    pub time: TimeConfig,
    pub index: IndexConfig,
    pub body: BodyConfig,
    /// Seed for body placement and driver influences
    pub seed: u64,
}

impl EnvironmentConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EnvironmentConfig = toml::from_str(content)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.world.width <= 0.0 || self.world.height <= 0.0 {
            return Err(format!(
                "world size must be positive (got {} x {})",
                self.world.width, self.world.height
            ));
        }

        if self.time.step_duration < 0.0 {
            return Err("step_duration must not be negative".into());
        }

        if self.index.perception_radius <= 0.0 {
            return Err("perception_radius must be positive".into());
        }

        // A body wider than the world can never be placed
        let diameter = self.body.radius * 2.0;
        if diameter >= self.world.width || diameter >= self.world.height {
            return Err(format!(
                "body diameter ({}) must be smaller than the world",
                diameter
            ));
        }

        if self.body.max_linear_speed < 0.0
            || self.body.max_linear_acceleration < 0.0
            || self.body.max_angular_speed < 0.0
            || self.body.max_angular_acceleration < 0.0
        {
            return Err("body limits must not be negative".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EnvironmentConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.world.width, 700.0);
        assert_eq!(config.index.tree, TreeKind::Quad);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EnvironmentConfig::from_toml_str(
            r#"
            seed = 7

            [world]
            width = 400.0

            [index]
            tree = "binary"
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.world.width, 400.0);
        assert_eq!(config.world.height, 700.0);
        assert_eq!(config.index.tree, TreeKind::Binary);
        assert_eq!(config.body.max_linear_speed, 5.0);
    }

    #[test]
    fn test_invalid_world_is_rejected() {
        let err = EnvironmentConfig::from_toml_str("[world]\nwidth = -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_bad_toml_is_a_parse_error() {
        let err = EnvironmentConfig::from_toml_str("[world\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
