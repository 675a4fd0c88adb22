//! Aggregate configuration, loadable from TOML.

use std::path::Path;

use serde::Deserialize;

use super::{CameraPreset, DepthSortConfig, ParticleConfig, SourceConfig, SpectrumConfig};
use crate::error::ConfigError;

/// Complete visualizer configuration
///
/// Every section is optional in TOML; missing sections and fields fall back
/// to their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub spectrum: SpectrumConfig,
    pub particles: ParticleConfig,
    pub depth_sort: DepthSortConfig,
    pub source: SourceConfig,
    pub camera: CameraPreset,
}

impl VisualizerConfig {
    /// Parse configuration from a TOML string and validate it
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.spectrum.validate()?;
        self.particles.validate(self.spectrum.generations)?;
        self.depth_sort.validate()?;
        self.source.validate()?;
        Ok(())
    }
}
