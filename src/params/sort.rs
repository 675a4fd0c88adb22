//! Depth sort parameters.

use serde::Deserialize;

use crate::error::ConfigError;

/// Depth sort configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DepthSortConfig {
    /// Requested recursion depth for parallel splitting
    /// 3 = up to 8 parallel leaves. Clamped to the worker pool size at runtime.
    pub split_depth: u32,

    /// Multiplier applied to camera distance before truncation to an integer key
    /// Large enough that truncation keeps distinct depths distinct.
    pub distance_scale: f64,
}

impl Default for DepthSortConfig {
    fn default() -> Self {
        Self {
            split_depth: 3,
            distance_scale: 1e7,
        }
    }
}

impl DepthSortConfig {
    /// Validate configuration (scale must be finite and positive)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.distance_scale.is_finite() && self.distance_scale > 0.0) {
            return Err(ConfigError::InvalidDistanceScale(self.distance_scale));
        }
        Ok(())
    }
}
