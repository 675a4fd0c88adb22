//! Spectrum history geometry parameters.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::vertex::{FLOATS_PER_BAR, INDICES_PER_BAR, VERTICES_PER_BAR};

/// Spectrum bar history configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    /// Number of frequency buckets per generation (B)
    pub bar_count: usize,

    /// Number of generations kept in the history (G)
    /// Generation 0 is always the newest snapshot.
    pub generations: usize,

    /// Alpha multiplier applied once per advance (0, 1]
    /// 1.0 = bars never fade
    pub alpha_decay: f32,

    /// Total width spanned by all bars (world units), centered on x = 0
    pub display_width: f32,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            bar_count: 1024,
            generations: 150,
            alpha_decay: 0.97,
            display_width: 2.0, // [-1, 1] in clip-space-like units
        }
    }
}

impl SpectrumConfig {
    /// Total bar quads across all generations (G × B)
    pub fn quad_count(&self) -> usize {
        self.bar_count * self.generations
    }

    /// Vertex count of one full frame (4 · G · B)
    pub fn vertex_count(&self) -> usize {
        self.quad_count() * VERTICES_PER_BAR
    }

    /// Flat float count of one full frame (32 · G · B)
    pub fn vertex_float_count(&self) -> usize {
        self.quad_count() * FLOATS_PER_BAR
    }

    /// Index count of one full frame (6 · G · B)
    pub fn index_count(&self) -> usize {
        self.quad_count() * INDICES_PER_BAR
    }

    /// Validate configuration (non-empty history, sane decay, u32-addressable)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bar_count == 0 {
            return Err(ConfigError::ZeroBarCount);
        }
        if self.generations == 0 {
            return Err(ConfigError::ZeroGenerations);
        }
        if !(self.alpha_decay > 0.0 && self.alpha_decay <= 1.0) {
            return Err(ConfigError::InvalidAlphaDecay(self.alpha_decay));
        }

        let vertices = self
            .bar_count
            .checked_mul(self.generations)
            .and_then(|quads| quads.checked_mul(VERTICES_PER_BAR))
            .unwrap_or(usize::MAX);
        if vertices > u32::MAX as usize {
            return Err(ConfigError::IndexSpaceOverflow { vertices });
        }
        Ok(())
    }
}
