//! Particle field parameters.

use serde::Deserialize;

use crate::error::ConfigError;

/// Particle field configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Particles spawned per generation step
    pub particles_per_generation: usize,

    /// Particle lifetime in multiples of the spectrum generation depth
    /// Max age = spectrum generations × this multiplier.
    pub generation_multiplier: usize,

    /// Half-extent of the square spawn area in X and Y (world units)
    pub spawn_extent: f32,

    /// Z coordinate at which particles respawn (world units)
    pub spawn_depth: f32,

    /// Initial Z spacing between consecutive generations (world units)
    pub depth_spacing: f32,

    /// Particle color (RGBA)
    pub color: [f32; 4],

    /// RNG seed; `None` draws one from the OS at startup
    pub seed: Option<u64>,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            particles_per_generation: 100,
            generation_multiplier: 2,
            spawn_extent: 4.0,
            spawn_depth: 15.0,
            depth_spacing: 0.1,
            color: [1.0, 1.0, 1.0, 0.9],
            seed: None,
        }
    }
}

impl ParticleConfig {
    /// Number of generation slots the field cycles through
    ///
    /// Saturates on overflow; `validate` rejects such configurations.
    pub fn generation_span(&self, spectrum_generations: usize) -> usize {
        spectrum_generations.saturating_mul(self.generation_multiplier)
    }

    /// Total particle population
    ///
    /// Saturates on overflow; `validate` rejects such configurations.
    pub fn particle_count(&self, spectrum_generations: usize) -> usize {
        self.particles_per_generation
            .saturating_mul(self.generation_span(spectrum_generations))
    }

    /// Validate configuration against the spectrum generation depth
    pub fn validate(&self, spectrum_generations: usize) -> Result<(), ConfigError> {
        if self.particles_per_generation == 0 {
            return Err(ConfigError::ZeroParticles);
        }
        if self.generation_multiplier == 0 {
            return Err(ConfigError::ZeroGenerationMultiplier);
        }
        if spectrum_generations == 0 {
            return Err(ConfigError::ZeroGenerations);
        }
        let count = spectrum_generations
            .checked_mul(self.generation_multiplier)
            .and_then(|span| span.checked_mul(self.particles_per_generation))
            .unwrap_or(usize::MAX);
        if count > u32::MAX as usize {
            return Err(ConfigError::IndexSpaceOverflow { vertices: count });
        }
        Ok(())
    }
}
