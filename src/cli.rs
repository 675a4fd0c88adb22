//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::error::ConfigError;
use crate::params::{CameraPreset, DollyCamera, FixedCamera, VisualizerConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "fadewave")]
#[command(about = "Headless spectrum-history visualizer pipeline", long_about = None)]
pub struct Args {
    /// TOML configuration file (defaults are used when omitted)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of frames to render before exiting
    #[arg(long, value_name = "COUNT", default_value = "600")]
    pub frames: u64,

    /// Target frame rate of the driver loop
    #[arg(long, value_name = "FPS", default_value = "60")]
    pub fps: f32,

    /// Override the number of spectrum bars
    #[arg(long, value_name = "COUNT")]
    pub bars: Option<usize>,

    /// Override the generation depth of the history
    #[arg(long, value_name = "COUNT")]
    pub generations: Option<usize>,

    /// Override the parallel split depth of the depth sort
    #[arg(long, value_name = "DEPTH")]
    pub split_depth: Option<u32>,

    /// Camera preset: fixed, dolly
    #[arg(long, value_name = "PRESET")]
    pub camera_preset: Option<String>,

    /// Camera Z for the fixed preset (world units)
    #[arg(long, value_name = "Z")]
    pub camera_z: Option<f32>,

    /// Particle RNG seed
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

impl Args {
    /// Load the configuration file (if any) and apply command-line overrides
    pub fn load_config(&self) -> Result<VisualizerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => VisualizerConfig::load(path)?,
            None => VisualizerConfig::default(),
        };
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of `config`
    pub fn apply_overrides(&self, config: &mut VisualizerConfig) {
        if let Some(bars) = self.bars {
            config.spectrum.bar_count = bars;
        }
        if let Some(generations) = self.generations {
            config.spectrum.generations = generations;
        }
        if let Some(depth) = self.split_depth {
            config.depth_sort.split_depth = depth;
        }
        if let Some(seed) = self.seed {
            config.particles.seed = Some(seed);
        }
        if let Some(preset) = &self.camera_preset {
            config.camera = Self::parse_camera_preset(preset);
        }
        if let (Some(z), CameraPreset::Fixed(fixed)) = (self.camera_z, &mut config.camera) {
            fixed.z = z;
        }
    }

    fn parse_camera_preset(preset: &str) -> CameraPreset {
        match preset.to_lowercase().as_str() {
            "fixed" => CameraPreset::Fixed(FixedCamera::default()),
            "dolly" => CameraPreset::Dolly(DollyCamera::default()),
            other => {
                tracing::warn!("Unknown camera preset '{}', using fixed", other);
                CameraPreset::Fixed(FixedCamera::default())
            }
        }
    }
}
