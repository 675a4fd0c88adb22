//! Camera Z position per frame for the depth sort.

use std::f32::consts::TAU;

use crate::params::{CameraPreset, DollyCamera};

/// Camera system driven by a preset
pub struct CameraSystem {
    preset: CameraPreset,
}

impl CameraSystem {
    /// Create new camera system with specified preset
    pub fn new(preset: CameraPreset) -> Self {
        Self { preset }
    }

    /// Camera Z coordinate at `time_s` seconds
    pub fn position_z(&self, time_s: f32) -> f32 {
        match &self.preset {
            CameraPreset::Fixed(params) => params.z,
            CameraPreset::Dolly(params) => Self::compute_dolly(params, time_s),
        }
    }

    /// Sinusoidal motion around `base_z`, starting at the center
    fn compute_dolly(p: &DollyCamera, time_s: f32) -> f32 {
        p.base_z + (time_s * p.frequency_hz * TAU).sin() * p.amplitude
    }
}
