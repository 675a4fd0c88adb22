//! Camera presets for the frame driver.

use serde::Deserialize;

/// Fixed camera position
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FixedCamera {
    /// Camera Z coordinate (world units)
    pub z: f32,
}

impl Default for FixedCamera {
    fn default() -> Self {
        Self { z: 1.0 }
    }
}

/// Camera that slowly dollies back and forth along Z
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DollyCamera {
    /// Center of the dolly motion (world units)
    pub base_z: f32,

    /// Dolly amplitude (world units, ±)
    pub amplitude: f32,

    /// Dolly frequency (Hz)
    pub frequency_hz: f32,
}

impl Default for DollyCamera {
    fn default() -> Self {
        Self {
            base_z: 1.5,
            amplitude: 0.5,
            frequency_hz: 0.05,
        }
    }
}

/// Camera preset selection
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "preset", rename_all = "lowercase")]
pub enum CameraPreset {
    /// Stationary camera
    Fixed(FixedCamera),

    /// Sinusoidal dolly along Z
    Dolly(DollyCamera),
}

impl Default for CameraPreset {
    fn default() -> Self {
        Self::Fixed(FixedCamera::default())
    }
}
