//! Synthetic spectrum source configuration.

use serde::Deserialize;

use crate::error::ConfigError;

/// FFT analysis configuration for the demo spectrum source
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Sample rate of the synthesized signal (Hz)
    pub sample_rate_hz: usize,

    /// FFT window size (must be power of 2)
    pub fft_size: usize,

    /// Snapshot publish interval (milliseconds)
    /// 50 = 20 Hz, deliberately slower than the frame rate
    pub update_interval_ms: u64,

    /// Lowest frequency mapped onto bar 0 (Hz)
    pub min_frequency_hz: f32,

    /// Highest frequency mapped onto the last bar (Hz)
    pub max_frequency_hz: f32,

    /// Scale from normalized FFT magnitude to bar height
    pub magnitude_scale: f32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            fft_size: 4096,
            update_interval_ms: 50,
            min_frequency_hz: 20.0,
            max_frequency_hz: 20000.0,
            magnitude_scale: 4.0,
        }
    }
}

impl SourceConfig {
    /// Convert frequency (Hz) to FFT bin index
    pub fn hz_to_bin(&self, hz: f32) -> usize {
        ((hz * self.fft_size as f32) / self.sample_rate_hz as f32) as usize
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 2 {
            return Err(ConfigError::InvalidSource(format!(
                "FFT size must be a power of 2 of at least 2, got {}",
                self.fft_size
            )));
        }
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::InvalidSource(
                "sample rate must be > 0".to_string(),
            ));
        }
        if !(self.min_frequency_hz > 0.0 && self.min_frequency_hz < self.max_frequency_hz) {
            return Err(ConfigError::InvalidSource(format!(
                "frequency range {}..{} Hz is empty",
                self.min_frequency_hz, self.max_frequency_hz
            )));
        }
        Ok(())
    }
}
