//! Synthetic spectrum producer for running without an audio device.
//!
//! A background thread synthesizes a short test signal, runs it through a
//! windowed FFT and publishes one magnitude per bar to the mailbox at a
//! fixed interval, independent of the frame rate.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::{PI, TAU};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::ConfigError;
use crate::mailbox::SpectrumPublisher;
use crate::params::SourceConfig;

/// Windowed FFT reduced to one magnitude per bar
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    window: Vec<f32>,
    bar_bins: Vec<Range<usize>>,
    /// Converts a raw bin norm into bar height
    normalization: f32,
}

impl SpectrumAnalyzer {
    pub fn new(config: &SourceConfig, bar_count: usize) -> Result<Self, ConfigError> {
        config.validate()?;
        if bar_count == 0 {
            return Err(ConfigError::ZeroBarCount);
        }

        let fft_size = config.fft_size;
        let mut planner = FftPlanner::new();
        Ok(Self {
            fft: planner.plan_fft_forward(fft_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            window: (0..fft_size).map(|i| hann_window(i, fft_size)).collect(),
            bar_bins: bar_bins(config, bar_count),
            normalization: 2.0 / fft_size as f32 * config.magnitude_scale,
        })
    }

    /// FFT bin range feeding each bar, log-spaced over the frequency range
    pub fn bar_bins(&self) -> &[Range<usize>] {
        &self.bar_bins
    }

    /// Analyze one block; samples beyond the FFT size are ignored, missing
    /// samples are zero
    pub fn analyze(&mut self, samples: &[f32]) -> Vec<f32> {
        for (i, (slot, &w)) in self.buffer.iter_mut().zip(&self.window).enumerate() {
            let sample = samples.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.buffer);

        self.bar_bins
            .iter()
            .map(|bins| {
                self.buffer[bins.clone()]
                    .iter()
                    .map(|c| c.norm())
                    .fold(0.0, f32::max)
                    * self.normalization
            })
            .collect()
    }
}

/// Log-spaced partition of `[min_frequency_hz, max_frequency_hz]` into FFT bins
///
/// Every range holds at least one bin below Nyquist. Low bars may share a bin
/// when the FFT is too coarse to separate them.
fn bar_bins(config: &SourceConfig, bar_count: usize) -> Vec<Range<usize>> {
    let nyquist = config.fft_size / 2;
    let ratio = config.max_frequency_hz / config.min_frequency_hz;
    let edge = |i: usize| config.min_frequency_hz * ratio.powf(i as f32 / bar_count as f32);

    (0..bar_count)
        .map(|i| {
            let start = config.hz_to_bin(edge(i)).min(nyquist - 1);
            let end = config.hz_to_bin(edge(i + 1)).clamp(start + 1, nyquist);
            start..end
        })
        .collect()
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

/// Fill `out` with the demo signal starting at absolute sample `start`
///
/// A pulsing bass note, a slowly sweeping mid tone and a quiet high partial.
pub fn synthesize_block(config: &SourceConfig, start: u64, out: &mut [f32]) {
    let rate = config.sample_rate_hz as f32;
    for (offset, sample) in out.iter_mut().enumerate() {
        let t = (start + offset as u64) as f32 / rate;

        // 2 Hz beat envelope on the bass
        let beat = 0.5 + 0.5 * (TAU * 2.0 * t).cos();
        let bass = beat * (TAU * 55.0 * t).sin();

        let sweep_hz = 440.0 + 220.0 * (TAU * 0.1 * t).sin();
        let mid = 0.5 * (TAU * sweep_hz * t).sin();

        let high = 0.2 * (TAU * 3520.0 * t).sin();

        *sample = 0.5 * (bass + mid + high);
    }
}

/// Background thread publishing synthesized spectra
pub struct SyntheticSpectrumSource {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SyntheticSpectrumSource {
    /// Start publishing `bar_count` magnitudes every `update_interval_ms`
    pub fn spawn(
        config: SourceConfig,
        bar_count: usize,
        publisher: SpectrumPublisher,
    ) -> Result<Self, ConfigError> {
        let mut analyzer = SpectrumAnalyzer::new(&config, bar_count)?;
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let interval = Duration::from_millis(config.update_interval_ms);
        let hop = config.sample_rate_hz as u64 * config.update_interval_ms / 1000;

        tracing::info!(
            bar_count,
            fft_size = config.fft_size,
            interval_ms = config.update_interval_ms,
            "Synthetic spectrum source started"
        );

        let handle = thread::spawn(move || {
            let mut samples = vec![0.0; config.fft_size];
            let mut cursor = 0u64;

            while flag.load(Ordering::Acquire) {
                synthesize_block(&config, cursor, &mut samples);
                publisher.publish(analyzer.analyze(&samples));
                cursor += hop;
                thread::sleep(interval);
            }
        });

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the thread and wait for it to exit
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Spectrum source thread panicked");
            }
        }
    }
}

impl Drop for SyntheticSpectrumSource {
    fn drop(&mut self) {
        self.stop();
    }
}
