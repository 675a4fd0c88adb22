//! Generation ring of aged spectrum bars.

use glam::Vec4;

use super::Bar;
use crate::error::{ConfigError, FrameError};
use crate::mailbox::{sanitize_magnitude, SpectrumSnapshot};
use crate::params::SpectrumConfig;

/// Fixed G × B history of bar generations, generation 0 newest
///
/// Storage is a ring of G physical slots of B bars each. Advancing rotates
/// the head index instead of copying slots, so slot contents never move.
pub struct SpectrumHistory {
    bars: Vec<Bar>,
    bar_count: usize,
    generations: usize,
    /// Physical slot currently holding generation 0
    head: usize,
    /// Generations written at least once; the rest stay zero-state
    live: usize,
    /// Horizontal extent `(left, right)` of each bar
    borders: Vec<(f32, f32)>,
    alpha_decay: f32,
}

impl SpectrumHistory {
    /// Create an all-zero history sized by configuration
    pub fn new(config: &SpectrumConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let half_width = config.display_width / 2.0;
        Ok(Self {
            bars: vec![Bar::default(); config.quad_count()],
            bar_count: config.bar_count,
            generations: config.generations,
            head: 0,
            live: 0,
            borders: split_interval(config.bar_count, -half_width, half_width),
            alpha_decay: config.alpha_decay,
        })
    }

    pub fn bar_count(&self) -> usize {
        self.bar_count
    }

    pub fn generations(&self) -> usize {
        self.generations
    }

    /// Number of generations that hold snapshot data
    pub fn live_generations(&self) -> usize {
        self.live
    }

    fn slot_range(&self, generation: usize) -> std::ops::Range<usize> {
        let slot = (self.head + generation) % self.generations;
        slot * self.bar_count..(slot + 1) * self.bar_count
    }

    /// Bars of one generation, left to right
    pub fn generation(&self, generation: usize) -> Result<&[Bar], FrameError> {
        if generation >= self.generations {
            return Err(FrameError::GenerationOutOfRange {
                generation,
                generations: self.generations,
            });
        }
        Ok(&self.bars[self.slot_range(generation)])
    }

    /// Single bar lookup; `None` when either index is out of range
    pub fn bar(&self, generation: usize, bar: usize) -> Option<&Bar> {
        self.generation(generation).ok()?.get(bar)
    }

    /// Push a new snapshot as generation 0, aging everything already stored
    ///
    /// Missing entries in a short `magnitudes` slice are read as 0, as are
    /// negative or non-finite values.
    pub fn advance(&mut self, loudness: f32, magnitudes: &[f32]) {
        // 1. Age live generations
        for generation in 0..self.live {
            let range = self.slot_range(generation);
            for bar in &mut self.bars[range] {
                bar.age_step(self.alpha_decay);
            }
        }

        // 2. Rotate: the oldest slot becomes generation 0
        self.head = (self.head + self.generations - 1) % self.generations;
        self.live = (self.live + 1).min(self.generations);

        // 3. Fill generation 0 from the snapshot
        let loudness = sanitize_magnitude(loudness);
        let bar_count = self.bar_count;
        let range = self.slot_range(0);
        for (i, (bar, &(left, right))) in self.bars[range]
            .iter_mut()
            .zip(self.borders.iter())
            .enumerate()
        {
            let height = sanitize_magnitude(magnitudes.get(i).copied().unwrap_or(0.0));
            let fraction = i as f32 / bar_count as f32;
            *bar = Bar {
                lower_left: Vec4::new(left, 0.0, 0.0, 0.0),
                lower_right: Vec4::new(right, 0.0, 0.0, 0.0),
                upper_left: Vec4::new(left, height, 0.0, 0.0),
                upper_right: Vec4::new(right, height, 0.0, 0.0),
                color: Vec4::new(loudness, 1.0 - fraction, fraction, 1.0),
            };
        }
    }

    /// Reset generation 0 to zero-state
    ///
    /// Restores a consistent newest generation after an interrupted `advance`.
    /// Older generations are left as they are.
    pub fn clear_newest(&mut self) {
        let range = self.slot_range(0);
        self.bars[range].fill(Bar::default());
    }

    /// Advance from a mailbox snapshot
    pub fn advance_snapshot(&mut self, snapshot: &SpectrumSnapshot) {
        self.advance(snapshot.loudness(), snapshot.magnitudes());
    }
}

/// Split `[min, max]` into `chunks` equal intervals
fn split_interval(chunks: usize, min: f32, max: f32) -> Vec<(f32, f32)> {
    let size = (max - min) / chunks as f32;
    (0..chunks)
        .map(|chunk| {
            (
                min + size * chunk as f32,
                min + size * (chunk + 1) as f32,
            )
        })
        .collect()
}
