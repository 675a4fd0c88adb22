//! Aged spectrum-bar geometry: history ring, vertex emission and depth sorting.

mod depth_sort;
mod emitter;
mod history;

// Re-export public types
pub use depth_sort::{parallel_merge_sort, quantize_distance, DepthSorter, IndexDistance};
pub use emitter::GeometryEmitter;
pub use history::SpectrumHistory;

use glam::Vec4;

/// One frequency bucket's quad
///
/// Corners are `(x, y, z, age)`; all four share the same age and color.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bar {
    pub lower_left: Vec4,
    pub lower_right: Vec4,
    pub upper_left: Vec4,
    pub upper_right: Vec4,
    pub color: Vec4,
}

impl Bar {
    /// Corners in emission order (v0..v3)
    pub fn corners(&self) -> [Vec4; 4] {
        [
            self.lower_left,
            self.lower_right,
            self.upper_left,
            self.upper_right,
        ]
    }

    /// Generation count carried by the corners
    pub fn age(&self) -> f32 {
        self.lower_left.w
    }

    pub fn alpha(&self) -> f32 {
        self.color.w
    }

    /// Age by one generation: one step older and more transparent
    ///
    /// Positions are left untouched; the vertex stage recedes each vertex by
    /// its age.
    pub fn age_step(&mut self, alpha_decay: f32) {
        for corner in [
            &mut self.lower_left,
            &mut self.lower_right,
            &mut self.upper_left,
            &mut self.upper_right,
        ] {
            corner.w += 1.0;
        }
        self.color.w *= alpha_decay;
    }
}
