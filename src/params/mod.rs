//! Parameter definitions with documented units and semantics.
//!
//! All tunables are collected here with:
//! - Documented ranges and meanings
//! - Defaults matching the reference visual
//! - Validation at construction time, never mid-frame

mod camera;
mod config;
mod particles;
mod sort;
mod source;
mod spectrum;

// Re-export all types
pub use camera::{CameraPreset, DollyCamera, FixedCamera};
pub use config::VisualizerConfig;
pub use particles::ParticleConfig;
pub use sort::DepthSortConfig;
pub use source::SourceConfig;
pub use spectrum::SpectrumConfig;
