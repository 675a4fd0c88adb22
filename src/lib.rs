//! fadewave library - aged spectrum-bar history with depth-sorted geometry

pub mod camera;
pub mod cli;
pub mod error;
pub mod mailbox;
pub mod params;
pub mod particles;
pub mod source;
pub mod spectrum;
pub mod staging;
pub mod vertex;
pub mod visualizer;
