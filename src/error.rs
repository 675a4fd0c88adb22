//! Error types for configuration and per-frame geometry building.

use std::path::PathBuf;
use thiserror::Error;

use crate::staging::BufferId;

/// Errors raised while validating or loading configuration.
///
/// Every constructor in the crate validates its configuration up front, so a
/// `ConfigError` always surfaces at startup, never mid-frame.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Bar count B must be at least 1
    #[error("bar count must be greater than zero")]
    ZeroBarCount,

    /// Generation depth G must be at least 1
    #[error("generation count must be greater than zero")]
    ZeroGenerations,

    /// Alpha decay factor outside (0, 1]
    #[error("alpha decay must be in (0, 1], got {0}")]
    InvalidAlphaDecay(f32),

    /// Particle field would be empty
    #[error("particles per generation must be greater than zero")]
    ZeroParticles,

    /// Particle generation multiplier must be at least 1
    #[error("particle generation multiplier must be greater than zero")]
    ZeroGenerationMultiplier,

    /// Distance quantization scale must be finite and positive
    #[error("distance scale must be finite and positive, got {0}")]
    InvalidDistanceScale(f64),

    /// Vertex indices for the configured geometry do not fit in `u32`
    #[error("{vertices} vertices exceed the u32 index space")]
    IndexSpaceOverflow {
        /// Number of vertices the configuration would need.
        vertices: usize,
    },

    /// Spectrum source settings are unusable
    #[error("invalid spectrum source config: {0}")]
    InvalidSource(String),

    /// Failed to read a configuration file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while building or staging one frame's geometry.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Requested generation does not exist
    #[error("generation {generation} out of range (history holds {generations})")]
    GenerationOutOfRange {
        /// Requested generation index.
        generation: usize,
        /// Configured generation depth G.
        generations: usize,
    },

    /// Buffer id was never registered with the multiplexer
    #[error("buffer {0:?} is not registered")]
    UnknownBuffer(BufferId),

    /// `write` was called before any buffer was selected
    #[error("no logical buffer selected")]
    NoActiveBuffer,

    /// Write would overrun the active consumer's capacity
    #[error(
        "write to {id:?} exceeds capacity: {vertices} vertex floats / {indices} indices \
         (capacity {vertex_capacity} / {index_capacity})"
    )]
    CapacityExceeded {
        /// Consumer being written.
        id: BufferId,
        /// Vertex floats offered.
        vertices: usize,
        /// Indices offered.
        indices: usize,
        /// Registered vertex float capacity.
        vertex_capacity: usize,
        /// Registered index capacity.
        index_capacity: usize,
    },

    /// A parallel sub-task panicked inside a frame stage
    #[error("frame stage '{stage}' failed: {reason}")]
    StageFailed {
        /// Stage that was running.
        stage: &'static str,
        /// Panic payload, if it carried a message.
        reason: String,
    },
}

impl FrameError {
    /// Contract violations that must terminate the frame loop.
    ///
    /// Everything else only skips the current frame.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FrameError::UnknownBuffer(_)
                | FrameError::NoActiveBuffer
                | FrameError::CapacityExceeded { .. }
        )
    }
}
