//! Flattening of bar generations into vertex and index arrays.

use rayon::prelude::*;

use super::{Bar, SpectrumHistory};
use crate::error::{ConfigError, FrameError};
use crate::params::SpectrumConfig;
use crate::vertex::{
    as_floats, bar_vertex_base, quad_indices, Vertex, INDICES_PER_BAR, VERTICES_PER_BAR,
};

/// Vertex and index arrays for the full G × B bar history
///
/// Generation `g` always occupies vertices `[4·B·g, 4·B·(g+1))` and indices
/// `[6·B·g, 6·B·(g+1))`, so generations can be written independently.
pub struct GeometryEmitter {
    bar_count: usize,
    generations: usize,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl GeometryEmitter {
    /// Allocate zeroed arrays for the configured history
    pub fn new(config: &SpectrumConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            bar_count: config.bar_count,
            generations: config.generations,
            vertices: vec![Vertex::default(); config.vertex_count()],
            indices: vec![0; config.index_count()],
        })
    }

    fn vertices_per_generation(&self) -> usize {
        self.bar_count * VERTICES_PER_BAR
    }

    fn indices_per_generation(&self) -> usize {
        self.bar_count * INDICES_PER_BAR
    }

    /// Write one generation's quads into its fixed slice
    pub fn transform(
        &mut self,
        history: &SpectrumHistory,
        generation: usize,
    ) -> Result<(), FrameError> {
        if generation >= self.generations {
            return Err(FrameError::GenerationOutOfRange {
                generation,
                generations: self.generations,
            });
        }
        let bars = history.generation(generation)?;

        let vertex_span = self.vertices_per_generation();
        let index_span = self.indices_per_generation();
        let vertices = &mut self.vertices[generation * vertex_span..(generation + 1) * vertex_span];
        let indices = &mut self.indices[generation * index_span..(generation + 1) * index_span];
        emit_generation(bars, generation, self.bar_count, vertices, indices);
        Ok(())
    }

    /// Write every generation, one rayon task per generation
    ///
    /// Returns once all tasks have finished. The first failing generation's
    /// error is returned; the arrays must then be treated as incomplete.
    pub fn transform_all(&mut self, history: &SpectrumHistory) -> Result<(), FrameError> {
        let bar_count = self.bar_count;
        let vertex_span = self.vertices_per_generation();
        let index_span = self.indices_per_generation();

        self.vertices
            .par_chunks_mut(vertex_span)
            .zip(self.indices.par_chunks_mut(index_span))
            .enumerate()
            .try_for_each(|(generation, (vertices, indices))| {
                let bars = history.generation(generation)?;
                emit_generation(bars, generation, bar_count, vertices, indices);
                Ok(())
            })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Vertices as flat floats (32 per bar)
    pub fn vertex_floats(&self) -> &[f32] {
        as_floats(&self.vertices)
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Vertex array together with a writable index array, for in-place reordering
    pub fn split_mut(&mut self) -> (&[Vertex], &mut [u32]) {
        (&self.vertices, &mut self.indices)
    }
}

fn emit_generation(
    bars: &[Bar],
    generation: usize,
    bar_count: usize,
    vertices: &mut [Vertex],
    indices: &mut [u32],
) {
    debug_assert_eq!(bars.len(), bar_count);

    let quads = bars
        .iter()
        .zip(vertices.chunks_exact_mut(VERTICES_PER_BAR))
        .zip(indices.chunks_exact_mut(INDICES_PER_BAR))
        .enumerate();

    for (bar_index, ((bar, quad_vertices), quad)) in quads {
        let color = bar.color.to_array();
        for (vertex, corner) in quad_vertices.iter_mut().zip(bar.corners()) {
            *vertex = Vertex {
                position: corner.to_array(),
                color,
            };
        }
        quad.copy_from_slice(&quad_indices(bar_vertex_base(
            bar_index, generation, bar_count,
        )));
    }
}
