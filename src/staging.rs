//! Shared vertex/index staging storage multiplexed between logical consumers.
//!
//! Bars and particles take turns in one pair of arrays sized for the largest
//! consumer. A consumer is selected, written, then handed to a [`DrawSink`]
//! before the next consumer is selected.

use std::collections::HashMap;

use crate::error::FrameError;

/// Logical consumer of the staging storage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferId {
    Bars,
    Particles,
}

/// How the draw collaborator should assemble a consumer's indices
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    Points,
}

/// Registered size limits of one consumer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferCapacity {
    pub vertex_floats: usize,
    pub indices: usize,
    pub primitive: Primitive,
}

/// Geometry staged for the active consumer
#[derive(Clone, Copy, Debug)]
pub struct StagedBatch<'a> {
    pub id: BufferId,
    pub primitive: Primitive,
    pub vertices: &'a [f32],
    pub indices: &'a [u32],
}

impl<'a> StagedBatch<'a> {
    /// Vertex data as raw bytes for upload
    pub fn vertex_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.vertices)
    }

    /// Index data as raw bytes for upload
    pub fn index_bytes(&self) -> &'a [u8] {
        bytemuck::cast_slice(self.indices)
    }
}

/// External draw collaborator
///
/// Receives each consumer's batch once per frame, bars before particles.
pub trait DrawSink {
    fn draw(&mut self, batch: StagedBatch<'_>);
}

/// Registry of logical consumers over one shared staging area
pub struct GpuBufferMultiplexer {
    registry: HashMap<BufferId, BufferCapacity>,
    vertices: Vec<f32>,
    indices: Vec<u32>,
    active: Option<BufferId>,
    staged_vertices: usize,
    staged_indices: usize,
}

impl GpuBufferMultiplexer {
    /// Register consumers and size the shared storage to the largest of them
    pub fn new(consumers: impl IntoIterator<Item = (BufferId, BufferCapacity)>) -> Self {
        let registry: HashMap<_, _> = consumers.into_iter().collect();
        let vertex_floats = registry.values().map(|c| c.vertex_floats).max().unwrap_or(0);
        let indices = registry.values().map(|c| c.indices).max().unwrap_or(0);

        tracing::debug!(
            consumers = registry.len(),
            vertex_floats,
            indices,
            "Staging storage allocated"
        );

        Self {
            registry,
            vertices: vec![0.0; vertex_floats],
            indices: vec![0; indices],
            active: None,
            staged_vertices: 0,
            staged_indices: 0,
        }
    }

    /// Make `id` the target of subsequent writes; clears whatever was staged
    pub fn select_buffer(&mut self, id: BufferId) -> Result<(), FrameError> {
        if !self.registry.contains_key(&id) {
            return Err(FrameError::UnknownBuffer(id));
        }
        self.active = Some(id);
        self.staged_vertices = 0;
        self.staged_indices = 0;
        Ok(())
    }

    pub fn capacity_of(&self, id: BufferId) -> Result<BufferCapacity, FrameError> {
        self.registry
            .get(&id)
            .copied()
            .ok_or(FrameError::UnknownBuffer(id))
    }

    pub fn active(&self) -> Option<BufferId> {
        self.active
    }

    /// Copy geometry into the active consumer's staging area
    ///
    /// Input larger than the consumer's registered capacity is rejected,
    /// never truncated.
    pub fn write(&mut self, vertexes: &[f32], indexes: &[u32]) -> Result<(), FrameError> {
        let id = self.active.ok_or(FrameError::NoActiveBuffer)?;
        let capacity = self.capacity_of(id)?;

        if vertexes.len() > capacity.vertex_floats || indexes.len() > capacity.indices {
            return Err(FrameError::CapacityExceeded {
                id,
                vertices: vertexes.len(),
                indices: indexes.len(),
                vertex_capacity: capacity.vertex_floats,
                index_capacity: capacity.indices,
            });
        }

        self.vertices[..vertexes.len()].copy_from_slice(vertexes);
        self.indices[..indexes.len()].copy_from_slice(indexes);
        self.staged_vertices = vertexes.len();
        self.staged_indices = indexes.len();
        Ok(())
    }

    /// The active consumer's staged geometry
    pub fn staged(&self) -> Result<StagedBatch<'_>, FrameError> {
        let id = self.active.ok_or(FrameError::NoActiveBuffer)?;
        let capacity = self.capacity_of(id)?;
        Ok(StagedBatch {
            id,
            primitive: capacity.primitive,
            vertices: &self.vertices[..self.staged_vertices],
            indices: &self.indices[..self.staged_indices],
        })
    }

    /// Total shared storage (vertex floats, indices)
    pub fn storage_len(&self) -> (usize, usize) {
        (self.vertices.len(), self.indices.len())
    }
}
