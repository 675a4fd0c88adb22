//! Vertex layout shared by every geometry producer.
//!
//! All strides, offsets and index values are derived from the constants here.

use bytemuck::{Pod, Zeroable};

/// Vertex data for bars and particles (position + RGBA color)
///
/// `position` is `[x, y, z, age]`; the fourth component carries the
/// generation count so the vertex stage can fade and displace by age.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 4],
    pub color: [f32; 4],
}

/// Floats per vertex (4 position + 4 color)
pub const FLOATS_PER_VERTEX: usize = std::mem::size_of::<Vertex>() / std::mem::size_of::<f32>();

/// Vertices per bar quad
pub const VERTICES_PER_BAR: usize = 4;

/// Indices per bar quad (two triangles)
pub const INDICES_PER_BAR: usize = 6;

/// Floats per bar quad
pub const FLOATS_PER_BAR: usize = FLOATS_PER_VERTEX * VERTICES_PER_BAR;

/// First vertex index of `bar` in `generation`.
#[inline]
pub fn bar_vertex_base(bar: usize, generation: usize, bar_count: usize) -> u32 {
    (VERTICES_PER_BAR * (bar + bar_count * generation)) as u32
}

/// Triangle indices `(v0, v1, v2), (v1, v2, v3)` for the quad starting at `base`.
#[inline]
pub fn quad_indices(base: u32) -> [u32; INDICES_PER_BAR] {
    [base, base + 1, base + 2, base + 1, base + 2, base + 3]
}

/// Depth of a vertex along the view axis: `z − age`
///
/// The vertex stage recedes each vertex by its age, so older generations sit
/// farther from the camera.
#[inline]
pub fn vertex_depth(vertex: &Vertex) -> f32 {
    vertex.position[2] - vertex.position[3]
}

/// Reinterpret a vertex slice as flat floats for upload.
pub fn as_floats(vertices: &[Vertex]) -> &[f32] {
    bytemuck::cast_slice(vertices)
}
