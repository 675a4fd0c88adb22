//! Back-to-front ordering of bar quads.
//!
//! Each quad is keyed by the camera distance of its first vertex, quantized to
//! an integer. A vertex's depth is its z receded by its age, so the oldest
//! generation is farthest. Keys are merge sorted descending (farthest first) so
//! translucent bars blend correctly, then the index array is rebuilt in sorted
//! order.
//!
//! The sort splits the key array in halves with `rayon::join` down to a fixed
//! depth; below that each leaf sorts sequentially with the same merge.

use rayon::prelude::*;

use crate::error::ConfigError;
use crate::params::DepthSortConfig;
use crate::vertex::{quad_indices, vertex_depth, Vertex, INDICES_PER_BAR};

/// Sort key for one quad
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexDistance {
    /// Index of the quad's first vertex (v0)
    pub index: u32,
    /// `floor((camera_z − (z − age)) · scale)`
    pub quantized_distance: i64,
}

/// Quantize the camera-to-vertex distance along the view axis
///
/// Computed in f64 so the default scale of 1e7 keeps sub-micro differences.
#[inline]
pub fn quantize_distance(camera_z: f32, depth: f32, scale: f64) -> i64 {
    ((f64::from(camera_z) - f64::from(depth)) * scale).floor() as i64
}

/// Largest useful split depth for a pool of `threads` workers: ceil(log2(threads))
fn max_split_depth(threads: usize) -> u32 {
    if threads <= 1 {
        0
    } else {
        usize::BITS - (threads - 1).leading_zeros()
    }
}

/// Reusable depth sorter; keeps its key and scratch buffers between frames
pub struct DepthSorter {
    split_depth: u32,
    distance_scale: f64,
    keys: Vec<IndexDistance>,
    scratch: Vec<IndexDistance>,
}

impl DepthSorter {
    pub fn new(config: &DepthSortConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let limit = max_split_depth(rayon::current_num_threads());
        Ok(Self {
            split_depth: config.split_depth.min(limit),
            distance_scale: config.distance_scale,
            keys: Vec::new(),
            scratch: Vec::new(),
        })
    }

    /// Effective split depth after clamping to the worker pool
    pub fn split_depth(&self) -> u32 {
        self.split_depth
    }

    /// Keys from the last `collect_keys`, sorted once `sort` has run
    pub fn keys(&self) -> &[IndexDistance] {
        &self.keys
    }

    /// Build one key per six-index quad, in quad order
    ///
    /// A first index outside `vertices` reads as depth 0.
    pub fn collect_keys(&mut self, vertices: &[Vertex], indices: &[u32], camera_z: f32) {
        let scale = self.distance_scale;
        indices
            .par_chunks_exact(INDICES_PER_BAR)
            .map(|quad| {
                let index = quad[0];
                let depth = vertices
                    .get(index as usize)
                    .map_or(0.0, vertex_depth);
                IndexDistance {
                    index,
                    quantized_distance: quantize_distance(camera_z, depth, scale),
                }
            })
            .collect_into_vec(&mut self.keys);
    }

    /// Stable descending sort of the collected keys
    pub fn sort(&mut self) {
        self.scratch.resize(self.keys.len(), IndexDistance::default());
        parallel_merge_sort(&mut self.keys, &mut self.scratch, self.split_depth);
    }

    /// Re-expand the sorted keys into six indices per quad
    pub fn rebuild_indices(&self, indices: &mut [u32]) {
        indices
            .par_chunks_exact_mut(INDICES_PER_BAR)
            .zip(self.keys.par_iter())
            .for_each(|(quad, key)| quad.copy_from_slice(&quad_indices(key.index)));
    }

    /// Key, sort and rewrite `indices` back to front for a camera at `camera_z`
    pub fn sort_quads(&mut self, vertices: &[Vertex], indices: &mut [u32], camera_z: f32) {
        self.collect_keys(vertices, indices, camera_z);
        self.sort();
        self.rebuild_indices(indices);
    }
}

/// Stable merge sort, descending by `quantized_distance`
///
/// The array is halved `depth` times with `rayon::join`; each half owns the
/// matching half of `scratch`. Output does not depend on `depth`.
///
/// # Panics
///
/// Panics if `scratch` is shorter than `keys`.
pub fn parallel_merge_sort(keys: &mut [IndexDistance], scratch: &mut [IndexDistance], depth: u32) {
    let len = keys.len();
    let scratch = &mut scratch[..len];
    if len <= 1 {
        return;
    }
    if depth == 0 {
        merge_sort(keys, scratch);
        return;
    }

    let mid = len / 2;
    {
        let (left, right) = keys.split_at_mut(mid);
        let (left_scratch, right_scratch) = scratch.split_at_mut(mid);
        rayon::join(
            || parallel_merge_sort(left, left_scratch, depth - 1),
            || parallel_merge_sort(right, right_scratch, depth - 1),
        );
    }
    merge_halves(keys, mid, scratch);
}

fn merge_sort(keys: &mut [IndexDistance], scratch: &mut [IndexDistance]) {
    let len = keys.len();
    if len <= 1 {
        return;
    }

    let mid = len / 2;
    {
        let (left, right) = keys.split_at_mut(mid);
        let (left_scratch, right_scratch) = scratch.split_at_mut(mid);
        merge_sort(left, left_scratch);
        merge_sort(right, right_scratch);
    }
    merge_halves(keys, mid, scratch);
}

/// Merge the sorted runs `keys[..mid]` and `keys[mid..]`
///
/// Ties take the left run first, which keeps the sort stable.
fn merge_halves(keys: &mut [IndexDistance], mid: usize, scratch: &mut [IndexDistance]) {
    let scratch = &mut scratch[..keys.len()];
    scratch.copy_from_slice(keys);
    let (left, right) = scratch.split_at(mid);

    let (mut i, mut j) = (0, 0);
    for slot in keys.iter_mut() {
        let take_left = j >= right.len()
            || (i < left.len() && left[i].quantized_distance >= right[j].quantized_distance);
        if take_left {
            *slot = left[i];
            i += 1;
        } else {
            *slot = right[j];
            j += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SpectrumConfig;
    use crate::spectrum::{GeometryEmitter, SpectrumHistory};
    use crate::vertex::VERTICES_PER_BAR;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn keys(distances: &[i64]) -> Vec<IndexDistance> {
        distances
            .iter()
            .enumerate()
            .map(|(quad, &quantized_distance)| IndexDistance {
                index: (quad * 4) as u32,
                quantized_distance,
            })
            .collect()
    }

    fn sorted(mut keys: Vec<IndexDistance>, depth: u32) -> Vec<IndexDistance> {
        let mut scratch = vec![IndexDistance::default(); keys.len()];
        parallel_merge_sort(&mut keys, &mut scratch, depth);
        keys
    }

    fn quad_at(x: f32, age: f32) -> [Vertex; 4] {
        let vertex = |dx: f32, y: f32| Vertex {
            position: [x + dx, y, 0.0, age],
            color: [1.0; 4],
        };
        [
            vertex(0.0, 0.0),
            vertex(0.5, 0.0),
            vertex(0.0, 1.0),
            vertex(0.5, 1.0),
        ]
    }

    #[test]
    fn test_quantize_distance() {
        assert_eq!(quantize_distance(1.0, 0.0, 1e7), 10_000_000);
        assert_eq!(quantize_distance(0.0, 0.25, 10.0), -3);
        assert_eq!(quantize_distance(1.0, 1.0, 1e7), 0);
    }

    #[test]
    fn test_max_split_depth() {
        assert_eq!(max_split_depth(0), 0);
        assert_eq!(max_split_depth(1), 0);
        assert_eq!(max_split_depth(2), 1);
        assert_eq!(max_split_depth(5), 3);
        assert_eq!(max_split_depth(8), 3);
        assert_eq!(max_split_depth(9), 4);
    }

    #[test]
    fn test_farthest_first_with_stable_ties() {
        let result = sorted(keys(&[5, -3, 0, 5]), 1);
        let quads: Vec<u32> = result.iter().map(|k| k.index / 4).collect();
        let distances: Vec<i64> = result.iter().map(|k| k.quantized_distance).collect();
        assert_eq!(quads, vec![0, 3, 2, 1]);
        assert_eq!(distances, vec![5, 5, 0, -3]);
    }

    #[test]
    fn test_output_independent_of_split_depth() {
        let mut rng = StdRng::seed_from_u64(7);
        // Narrow key range forces many ties
        let distances: Vec<i64> = (0..1001).map(|_| rng.gen_range(-20..20)).collect();
        let input = keys(&distances);

        let mut expected = input.clone();
        expected.sort_by(|a, b| b.quantized_distance.cmp(&a.quantized_distance));

        for depth in 0..6 {
            assert_eq!(sorted(input.clone(), depth), expected, "depth {depth}");
        }
    }

    #[test]
    fn test_empty_and_single() {
        assert!(sorted(Vec::new(), 3).is_empty());
        assert_eq!(sorted(keys(&[9]), 3), keys(&[9]));
    }

    #[test]
    fn test_sort_quads_rewrites_indices_back_to_front() {
        let vertices: Vec<Vertex> = [quad_at(0.0, 0.0), quad_at(1.0, 2.0), quad_at(2.0, 1.0)]
            .concat();
        let mut indices: Vec<u32> = (0..3).flat_map(|quad| quad_indices(quad * 4)).collect();

        let mut sorter = DepthSorter::new(&DepthSortConfig::default()).unwrap();
        sorter.sort_quads(&vertices, &mut indices, 1.0);

        assert_eq!(
            indices,
            vec![4, 5, 6, 5, 6, 7, 8, 9, 10, 9, 10, 11, 0, 1, 2, 1, 2, 3]
        );
        let order: Vec<u32> = sorter.keys().iter().map(|k| k.index).collect();
        assert_eq!(order, vec![4, 8, 0]);
    }

    #[test]
    fn test_sort_quads_keeps_every_quad() {
        let vertices: Vec<Vertex> = (0..50)
            .flat_map(|quad| quad_at(quad as f32, (quad * 37 % 11) as f32))
            .collect();
        let mut indices: Vec<u32> = (0..50).flat_map(|quad| quad_indices(quad * 4)).collect();

        let mut sorter = DepthSorter::new(&DepthSortConfig::default()).unwrap();
        sorter.sort_quads(&vertices, &mut indices, 1.0);

        let mut bases: Vec<u32> = indices.chunks_exact(6).map(|quad| quad[0]).collect();
        bases.sort_unstable();
        assert_eq!(bases, (0..50).map(|quad| quad * 4).collect::<Vec<_>>());

        for pair in sorter.keys().windows(2) {
            assert!(pair[0].quantized_distance >= pair[1].quantized_distance);
        }
    }

    #[test]
    fn test_history_geometry_sorts_oldest_first() {
        let config = SpectrumConfig {
            bar_count: 2,
            generations: 3,
            ..Default::default()
        };
        let mut history = SpectrumHistory::new(&config).unwrap();
        let mut emitter = GeometryEmitter::new(&config).unwrap();
        for frame in 0..3 {
            history.advance(0.5, &[1.0 + frame as f32, 2.0]);
        }
        emitter.transform_all(&history).unwrap();

        let mut sorter = DepthSorter::new(&DepthSortConfig::default()).unwrap();
        let (vertices, indices) = emitter.split_mut();
        sorter.sort_quads(vertices, indices, 1.0);

        let ages: Vec<f32> = emitter
            .indices()
            .chunks_exact(INDICES_PER_BAR)
            .map(|quad| emitter.vertices()[quad[0] as usize].position[3])
            .collect();
        assert_eq!(ages, vec![2.0, 2.0, 1.0, 1.0, 0.0, 0.0]);

        // Equal ages keep bar order
        let first = emitter.indices()[0] as usize;
        assert_eq!(first, 2 * config.bar_count * VERTICES_PER_BAR);
    }

    #[test]
    fn test_split_depth_is_clamped_to_pool() {
        let sorter = DepthSorter::new(&DepthSortConfig {
            split_depth: 40,
            ..Default::default()
        })
        .unwrap();
        assert!(sorter.split_depth() <= max_split_depth(rayon::current_num_threads()));
    }

    #[test]
    fn test_rejects_invalid_scale() {
        let config = DepthSortConfig {
            distance_scale: 0.0,
            ..Default::default()
        };
        assert!(DepthSorter::new(&config).is_err());
    }
}
