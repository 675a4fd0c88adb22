//! Property-based tests for the history, geometry and depth sort.
//!
//! Checks buffer sizing, alpha decay, sort ordering and split-depth
//! independence using proptest for randomized input generation.

use proptest::prelude::*;
use fadewave::params::{DepthSortConfig, SpectrumConfig};
use fadewave::spectrum::{
    parallel_merge_sort, DepthSorter, GeometryEmitter, IndexDistance, SpectrumHistory,
};

fn spectrum_config(bar_count: usize, generations: usize, alpha_decay: f32) -> SpectrumConfig {
    SpectrumConfig {
        bar_count,
        generations,
        alpha_decay,
        ..Default::default()
    }
}

fn keys_from(distances: &[i64]) -> Vec<IndexDistance> {
    distances
        .iter()
        .enumerate()
        .map(|(quad, &quantized_distance)| IndexDistance {
            index: (quad * 4) as u32,
            quantized_distance,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Vertex floats are always 32·G·B and indices 6·G·B, whatever was published.
    #[test]
    fn geometry_lengths_are_fixed(
        bar_count in 1usize..40,
        generations in 1usize..12,
        snapshots in prop::collection::vec(prop::collection::vec(-5.0f32..5.0, 0..50), 0..20),
    ) {
        let config = spectrum_config(bar_count, generations, 0.9);
        let mut history = SpectrumHistory::new(&config).unwrap();
        let mut emitter = GeometryEmitter::new(&config).unwrap();

        for snapshot in &snapshots {
            history.advance(0.5, snapshot);
            emitter.transform_all(&history).unwrap();
            prop_assert_eq!(emitter.vertex_floats().len(), 32 * generations * bar_count);
            prop_assert_eq!(emitter.indices().len(), 6 * generations * bar_count);
        }
    }

    /// After k advances the oldest written bar carries alpha decay^k.
    #[test]
    fn alpha_follows_decay_power(
        decay in 0.05f32..=1.0,
        steps in 1usize..30,
    ) {
        let generations = steps + 1;
        let mut history = SpectrumHistory::new(&spectrum_config(2, generations, decay)).unwrap();
        history.advance(1.0, &[1.0, 1.0]);
        for _ in 0..steps {
            history.advance(0.0, &[]);
        }

        let bar = history.bar(steps, 0).unwrap();
        let expected = decay.powi(steps as i32);
        prop_assert!((bar.alpha() - expected).abs() <= 1e-5 + expected * 1e-4,
            "alpha {} != {}", bar.alpha(), expected);
        prop_assert_eq!(bar.age(), steps as f32);
    }

    /// Sorting matches a stable descending sort for every split depth.
    #[test]
    fn sort_matches_stable_descending(
        distances in prop::collection::vec(-1000i64..1000, 0..600),
        depth in 0u32..6,
    ) {
        let input = keys_from(&distances);
        let mut expected = input.clone();
        expected.sort_by(|a, b| b.quantized_distance.cmp(&a.quantized_distance));

        let mut keys = input;
        let mut scratch = vec![IndexDistance::default(); keys.len()];
        parallel_merge_sort(&mut keys, &mut scratch, depth);
        prop_assert_eq!(keys, expected);
    }

    /// Rebuilt indices are a permutation of whole quads, farthest first.
    #[test]
    fn sorted_indices_keep_every_quad(
        bar_count in 1usize..16,
        generations in 1usize..10,
        frames in 1usize..15,
        camera_z in -2.0f32..5.0,
    ) {
        let config = spectrum_config(bar_count, generations, 0.9);
        let mut history = SpectrumHistory::new(&config).unwrap();
        let mut emitter = GeometryEmitter::new(&config).unwrap();
        let mut sorter = DepthSorter::new(&DepthSortConfig::default()).unwrap();

        for frame in 0..frames {
            history.advance(0.3, &vec![frame as f32; bar_count]);
        }
        emitter.transform_all(&history).unwrap();
        let (vertices, indices) = emitter.split_mut();
        sorter.sort_quads(vertices, indices, camera_z);

        let quads = bar_count * generations;
        let mut bases: Vec<u32> = emitter.indices().chunks_exact(6).map(|quad| quad[0]).collect();
        for quad in emitter.indices().chunks_exact(6) {
            let b = quad[0];
            prop_assert_eq!(quad, &[b, b + 1, b + 2, b + 1, b + 2, b + 3][..]);
        }
        bases.sort_unstable();
        prop_assert_eq!(bases, (0..quads as u32).map(|q| q * 4).collect::<Vec<_>>());

        for pair in sorter.keys().windows(2) {
            prop_assert!(pair[0].quantized_distance >= pair[1].quantized_distance);
        }
    }
}
