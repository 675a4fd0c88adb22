//! Per-frame orchestration of the spectrum and particle pipelines.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::error::{ConfigError, FrameError};
use crate::mailbox::{SpectrumMailbox, SpectrumPublisher};
use crate::params::VisualizerConfig;
use crate::particles::ParticleField;
use crate::spectrum::{DepthSorter, GeometryEmitter, SpectrumHistory};
use crate::staging::{BufferCapacity, BufferId, DrawSink, GpuBufferMultiplexer, Primitive};
use crate::vertex::FLOATS_PER_VERTEX;

/// Summary of one rendered frame
#[derive(Clone, Copy, Debug)]
pub struct FrameStats {
    /// Frame number, starting at 0
    pub frame: u64,
    /// Sequence of the spectrum snapshot the frame was built from
    pub snapshot_sequence: u64,
    /// Bar vertex floats handed to the sink
    pub bar_vertex_floats: usize,
    pub bar_indices: usize,
    /// Particle vertex floats handed to the sink
    pub particle_vertex_floats: usize,
    pub particle_indices: usize,
    pub elapsed: Duration,
}

/// Owns all frame storage and runs the pipeline once per `render_frame`
pub struct Visualizer {
    history: SpectrumHistory,
    emitter: GeometryEmitter,
    sorter: DepthSorter,
    particles: ParticleField,
    staging: GpuBufferMultiplexer,
    mailbox: SpectrumMailbox,
    frame: u64,
    last_sequence: u64,
}

impl Visualizer {
    /// Allocate every buffer up front from a validated configuration
    pub fn new(config: &VisualizerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let history = SpectrumHistory::new(&config.spectrum)?;
        let emitter = GeometryEmitter::new(&config.spectrum)?;
        let sorter = DepthSorter::new(&config.depth_sort)?;
        let particles = ParticleField::new(&config.particles, config.spectrum.generations)?;

        let staging = GpuBufferMultiplexer::new([
            (
                BufferId::Bars,
                BufferCapacity {
                    vertex_floats: config.spectrum.vertex_float_count(),
                    indices: config.spectrum.index_count(),
                    primitive: Primitive::Triangles,
                },
            ),
            (
                BufferId::Particles,
                BufferCapacity {
                    vertex_floats: particles.len() * FLOATS_PER_VERTEX,
                    indices: particles.len(),
                    primitive: Primitive::Points,
                },
            ),
        ]);

        info!(
            bars = config.spectrum.bar_count,
            generations = config.spectrum.generations,
            particles = particles.len(),
            split_depth = sorter.split_depth(),
            "Visualizer initialized"
        );

        Ok(Self {
            history,
            emitter,
            sorter,
            particles,
            staging,
            mailbox: SpectrumMailbox::new(),
            frame: 0,
            last_sequence: 0,
        })
    }

    /// Handle for the spectrum producer
    pub fn publisher(&self) -> SpectrumPublisher {
        self.mailbox.publisher()
    }

    pub fn history(&self) -> &SpectrumHistory {
        &self.history
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    /// Frames rendered so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Build, sort, stage and draw one frame
    ///
    /// All geometry is built before anything is staged, so a failed stage
    /// leaves the sink untouched for this frame. A panic while advancing the
    /// history resets generation 0, so the next frame never reads a
    /// half-written slot; the later stages rebuild from the history each frame.
    pub fn render_frame<S: DrawSink + ?Sized>(
        &mut self,
        camera_z: f32,
        sink: &mut S,
    ) -> Result<FrameStats, FrameError> {
        let started = Instant::now();

        let snapshot = self.mailbox.latest();
        if self.frame > 0 && snapshot.sequence() == self.last_sequence {
            trace!(
                sequence = snapshot.sequence(),
                "No new spectrum snapshot, reusing the last one"
            );
        }
        self.last_sequence = snapshot.sequence();

        // Build
        let advanced = run_stage("advance_history", || {
            self.history.advance_snapshot(&snapshot);
            Ok(())
        });
        if let Err(err) = advanced {
            if matches!(err, FrameError::StageFailed { .. }) {
                self.history.clear_newest();
            }
            return Err(err);
        }
        run_stage("transform_bars", || self.emitter.transform_all(&self.history))?;
        run_stage("sort_bars", || {
            let (vertices, indices) = self.emitter.split_mut();
            self.sorter.sort_quads(vertices, indices, camera_z);
            Ok(())
        })?;
        run_stage("update_particles", || {
            self.particles.update();
            self.particles.emit();
            Ok(())
        })?;

        // Stage and draw
        self.staging.select_buffer(BufferId::Bars)?;
        self.staging
            .write(self.emitter.vertex_floats(), self.emitter.indices())?;
        sink.draw(self.staging.staged()?);

        self.staging.select_buffer(BufferId::Particles)?;
        self.staging
            .write(self.particles.vertex_floats(), self.particles.indices())?;
        sink.draw(self.staging.staged()?);

        let stats = FrameStats {
            frame: self.frame,
            snapshot_sequence: snapshot.sequence(),
            bar_vertex_floats: self.emitter.vertex_floats().len(),
            bar_indices: self.emitter.indices().len(),
            particle_vertex_floats: self.particles.vertex_floats().len(),
            particle_indices: self.particles.indices().len(),
            elapsed: started.elapsed(),
        };
        self.frame += 1;

        debug!(
            frame = stats.frame,
            elapsed_us = stats.elapsed.as_micros() as u64,
            "Frame rendered"
        );
        Ok(stats)
    }
}

/// Run one pipeline stage, turning a panic in it (or in any rayon task it
/// spawned) into `FrameError::StageFailed`
fn run_stage<T>(
    stage: &'static str,
    f: impl FnOnce() -> Result<T, FrameError>,
) -> Result<T, FrameError> {
    let started = Instant::now();
    let result = panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        FrameError::StageFailed {
            stage,
            reason: panic_message(payload.as_ref()),
        }
    })?;
    debug!(
        stage,
        elapsed_us = started.elapsed().as_micros() as u64,
        "Stage finished"
    );
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParticleConfig, SpectrumConfig};
    use crate::staging::StagedBatch;

    #[derive(Debug)]
    struct Recorded {
        id: BufferId,
        primitive: Primitive,
        vertices: Vec<f32>,
        indices: Vec<u32>,
    }

    #[derive(Default)]
    struct RecordingSink {
        batches: Vec<Recorded>,
    }

    impl DrawSink for RecordingSink {
        fn draw(&mut self, batch: StagedBatch<'_>) {
            self.batches.push(Recorded {
                id: batch.id,
                primitive: batch.primitive,
                vertices: batch.vertices.to_vec(),
                indices: batch.indices.to_vec(),
            });
        }
    }

    fn small_config() -> VisualizerConfig {
        VisualizerConfig {
            spectrum: SpectrumConfig {
                bar_count: 8,
                generations: 4,
                ..Default::default()
            },
            particles: ParticleConfig {
                particles_per_generation: 5,
                seed: Some(42),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_frame_draws_bars_then_particles() {
        let mut visualizer = Visualizer::new(&small_config()).unwrap();
        let mut sink = RecordingSink::default();

        let stats = visualizer.render_frame(1.0, &mut sink).unwrap();

        assert_eq!(sink.batches.len(), 2);
        let bars = &sink.batches[0];
        assert_eq!(bars.id, BufferId::Bars);
        assert_eq!(bars.primitive, Primitive::Triangles);
        assert_eq!(bars.vertices.len(), 32 * 8 * 4);
        assert_eq!(bars.indices.len(), 6 * 8 * 4);

        let particles = &sink.batches[1];
        assert_eq!(particles.id, BufferId::Particles);
        assert_eq!(particles.primitive, Primitive::Points);
        // 5 per generation × 4 generations × multiplier 2
        assert_eq!(particles.vertices.len(), 40 * 8);
        assert_eq!(particles.indices, (0..40).collect::<Vec<u32>>());

        assert_eq!(stats.frame, 0);
        assert_eq!(stats.bar_vertex_floats, 32 * 8 * 4);
        assert_eq!(stats.particle_indices, 40);
    }

    #[test]
    fn test_published_snapshot_becomes_generation_zero() {
        let mut visualizer = Visualizer::new(&small_config()).unwrap();
        let publisher = visualizer.publisher();
        let mut sink = RecordingSink::default();

        publisher.publish(vec![0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0]);
        let stats = visualizer.render_frame(1.0, &mut sink).unwrap();
        assert_eq!(stats.snapshot_sequence, 1);

        let heights: Vec<f32> = visualizer
            .history()
            .generation(0)
            .unwrap()
            .iter()
            .map(|bar| bar.upper_left.y)
            .collect();
        assert_eq!(heights, vec![0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0]);
    }

    #[test]
    fn test_silent_mailbox_still_renders() {
        let mut visualizer = Visualizer::new(&small_config()).unwrap();
        let mut sink = RecordingSink::default();

        for _ in 0..3 {
            visualizer.render_frame(1.0, &mut sink).unwrap();
        }
        assert_eq!(visualizer.frame_count(), 3);
        assert_eq!(sink.batches.len(), 6);
        for bar in visualizer.history().generation(0).unwrap() {
            assert_eq!(bar.upper_left.y, 0.0);
        }
    }

    #[test]
    fn test_bar_batch_is_back_to_front() {
        let mut visualizer = Visualizer::new(&small_config()).unwrap();
        let publisher = visualizer.publisher();
        let mut sink = RecordingSink::default();

        for frame in 0..6 {
            publisher.publish(vec![frame as f32; 8]);
            visualizer.render_frame(1.0, &mut sink).unwrap();
        }

        let bars = &sink.batches[sink.batches.len() - 2];
        let ages: Vec<f32> = bars
            .indices
            .chunks_exact(6)
            .map(|quad| bars.vertices[quad[0] as usize * FLOATS_PER_VERTEX + 3])
            .collect();
        // Older generations are farther away and come first
        for pair in ages.windows(2) {
            assert!(pair[0] >= pair[1], "ages out of order: {ages:?}");
        }
        assert!(ages[0] > ages[ages.len() - 1]);
    }

    #[test]
    fn test_failed_stage_draws_nothing() {
        let mut visualizer = Visualizer::new(&small_config()).unwrap();
        // History shallower than the emitter: transform_bars fails
        visualizer.history = SpectrumHistory::new(&SpectrumConfig {
            bar_count: 8,
            generations: 2,
            ..Default::default()
        })
        .unwrap();
        let mut sink = RecordingSink::default();

        let err = visualizer.render_frame(1.0, &mut sink).unwrap_err();

        assert!(matches!(err, FrameError::GenerationOutOfRange { .. }));
        assert!(!err.is_fatal());
        assert!(sink.batches.is_empty());
        assert_eq!(visualizer.frame_count(), 0);
    }

    #[test]
    fn test_stage_panic_in_worker_becomes_stage_failed() {
        let result: Result<(), FrameError> = run_stage("test_stage", || {
            rayon::join(|| (), || panic!("worker exploded"));
            Ok(())
        });

        match result {
            Err(FrameError::StageFailed { stage, reason }) => {
                assert_eq!(stage, "test_stage");
                assert!(reason.contains("worker exploded"), "reason: {reason}");
            }
            other => panic!("expected StageFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_stage_error_passes_through() {
        let result: Result<(), FrameError> = run_stage("test_stage", || {
            Err(FrameError::GenerationOutOfRange {
                generation: 9,
                generations: 4,
            })
        });
        let err = result.unwrap_err();
        assert!(matches!(err, FrameError::GenerationOutOfRange { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = small_config();
        config.spectrum.bar_count = 0;
        assert!(Visualizer::new(&config).is_err());
    }
}
