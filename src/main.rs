//! fadewave - spectrum history visualizer pipeline
//!
//! Runs the full frame pipeline headless against a synthetic spectrum source:
//! every frame advances the bar history, rebuilds and depth-sorts the bar
//! geometry, steps the particle field and hands both batches to a draw sink.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, trace, warn};
use tracing_subscriber::EnvFilter;

use fadewave::camera::CameraSystem;
use fadewave::cli::Args;
use fadewave::source::SyntheticSpectrumSource;
use fadewave::staging::{DrawSink, StagedBatch};
use fadewave::visualizer::Visualizer;

/// Draw collaborator that only accounts for the bytes it would upload
#[derive(Default)]
struct UploadCounter {
    batches: u64,
    bytes: u64,
}

impl DrawSink for UploadCounter {
    fn draw(&mut self, batch: StagedBatch<'_>) {
        self.batches += 1;
        self.bytes += (batch.vertex_bytes().len() + batch.index_bytes().len()) as u64;
        trace!(
            id = ?batch.id,
            primitive = ?batch.primitive,
            vertex_floats = batch.vertices.len(),
            indices = batch.indices.len(),
            "Batch drawn"
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = args
        .load_config()
        .context("Failed to load configuration")?;

    let mut visualizer = Visualizer::new(&config).context("Failed to build visualizer")?;
    let mut source = SyntheticSpectrumSource::spawn(
        config.source.clone(),
        config.spectrum.bar_count,
        visualizer.publisher(),
    )
    .context("Failed to start spectrum source")?;
    let camera = CameraSystem::new(config.camera.clone());

    let frame_interval = Duration::from_secs_f32(1.0 / args.fps.max(1.0));
    let start = Instant::now();
    let mut sink = UploadCounter::default();
    let mut skipped = 0u64;

    info!(frames = args.frames, fps = args.fps, "fadewave is running");

    for _ in 0..args.frames {
        let frame_start = Instant::now();
        let camera_z = camera.position_z(start.elapsed().as_secs_f32());

        match visualizer.render_frame(camera_z, &mut sink) {
            Ok(stats) => {
                if stats.frame % 60 == 0 {
                    info!(
                        frame = stats.frame,
                        snapshot = stats.snapshot_sequence,
                        camera_z,
                        frame_ms = stats.elapsed.as_secs_f64() * 1000.0,
                        "Frame"
                    );
                }
            }
            Err(e) if e.is_fatal() => {
                source.stop();
                return Err(e).context("Frame pipeline contract violated");
            }
            Err(e) => {
                skipped += 1;
                warn!("Skipping frame: {}", e);
            }
        }

        if let Some(rest) = frame_interval.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }
    }

    source.stop();
    info!(
        frames = visualizer.frame_count(),
        skipped,
        batches = sink.batches,
        uploaded_mb = sink.bytes as f64 / (1024.0 * 1024.0),
        elapsed_s = start.elapsed().as_secs_f64(),
        "Done"
    );
    Ok(())
}
