//! Recycled point-particle field drifting behind the spectrum bars.

use glam::{Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::error::ConfigError;
use crate::params::ParticleConfig;
use crate::vertex::{as_floats, Vertex};

/// One point particle
///
/// Age counts update steps since the last respawn and is carried to the
/// vertex shader in the position's fourth component.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub age: f32,
    pub color: Vec4,
}

/// Fixed-size particle population, one chunk of particles per generation slot
pub struct ParticleField {
    particles: Vec<Particle>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    per_generation: usize,
    max_age: f32,
    spawn_extent: f32,
    spawn_depth: f32,
    color: Vec4,
    seed: u64,
    step: u64,
}

impl ParticleField {
    /// Create the field with generation `g` aged `g` steps and pushed back `g · depth_spacing`
    pub fn new(config: &ParticleConfig, spectrum_generations: usize) -> Result<Self, ConfigError> {
        config.validate(spectrum_generations)?;

        let count = config.particle_count(spectrum_generations);
        let per_generation = config.particles_per_generation;
        let seed = config.seed.unwrap_or_else(rand::random);
        let color = Vec4::from_array(config.color);
        let extent = config.spawn_extent;

        let mut particles = vec![Particle::default(); count];
        particles
            .par_chunks_mut(per_generation)
            .enumerate()
            .for_each(|(generation, chunk)| {
                let mut rng = chunk_rng(seed, 0, generation);
                let depth = config.spawn_depth - generation as f32 * config.depth_spacing;
                for particle in chunk {
                    *particle = Particle {
                        position: Vec3::new(
                            spawn_coordinate(&mut rng, extent),
                            spawn_coordinate(&mut rng, extent),
                            depth,
                        ),
                        age: generation as f32,
                        color,
                    };
                }
            });

        tracing::debug!(
            count,
            max_age = config.generation_span(spectrum_generations),
            seed,
            "Particle field initialized"
        );

        Ok(Self {
            particles,
            vertices: vec![Vertex::default(); count],
            indices: (0..count as u32).collect(),
            per_generation,
            max_age: config.generation_span(spectrum_generations) as f32,
            spawn_extent: extent,
            spawn_depth: config.spawn_depth,
            color,
            seed,
            step: 0,
        })
    }

    /// Age every particle by one step
    ///
    /// A particle that has reached the maximum age is respawned in the same
    /// step: age 0, fresh random X/Y, Z at the spawn depth.
    pub fn update(&mut self) {
        self.step += 1;

        let Self {
            particles,
            per_generation,
            max_age,
            spawn_extent,
            spawn_depth,
            color,
            seed,
            step,
            ..
        } = self;
        let (max_age, extent, depth, color, seed, step) =
            (*max_age, *spawn_extent, *spawn_depth, *color, *seed, *step);

        particles
            .par_chunks_mut(*per_generation)
            .enumerate()
            .for_each(|(chunk_index, chunk)| {
                let mut rng: Option<StdRng> = None;
                for particle in chunk {
                    if particle.age >= max_age {
                        let rng = rng.get_or_insert_with(|| chunk_rng(seed, step, chunk_index));
                        *particle = Particle {
                            position: Vec3::new(
                                spawn_coordinate(rng, extent),
                                spawn_coordinate(rng, extent),
                                depth,
                            ),
                            age: 0.0,
                            color,
                        };
                    } else {
                        particle.age += 1.0;
                    }
                }
            });
    }

    /// Write one point vertex per particle
    pub fn emit(&mut self) {
        self.vertices
            .par_iter_mut()
            .zip(self.particles.par_iter())
            .for_each(|(vertex, particle)| {
                *vertex = Vertex {
                    position: particle.position.extend(particle.age).to_array(),
                    color: particle.color.to_array(),
                };
            });
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Age at which a particle respawns
    pub fn max_age(&self) -> f32 {
        self.max_age
    }

    /// Vertices from the last `emit`, as flat floats (8 per particle)
    pub fn vertex_floats(&self) -> &[f32] {
        as_floats(&self.vertices)
    }

    /// Identity indices, one per particle
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

/// Independent stream per (step, chunk) so parallel updates stay reproducible
fn chunk_rng(seed: u64, step: u64, chunk: usize) -> StdRng {
    let mixed = seed
        ^ step.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (chunk as u64).wrapping_add(1).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    StdRng::seed_from_u64(mixed)
}

fn spawn_coordinate(rng: &mut StdRng, extent: f32) -> f32 {
    rng.gen::<f32>() * 2.0 * extent - extent
}
