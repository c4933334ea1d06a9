//! Particle population, colour bucketing and trail rendering

use super::config::StreamlineConfig;
use super::particle::{step_particle, Particle, StepOutcome};
use crate::color::{Rgba, StrokePalette};
use crate::field::SampledField;
use crate::render::{CanvasSurface, CompositeMode, RenderError};
use rand::Rng;

/// Counts gathered during one evolve step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Particles with a segment queued for drawing
    pub drawn: usize,
    /// Particles that moved into a gap without drawing
    pub coasting: usize,
    /// Particles sitting on a cell without data
    pub stalled: usize,
    /// Particles respawned at the start of their step
    pub respawned: usize,
}

impl FrameStats {
    /// Accumulate another frame's counts
    pub fn merge(&mut self, other: FrameStats) {
        self.drawn += other.drawn;
        self.coasting += other.coasting;
        self.stalled += other.stalled;
        self.respawned += other.respawned;
    }
}

/// Owns the particles for one sampled field
#[derive(Debug, Clone)]
pub struct ParticleSimulator {
    particles: Vec<Particle>,
    /// Particle indices per stroke colour, rebuilt on every evolve
    buckets: Vec<Vec<usize>>,
    palette: StrokePalette,
    max_age: u32,
    line_width: f32,
    fade: Rgba,
}

impl ParticleSimulator {
    /// Spawn `count` particles on `field`
    pub fn new<R: Rng + ?Sized>(
        count: usize,
        field: &SampledField,
        config: &StreamlineConfig,
        rng: &mut R,
    ) -> Self {
        let palette = config.palette();
        let particles = (0..count)
            .map(|_| Particle::spawn(field, config.max_particle_age, rng))
            .collect();
        Self {
            particles,
            buckets: vec![Vec::new(); palette.len()],
            palette,
            max_age: config.max_particle_age,
            line_width: config.line_width,
            fade: config.fade_color(),
        }
    }

    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    #[must_use]
    pub fn palette(&self) -> &StrokePalette {
        &self.palette
    }

    /// Number of particles queued in each stroke bucket
    #[must_use]
    pub fn bucket_sizes(&self) -> Vec<usize> {
        self.buckets.iter().map(Vec::len).collect()
    }

    /// Advance every particle by one frame and rebuild the stroke buckets
    pub fn evolve<R: Rng + ?Sized>(&mut self, field: &SampledField, rng: &mut R) -> FrameStats {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        let mut stats = FrameStats::default();
        for (index, particle) in self.particles.iter_mut().enumerate() {
            let (outcome, respawned) =
                step_particle(particle, field, &self.palette, self.max_age, rng);
            if respawned {
                stats.respawned += 1;
            }
            match outcome {
                StepOutcome::Draw { bucket } => {
                    self.buckets[bucket].push(index);
                    stats.drawn += 1;
                }
                StepOutcome::Coast => stats.coasting += 1,
                StepOutcome::Stalled => stats.stalled += 1,
            }
        }
        stats
    }

    /// Fade existing trails, then stroke one path per non-empty bucket and
    /// commit every drawn particle to its target.
    pub fn draw<C: CanvasSurface + ?Sized>(&mut self, canvas: &mut C) -> Result<(), RenderError> {
        let (w, h) = (canvas.width() as f32, canvas.height() as f32);
        canvas.fill_rect(0.0, 0.0, w, h, self.fade, CompositeMode::DestinationIn)?;
        canvas.set_line_width(self.line_width);

        for (bucket, members) in self.buckets.iter().enumerate() {
            if members.is_empty() {
                continue;
            }
            canvas.begin_path();
            for &index in members {
                let particle = &mut self.particles[index];
                canvas.move_to(particle.position);
                canvas.line_to(particle.target);
                particle.position = particle.target;
            }
            canvas.stroke(self.palette.color(bucket))?;
        }
        Ok(())
    }
}
