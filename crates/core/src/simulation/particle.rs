//! Particle state and the per-frame advection step

use crate::color::StrokePalette;
use crate::core_types::Vec2;
use crate::field::SampledField;
use rand::Rng;

/// A tracer carried along the sampled wind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Current position in surface pixels
    pub position: Vec2,
    /// End of the segment to draw this frame
    pub target: Vec2,
    /// Frames since the last respawn
    pub age: u32,
}

impl Particle {
    /// Particle at a random spot of `field` with a random age in
    /// `0..=max_age`, so that a fresh population does not respawn in sync.
    pub fn spawn<R: Rng + ?Sized>(field: &SampledField, max_age: u32, rng: &mut R) -> Self {
        let position = field.randomize(rng).position;
        Self {
            position,
            target: position,
            age: rng.random_range(0..=max_age),
        }
    }

    /// Move to a new random spot and reset the age
    pub fn respawn<R: Rng + ?Sized>(&mut self, field: &SampledField, rng: &mut R) {
        self.position = field.randomize(rng).position;
        self.target = self.position;
        self.age = 0;
    }
}

/// What happened to a particle during one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Segment `position -> target` is drawn in the given stroke bucket
    Draw { bucket: usize },
    /// Target fell on a cell without data; the particle moved there without
    /// drawing so it can coast across small gaps
    Coast,
    /// No data under the particle; it is marked for respawn next frame
    Stalled,
}

/// Advance one particle by one frame.
///
/// Returns the outcome and whether the particle was respawned first.
pub fn step_particle<R: Rng + ?Sized>(
    particle: &mut Particle,
    field: &SampledField,
    palette: &StrokePalette,
    max_age: u32,
    rng: &mut R,
) -> (StepOutcome, bool) {
    let respawned = particle.age > max_age;
    if respawned {
        particle.respawn(field, rng);
    }

    let outcome = match field.get(particle.position.x, particle.position.y) {
        // Respawn on the next frame rather than jumping mid-step
        None => {
            particle.age = max_age;
            StepOutcome::Stalled
        }
        Some(sample) => {
            let next = particle.position + sample.velocity;
            if field.is_defined(next.x, next.y) {
                particle.target = next;
                StepOutcome::Draw {
                    bucket: palette.index_for(sample.magnitude),
                }
            } else {
                particle.position = next;
                particle.target = next;
                StepOutcome::Coast
            }
        }
    };

    particle.age += 1;
    (outcome, respawned)
}
