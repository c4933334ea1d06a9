//! Particle animation over a sampled wind field
//!
//! - [`StreamlineConfig`]: tuning constants and derived quantities
//! - [`Particle`] and [`step_particle`]: per-particle state machine
//! - [`ParticleSimulator`]: population, colour buckets and trail drawing
//! - [`AnimationController`]: cancellable frame loop over a [`FieldSlot`]

pub mod animation;
pub mod config;
pub mod particle;
pub mod simulator;

pub use animation::{AnimationController, CancelToken, FieldSlot, FrameOutcome};
pub use config::{StreamlineConfig, VelocityScale};
pub use particle::{step_particle, Particle, StepOutcome};
pub use simulator::{FrameStats, ParticleSimulator};
