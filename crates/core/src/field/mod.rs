//! Dense per-pixel wind sampling for the current view

pub mod mask;
pub mod sampled;

pub use mask::{ColorMask, MaskOptions};
pub use sampled::{FieldSample, Placement, SampleOptions, SampledField, RANDOMIZE_ATTEMPTS};
