//! Wind Streamline Core Library
//!
//! Animated particle streamlines over gridded wind data, drawn on a
//! canvas that sits above a slippy map.
//!
//! ## Pipeline
//!
//! - A [`WindGrid`] (or any [`VectorField`]) supplies `u`/`v` wind by location
//! - A [`Projection`] maps geography to canvas pixels for the current view
//! - [`SampledField`] pre-samples the wind on a half-resolution pixel lattice
//! - [`ParticleSimulator`] advects particles and strokes their trails
//! - [`AnimationController`] runs the cancellable frame loop
//! - [`StreamlineLayer`] reacts to map events and rebuilds the field

// Core types and utilities
pub mod core_types;

// Wind data and interpolation
pub mod grid;

// Geographic <-> pixel transforms
pub mod projection;

// Colour ramps and stroke palettes
pub mod color;

// Canvas abstraction and in-memory raster
pub mod render;

// Screen-space sampled field and colour mask
pub mod field;

// Particles and the frame loop
pub mod simulation;

// Host map integration
pub mod overlay;

// Re-export core types
pub use core_types::{GeoBounds, GeoPoint, Vec2, WindVector};

pub use color::{ColorScale, Rgba, StrokePalette};
pub use field::{ColorMask, MaskOptions, SampledField};
pub use grid::{ConstantField, GridError, GridLayout, RowOrder, VectorField, WindGrid};
pub use overlay::{
    HostMap, LayerOptions, StaticWindSource, StreamlineLayer, UpdateStatus, ViewEvent, ViewState,
    WindDataSource,
};
pub use projection::{LinearProjection, MercatorProjection, Projection, ProjectionError};
pub use render::{CanvasSurface, CompositeMode, RasterCanvas, RenderError};
pub use simulation::{
    AnimationController, CancelToken, FrameOutcome, FrameStats, ParticleSimulator, StreamlineConfig,
};
