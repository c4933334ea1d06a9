//! Core value types shared by every stage of the pipeline

pub mod geo;
pub mod vec2;
pub mod wind;

pub use geo::{GeoBounds, GeoPoint};
pub use vec2::Vec2;
pub use wind::WindVector;
