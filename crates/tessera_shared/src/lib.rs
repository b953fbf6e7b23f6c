//! # Tessera Shared
//!
//! Common types used by the generation pipeline, the streaming manager and
//! whatever host consumes their output.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on a renderer, a physics engine or a window
//! system. Hosts convert these types at their own boundary.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{
    DEFAULT_STREAMING_RADIUS, DEFAULT_WORLD_SCALE, MAP_CHUNK_SIZE, MIN_NOISE_SCALE,
    VIEWER_MOVE_THRESHOLD,
};
pub use math::{Vec2, Vec3};
