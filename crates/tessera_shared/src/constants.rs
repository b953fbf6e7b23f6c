//! # Terrain Constants
//!
//! Defaults baked into the presets. Every one of them can be overridden
//! through configuration; these only describe the shipped world.

/// Samples per side of one chunk height field.
///
/// `MAP_CHUNK_SIZE - 1 = 240` is divisible by 1, 2, 4, 6, 8, 10 and 12,
/// so every common LOD stride lands exactly on the chunk edge.
pub const MAP_CHUNK_SIZE: usize = 241;

/// World units per height-field cell.
pub const DEFAULT_WORLD_SCALE: f32 = 5.0;

/// Chunks kept around the viewer in each direction.
pub const DEFAULT_STREAMING_RADIUS: i32 = 2;

/// Smallest noise scale accepted by the generator.
///
/// Anything at or below zero is clamped to this value.
pub const MIN_NOISE_SCALE: f64 = 0.0001;

/// Distance the viewer must travel before the desired chunk set is rebuilt.
pub const VIEWER_MOVE_THRESHOLD: f32 = 25.0;
