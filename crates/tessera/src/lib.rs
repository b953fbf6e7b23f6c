//! # Tessera
//!
//! Chunked procedural terrain: deterministic generation plus a streaming
//! cache that keeps a LOD-graded neighbourhood meshed around a viewer.
//!
//! ## Crates
//!
//! - [`shared`]: math types and constants
//! - [`procedural`]: noise, regions, meshes, textures
//! - [`streaming`]: chunk cache, LOD policy, executors, world config
//! - [`export`]: PNG output for previews
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera::prelude::*;
//!
//! let mut manager = ChunkManager::from_world_config(WorldConfig::load("config/terrain.toml")?)?;
//! manager.update(Vec2::ZERO);
//! manager.flush_generation_queue();
//!
//! tessera::export::save_world_mosaic(&manager, "world.png")?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod export;

pub use tessera_procedural as procedural;
pub use tessera_shared as shared;
pub use tessera_streaming as streaming;

/// The types most callers need.
pub mod prelude {
    pub use tessera_procedural::{
        GenerationSettings, HeightCurve, Image, MapData, MeshPayload, NoiseParameters, RegionTable,
        TerrainGenerator, TerrainPipeline,
    };
    pub use tessera_shared::{Vec2, Vec3};
    pub use tessera_streaming::{
        ChunkCoord, ChunkEvent, ChunkManager, EvictionPolicy, StreamingConfig, WorldConfig,
    };
}
