//! # Tessera Procedural Generation
//!
//! Deterministic terrain generation for chunked, streamable worlds.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same parameters always produce the same terrain
//! 2. **Pure**: Every stage is a function of its inputs, no ambient state
//! 3. **Chunked**: Maps are generated per chunk and tile edge to edge
//! 4. **Thread-agnostic**: Any stage can run on any worker thread
//!
//! ## Core Components
//!
//! - `noise::generate`: multi-octave simplex height fields, normalized per field
//! - `RegionTable`: height thresholds -> terrain colours
//! - `HeightCurve`: response curve applied before vertical scaling
//! - `mesh::build`: height field -> centred triangle mesh at a LOD stride
//! - `texture::synthesize`: colour field -> point-sampled image
//! - `TerrainGenerator`: the default `TerrainPipeline`
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_procedural::{chunk_center, GenerationSettings, TerrainGenerator, TerrainPipeline};
//!
//! let generator = TerrainGenerator::new(GenerationSettings::default())?;
//!
//! let map = generator.generate_map(chunk_center(0, 0, generator.chunk_resolution()));
//! let texture = generator.synthesize_texture(&map)?;
//! let mesh = generator.generate_mesh(&map.heights, 2);
//!
//! assert_eq!(mesh.vertices_per_line(), 121);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod curve;
pub mod error;
pub mod generator;
pub mod mesh;
pub mod noise;
pub mod region;
pub mod settings;
pub mod texture;

pub use curve::{CurveKey, HeightCurve};
pub use error::{TerrainError, TerrainResult};
pub use generator::{chunk_center, MapData, TerrainGenerator, TerrainPipeline};
pub use mesh::{MeshPayload, MeshVertex};
pub use noise::{HeightField, NoiseParameters, SimplexNoise, WorldSeed, MAX_OCTAVES};
pub use region::{Color, ColorField, RegionTable, TerrainType};
pub use settings::GenerationSettings;
pub use texture::Image;
