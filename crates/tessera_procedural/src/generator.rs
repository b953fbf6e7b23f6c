//! # Terrain Pipeline
//!
//! Ties noise, classification, texture and mesh stages together behind one
//! trait so the streaming layer never reaches into a global generator.
//!
//! Every method is a pure function of `&self` and its arguments; a pipeline
//! is shared between worker threads as `Arc<dyn TerrainPipeline>`.

use tessera_shared::Vec2;

use crate::error::TerrainResult;
use crate::mesh::{self, MeshPayload};
use crate::noise::{self, HeightField};
use crate::region::ColorField;
use crate::settings::GenerationSettings;
use crate::texture::{self, Image};

/// Height and colour grids for one chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct MapData {
    /// Noise-space centre the field was sampled around.
    pub center: Vec2,
    /// Normalized heights.
    pub heights: HeightField,
    /// Classified colours, same dimensions as `heights`.
    pub colors: ColorField,
}

/// The generation stages the streaming manager schedules.
pub trait TerrainPipeline: Send + Sync {
    /// Samples per side of each generated map.
    fn chunk_resolution(&self) -> usize;

    /// Generates heights and colours centred on `center` (in noise cells).
    fn generate_map(&self, center: Vec2) -> MapData;

    /// Builds the colour-map texture for a finished map.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TerrainError::DimensionMismatch`] if the map's
    /// colour grid is inconsistent with its heights.
    fn synthesize_texture(&self, map: &MapData) -> TerrainResult<Image> {
        texture::synthesize(&map.colors, map.heights.width(), map.heights.height())
    }

    /// Builds the mesh for `heights` at the given LOD stride.
    fn generate_mesh(&self, heights: &HeightField, stride: usize) -> MeshPayload;
}

/// Noise-space centre of chunk `(x, z)` for a given resolution.
///
/// Adjacent chunks share their edge row, so chunks step by `resolution - 1`.
#[must_use]
pub fn chunk_center(x: i32, z: i32, resolution: usize) -> Vec2 {
    let step = resolution.saturating_sub(1) as f32;
    Vec2::new(x as f32 * step, z as f32 * step)
}

/// The default pipeline, driven entirely by [`GenerationSettings`].
#[derive(Clone, Debug)]
pub struct TerrainGenerator {
    settings: GenerationSettings,
}

impl TerrainGenerator {
    /// Creates a generator after validating `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::TerrainError::InvalidParameter`] for out-of-range
    /// settings.
    pub fn new(settings: GenerationSettings) -> TerrainResult<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// The settings this generator runs with.
    #[must_use]
    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }
}

impl TerrainPipeline for TerrainGenerator {
    fn chunk_resolution(&self) -> usize {
        self.settings.chunk_resolution
    }

    fn generate_map(&self, center: Vec2) -> MapData {
        let n = self.settings.chunk_resolution;
        let params = self.settings.noise.centered_on(center);
        let heights = noise::generate(n, n, &params);
        let colors = ColorField::classify(&heights, &self.settings.regions);
        MapData { center, heights, colors }
    }

    fn generate_mesh(&self, heights: &HeightField, stride: usize) -> MeshPayload {
        mesh::build(
            heights,
            self.settings.height_multiplier,
            &self.settings.height_curve,
            stride,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_generator() -> TerrainGenerator {
        TerrainGenerator::new(GenerationSettings {
            chunk_resolution: 17,
            ..GenerationSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn test_map_dimensions() {
        let gen = small_generator();
        let map = gen.generate_map(Vec2::ZERO);
        assert_eq!(map.heights.width(), 17);
        assert_eq!(map.colors.colors().len(), 17 * 17);
    }

    #[test]
    fn test_map_is_deterministic() {
        let gen = small_generator();
        let center = chunk_center(3, -2, 17);
        assert_eq!(gen.generate_map(center), gen.generate_map(center));
    }

    #[test]
    fn test_different_chunks_differ() {
        let gen = small_generator();
        let a = gen.generate_map(chunk_center(0, 0, 17));
        let b = gen.generate_map(chunk_center(1, 0, 17));
        assert_ne!(a.heights, b.heights);
    }

    #[test]
    fn test_chunk_center_steps_by_shared_edge() {
        assert_eq!(chunk_center(2, -1, 241), Vec2::new(480.0, -240.0));
        assert_eq!(chunk_center(0, 0, 241), Vec2::ZERO);
    }

    #[test]
    fn test_texture_matches_map() {
        let gen = small_generator();
        let map = gen.generate_map(Vec2::ZERO);
        let image = gen.synthesize_texture(&map).unwrap();
        assert_eq!(image.width(), 17);
        assert_eq!(image.pixels(), map.colors.colors());
    }

    #[test]
    fn test_mesh_uses_settings() {
        let gen = small_generator();
        let map = gen.generate_map(Vec2::ZERO);
        let mesh = gen.generate_mesh(&map.heights, 4);
        assert_eq!(mesh.vertices_per_line(), 5);
        let top = mesh.positions().iter().map(|p| p.y).fold(f32::MIN, f32::max);
        assert!(top <= gen.settings().height_multiplier + 1e-4);
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let mut settings = GenerationSettings::default();
        settings.noise.octaves = 0;
        assert!(TerrainGenerator::new(settings).is_err());
    }
}
