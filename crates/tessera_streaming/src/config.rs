//! # Streaming Configuration
//!
//! Static settings for the chunk manager plus the combined world file that
//! also carries [`GenerationSettings`]. Everything is validated on load.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tessera_procedural::GenerationSettings;
use tessera_shared::{DEFAULT_STREAMING_RADIUS, DEFAULT_WORLD_SCALE, VIEWER_MOVE_THRESHOLD};

use crate::error::{StreamingError, StreamingResult};
use crate::lod::{LodLevel, LodTable};

/// What happens to chunks that leave the desired set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Keep every chunk ever created.
    Never,
    /// Drop chunks more than `radius + margin` chunks from the viewer.
    OutsideRadius {
        /// Extra ring kept beyond the streaming radius.
        margin: i32,
    },
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::OutsideRadius { margin: 1 }
    }
}

/// Chunk manager configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chunks kept around the viewer in each direction.
    pub radius: i32,
    /// World units per height-field cell.
    pub world_scale: f32,
    /// LOD thresholds, finest first.
    pub lod_levels: LodTable,
    /// Fate of chunks that leave the desired set.
    pub eviction: EvictionPolicy,
    /// World units the viewer must move before the desired set is rebuilt.
    pub update_move_threshold: f32,
    /// Worker threads for generation.
    pub worker_threads: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl StreamingConfig {
    /// Shipped settings for 241-sample chunks.
    #[must_use]
    pub fn production() -> Self {
        let lods = LodTable::new(vec![
            LodLevel::new(1, 300.0),
            LodLevel::new(2, 900.0),
            LodLevel::new(4, 1800.0),
            LodLevel::new(8, f32::INFINITY),
        ]);
        Self {
            radius: DEFAULT_STREAMING_RADIUS,
            world_scale: DEFAULT_WORLD_SCALE,
            lod_levels: lods.unwrap_or_else(|_| LodTable::single()),
            eviction: EvictionPolicy::default(),
            update_move_threshold: VIEWER_MOVE_THRESHOLD,
            worker_threads: std::thread::available_parallelism().map_or(2, |n| n.get().saturating_sub(1).max(1)),
        }
    }

    /// Small, fast settings for 17-sample test chunks.
    ///
    /// One chunk spans 16 world units.
    #[must_use]
    pub fn test() -> Self {
        let lods = LodTable::new(vec![
            LodLevel::new(1, 8.0),
            LodLevel::new(2, 24.0),
            LodLevel::new(4, f32::INFINITY),
        ]);
        Self {
            radius: 1,
            world_scale: 1.0,
            lod_levels: lods.unwrap_or_else(|_| LodTable::single()),
            eviction: EvictionPolicy::default(),
            update_move_threshold: 1.0,
            worker_threads: 2,
        }
    }

    /// World units spanned by one chunk.
    #[must_use]
    pub fn chunk_world_size(&self, chunk_resolution: usize) -> f32 {
        chunk_resolution.saturating_sub(1) as f32 * self.world_scale
    }

    /// Checks every value, including LOD strides against `chunk_resolution`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamingError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self, chunk_resolution: usize) -> StreamingResult<()> {
        if self.radius < 0 {
            return Err(StreamingError::invalid("radius", format!("must not be negative, got {}", self.radius)));
        }
        if !(self.world_scale.is_finite() && self.world_scale > 0.0) {
            return Err(StreamingError::invalid(
                "world_scale",
                format!("must be positive, got {}", self.world_scale),
            ));
        }
        if !(self.update_move_threshold.is_finite() && self.update_move_threshold >= 0.0) {
            return Err(StreamingError::invalid("update_move_threshold", "must be finite and non-negative"));
        }
        if let EvictionPolicy::OutsideRadius { margin } = self.eviction {
            if margin < 0 {
                return Err(StreamingError::invalid("eviction.margin", "must not be negative"));
            }
        }
        self.lod_levels.check_resolution(chunk_resolution)
    }
}

/// Everything needed to build a streaming world, as stored on disk.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Terrain generation settings.
    pub generation: GenerationSettings,
    /// Chunk manager settings.
    pub streaming: StreamingConfig,
}

impl WorldConfig {
    /// Parses and validates a world config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`StreamingError::Config`] on malformed TOML and
    /// [`StreamingError::InvalidParameter`] or [`StreamingError::Terrain`] on
    /// out-of-range values.
    pub fn from_toml_str(text: &str) -> StreamingResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// As [`WorldConfig::from_toml_str`], plus [`StreamingError::Io`].
    pub fn load(path: impl AsRef<Path>) -> StreamingResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validates both halves.
    ///
    /// # Errors
    ///
    /// See [`GenerationSettings::validate`] and [`StreamingConfig::validate`].
    pub fn validate(&self) -> StreamingResult<()> {
        self.generation.validate()?;
        self.streaming.validate(self.generation.chunk_resolution)
    }
}
