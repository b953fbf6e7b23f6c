//! # Generation Settings
//!
//! Everything the pipeline needs to turn a chunk coordinate into height,
//! colour and geometry. Loaded once at startup and validated immediately,
//! so bad values never reach a worker thread.
//!
//! ```toml
//! chunk_resolution = 241
//! height_multiplier = 30.0
//!
//! [noise]
//! seed = 1
//! scale = 50.0
//! octaves = 4
//! persistence = 0.5
//! lacunarity = 2.0
//! offset = { x = 0.0, y = 0.0 }
//!
//! [[regions]]
//! name = "water"
//! height = 0.3
//! color = [55, 102, 196]
//!
//! [[height_curve]]
//! time = 0.0
//! value = 0.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tessera_shared::MAP_CHUNK_SIZE;

use crate::curve::HeightCurve;
use crate::error::{TerrainError, TerrainResult};
use crate::noise::NoiseParameters;
use crate::region::RegionTable;

/// Static generation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Fractal noise parameters shared by every chunk.
    pub noise: NoiseParameters,
    /// Ascending terrain bands.
    pub regions: RegionTable,
    /// Samples per side of each chunk's height field.
    pub chunk_resolution: usize,
    /// Vertical scale applied after the response curve.
    pub height_multiplier: f32,
    /// Response curve applied to normalized heights.
    pub height_curve: HeightCurve,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            noise: NoiseParameters::default(),
            regions: RegionTable::default(),
            chunk_resolution: MAP_CHUNK_SIZE,
            height_multiplier: 30.0,
            height_curve: HeightCurve::default(),
        }
    }
}

impl GenerationSettings {
    /// Parses and validates settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::Config`] on malformed TOML (including
    /// region tables or curves that fail their own checks) and
    /// [`TerrainError::InvalidParameter`] on out-of-range values.
    pub fn from_toml_str(text: &str) -> TerrainResult<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// As [`GenerationSettings::from_toml_str`], plus [`TerrainError::Io`].
    pub fn load(path: impl AsRef<Path>) -> TerrainResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks every value against its domain.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> TerrainResult<()> {
        self.noise.validate()?;
        if self.chunk_resolution < 2 {
            return Err(TerrainError::invalid(
                "chunk_resolution",
                format!("must be at least 2, got {}", self.chunk_resolution),
            ));
        }
        if !self.height_multiplier.is_finite() {
            return Err(TerrainError::invalid("height_multiplier", "must be finite"));
        }
        // Re-check invariants for values built in code rather than parsed
        RegionTable::new(self.regions.regions().to_vec())?;
        HeightCurve::new(self.height_curve.keys().to_vec())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        chunk_resolution = 121
        height_multiplier = 12.5

        [noise]
        seed = 1
        scale = 50.0
        octaves = 4
        persistence = 0.5
        lacunarity = 2.0
        offset = { x = 3.0, y = -2.0 }

        [[regions]]
        name = "water"
        height = 0.3
        color = [0, 0, 255]

        [[regions]]
        name = "land"
        height = 0.6
        color = [0, 255, 0]

        [[height_curve]]
        time = 0.0
        value = 0.0

        [[height_curve]]
        time = 1.0
        value = 1.0
    "#;

    #[test]
    fn test_parse_sample() {
        let settings = GenerationSettings::from_toml_str(SAMPLE).unwrap();
        assert_eq!(settings.chunk_resolution, 121);
        assert_eq!(settings.noise.seed, 1);
        assert_eq!(settings.noise.offset.y, -2.0);
        assert_eq!(settings.regions.regions().len(), 2);
        assert_eq!(settings.regions.region_name(0.7), "land");
        assert_eq!(settings.height_curve, HeightCurve::linear());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let settings = GenerationSettings::from_toml_str("height_multiplier = 5.0").unwrap();
        assert_eq!(settings.chunk_resolution, MAP_CHUNK_SIZE);
        assert_eq!(settings.noise, NoiseParameters::default());
    }

    #[test]
    fn test_descending_regions_fail_at_load() {
        let text = r#"
            [[regions]]
            name = "high"
            height = 0.8
            color = [1, 1, 1]

            [[regions]]
            name = "low"
            height = 0.2
            color = [0, 0, 0]
        "#;
        assert!(matches!(GenerationSettings::from_toml_str(text), Err(TerrainError::Config(_))));
    }

    #[test]
    fn test_bad_scale_fails_at_load() {
        let text = "[noise]\nscale = 0.0\n";
        assert!(matches!(
            GenerationSettings::from_toml_str(text),
            Err(TerrainError::InvalidParameter { parameter: "noise.scale", .. })
        ));
    }

    #[test]
    fn test_bad_resolution() {
        let settings = GenerationSettings {
            chunk_resolution: 1,
            ..GenerationSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
