//! # Region Classification
//!
//! Maps a normalized height to a terrain colour using an ordered table of
//! thresholds.
//!
//! ## Tie-break
//!
//! The table is scanned in ascending order and the colour is overwritten
//! while the sample is `>=` the threshold; the scan stops at the first
//! threshold the sample fails. A sample exactly on a threshold therefore
//! belongs to that threshold's region, not the one below it.
//!
//! Samples below the lowest threshold take the lowest region's colour, so
//! every sample is classified.

use serde::{Deserialize, Serialize};

use crate::error::{TerrainError, TerrainResult};
use crate::noise::HeightField;

/// An opaque RGB colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Creates a colour from its channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Returns `[r, g, b]`.
    #[must_use]
    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Color> for [u8; 3] {
    fn from(c: Color) -> Self {
        c.to_array()
    }
}

/// One named terrain band.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainType {
    /// Display name ("water", "rock", ...).
    pub name: String,
    /// Lowest normalized height that belongs to this band.
    pub height: f32,
    /// Colour painted for this band.
    pub color: Color,
}

impl TerrainType {
    /// Creates a terrain band.
    #[must_use]
    pub fn new(name: impl Into<String>, height: f32, color: Color) -> Self {
        Self {
            name: name.into(),
            height,
            color,
        }
    }
}

/// Validated, ascending list of terrain bands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TerrainType>", into = "Vec<TerrainType>")]
pub struct RegionTable {
    regions: Vec<TerrainType>,
}

impl RegionTable {
    /// Builds a table, rejecting empty or non-ascending inputs.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidParameter`] if the list is empty, a
    /// threshold is not finite, or thresholds are not strictly ascending.
    pub fn new(regions: Vec<TerrainType>) -> TerrainResult<Self> {
        if regions.is_empty() {
            return Err(TerrainError::invalid("regions", "at least one region is required"));
        }
        if let Some(bad) = regions.iter().find(|r| !r.height.is_finite()) {
            return Err(TerrainError::invalid("regions", format!("threshold of `{}` is not finite", bad.name)));
        }
        for pair in regions.windows(2) {
            if pair[1].height <= pair[0].height {
                return Err(TerrainError::invalid(
                    "regions",
                    format!(
                        "thresholds must ascend: `{}` ({}) follows `{}` ({})",
                        pair[1].name, pair[1].height, pair[0].name, pair[0].height
                    ),
                ));
            }
        }
        Ok(Self { regions })
    }

    /// The bands, lowest first.
    #[must_use]
    pub fn regions(&self) -> &[TerrainType] {
        &self.regions
    }

    /// Classifies one height. See [`classify`].
    #[must_use]
    pub fn classify(&self, height: f32) -> Color {
        classify(height, &self.regions)
    }

    /// Name of the band a height falls in.
    #[must_use]
    pub fn region_name(&self, height: f32) -> &str {
        &self.regions[region_index(height, &self.regions)].name
    }
}

impl TryFrom<Vec<TerrainType>> for RegionTable {
    type Error = TerrainError;

    fn try_from(regions: Vec<TerrainType>) -> TerrainResult<Self> {
        Self::new(regions)
    }
}

impl From<RegionTable> for Vec<TerrainType> {
    fn from(table: RegionTable) -> Self {
        table.regions
    }
}

impl Default for RegionTable {
    /// Water, sand, grass, rock and snow.
    fn default() -> Self {
        Self {
            regions: vec![
                TerrainType::new("deep water", 0.0, Color::rgb(33, 64, 140)),
                TerrainType::new("water", 0.3, Color::rgb(55, 102, 196)),
                TerrainType::new("sand", 0.4, Color::rgb(209, 208, 128)),
                TerrainType::new("grass", 0.45, Color::rgb(86, 152, 23)),
                TerrainType::new("forest", 0.55, Color::rgb(62, 107, 18)),
                TerrainType::new("rock", 0.7, Color::rgb(90, 69, 60)),
                TerrainType::new("high rock", 0.8, Color::rgb(75, 60, 53)),
                TerrainType::new("snow", 0.9, Color::rgb(255, 255, 255)),
            ],
        }
    }
}

fn region_index(height: f32, regions: &[TerrainType]) -> usize {
    let mut chosen = 0;
    for (i, region) in regions.iter().enumerate() {
        if height >= region.height {
            chosen = i;
        } else {
            break;
        }
    }
    chosen
}

/// Colour of the last region whose threshold is `<=` `height`.
///
/// O(number of regions), no side effects.
///
/// # Panics
///
/// Panics if `regions` is empty; [`RegionTable`] rules that out.
#[must_use]
pub fn classify(height: f32, regions: &[TerrainType]) -> Color {
    regions[region_index(height, regions)].color
}

/// A colour per height-field cell, row-major like [`HeightField`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorField {
    width: usize,
    height: usize,
    colors: Vec<Color>,
}

impl ColorField {
    /// Classifies every sample of `heights`.
    #[must_use]
    pub fn classify(heights: &HeightField, regions: &RegionTable) -> Self {
        Self {
            width: heights.width(),
            height: heights.height(),
            colors: heights.samples().iter().map(|&h| regions.classify(h)).collect(),
        }
    }

    /// Cells along X.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Cells along Y.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// All colours, row-major.
    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_bands() -> RegionTable {
        RegionTable::new(vec![
            TerrainType::new("water", 0.3, Color::rgb(0, 0, 255)),
            TerrainType::new("land", 0.6, Color::rgb(0, 255, 0)),
            TerrainType::new("rock", 0.8, Color::rgb(128, 128, 128)),
        ])
        .unwrap()
    }

    #[test]
    fn test_threshold_tie_break() {
        let table = three_bands();
        assert_eq!(table.region_name(0.6), "land");
        assert_eq!(table.region_name(0.599_99), "water");
        assert_eq!(table.region_name(1.0), "rock");
        assert_eq!(table.region_name(0.8), "rock");
        assert_eq!(table.region_name(0.3), "water");
    }

    #[test]
    fn test_below_lowest_threshold_takes_lowest_region() {
        let table = three_bands();
        assert_eq!(table.classify(0.0), Color::rgb(0, 0, 255));
        assert_eq!(table.classify(0.1), table.classify(0.5));
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert!(RegionTable::new(Vec::new()).is_err());
        assert!(RegionTable::new(vec![
            TerrainType::new("a", 0.5, Color::default()),
            TerrainType::new("b", 0.5, Color::default()),
        ])
        .is_err());
        assert!(RegionTable::new(vec![
            TerrainType::new("a", 0.7, Color::default()),
            TerrainType::new("b", 0.2, Color::default()),
        ])
        .is_err());
        assert!(RegionTable::new(vec![TerrainType::new("nan", f32::NAN, Color::default())]).is_err());
    }

    #[test]
    fn test_classify_field_matches_cells() {
        let heights = HeightField::from_samples(3, 1, vec![0.0, 0.6, 1.0]).unwrap();
        let field = ColorField::classify(&heights, &three_bands());
        assert_eq!(field.width(), 3);
        assert_eq!(field.height(), 1);
        assert_eq!(
            field.colors(),
            &[Color::rgb(0, 0, 255), Color::rgb(0, 255, 0), Color::rgb(128, 128, 128)]
        );
    }

    #[test]
    fn test_default_table_is_valid() {
        let table = RegionTable::default();
        assert!(RegionTable::new(table.regions().to_vec()).is_ok());
    }
}
