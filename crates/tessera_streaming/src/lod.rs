//! # Level-of-Detail Policy
//!
//! An ordered table of `(stride, max_distance)` pairs. The first level whose
//! `max_distance` covers the viewer's distance to a chunk wins; anything
//! farther than every threshold gets the last (coarsest) level.

use serde::{Deserialize, Serialize};

use crate::error::{StreamingError, StreamingResult};

/// One level of detail.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodLevel {
    /// Mesh sampling stride. 1 = full resolution.
    pub stride: usize,
    /// Farthest viewer distance (world units, to the chunk edge) served by
    /// this level.
    pub max_distance: f32,
}

impl LodLevel {
    /// Creates a level.
    #[must_use]
    pub const fn new(stride: usize, max_distance: f32) -> Self {
        Self { stride, max_distance }
    }
}

/// Validated LOD thresholds, finest first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LodLevel>", into = "Vec<LodLevel>")]
pub struct LodTable {
    levels: Vec<LodLevel>,
}

impl LodTable {
    /// Builds a table.
    ///
    /// # Errors
    ///
    /// Returns [`StreamingError::InvalidParameter`] if the table is empty, a
    /// stride is zero, strides do not strictly grow, or distances are NaN or
    /// do not strictly grow.
    pub fn new(levels: Vec<LodLevel>) -> StreamingResult<Self> {
        if levels.is_empty() {
            return Err(StreamingError::invalid("lod_levels", "at least one level is required"));
        }
        if levels.iter().any(|l| l.stride == 0) {
            return Err(StreamingError::invalid("lod_levels", "stride must be at least 1"));
        }
        if levels.iter().any(|l| l.max_distance.is_nan()) {
            return Err(StreamingError::invalid("lod_levels", "max_distance must be a number"));
        }
        for pair in levels.windows(2) {
            if pair[1].stride <= pair[0].stride {
                return Err(StreamingError::invalid("lod_levels", "strides must strictly ascend"));
            }
            if pair[1].max_distance <= pair[0].max_distance {
                return Err(StreamingError::invalid("lod_levels", "distances must strictly ascend"));
            }
        }
        Ok(Self { levels })
    }

    /// A single full-resolution level.
    #[must_use]
    pub fn single() -> Self {
        Self {
            levels: vec![LodLevel::new(1, f32::INFINITY)],
        }
    }

    /// The levels, finest first.
    #[must_use]
    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }

    /// Number of levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false; an empty table cannot be built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Stride of level `lod`, clamped to the coarsest level.
    #[must_use]
    pub fn stride(&self, lod: usize) -> usize {
        self.levels[lod.min(self.levels.len() - 1)].stride
    }

    /// LOD index for a viewer `distance` away.
    #[must_use]
    pub fn select(&self, distance: f32) -> usize {
        self.levels
            .iter()
            .position(|l| distance <= l.max_distance)
            .unwrap_or(self.levels.len() - 1)
    }

    /// Checks that every stride lands on the chunk edge.
    ///
    /// # Errors
    ///
    /// Returns [`StreamingError::InvalidParameter`] if some stride does not
    /// divide `resolution - 1`.
    pub fn check_resolution(&self, resolution: usize) -> StreamingResult<()> {
        let cells = resolution.saturating_sub(1);
        if let Some(bad) = self.levels.iter().find(|l| cells % l.stride != 0) {
            return Err(StreamingError::invalid(
                "lod_levels",
                format!("stride {} does not divide chunk_resolution - 1 = {cells}", bad.stride),
            ));
        }
        Ok(())
    }
}

impl TryFrom<Vec<LodLevel>> for LodTable {
    type Error = StreamingError;

    fn try_from(levels: Vec<LodLevel>) -> StreamingResult<Self> {
        Self::new(levels)
    }
}

impl From<LodTable> for Vec<LodLevel> {
    fn from(table: LodTable) -> Self {
        table.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LodTable {
        LodTable::new(vec![
            LodLevel::new(1, 100.0),
            LodLevel::new(2, 300.0),
            LodLevel::new(4, 600.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_select_by_distance() {
        let t = table();
        assert_eq!(t.select(0.0), 0);
        assert_eq!(t.select(100.0), 0);
        assert_eq!(t.select(100.5), 1);
        assert_eq!(t.select(450.0), 2);
        assert_eq!(t.select(10_000.0), 2);
    }

    #[test]
    fn test_nearer_never_coarser() {
        let t = table();
        let mut prev = 0;
        for d in 0..1000 {
            let lod = t.select(d as f32);
            assert!(lod >= prev);
            prev = lod;
        }
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert!(LodTable::new(Vec::new()).is_err());
        assert!(LodTable::new(vec![LodLevel::new(0, 1.0)]).is_err());
        assert!(LodTable::new(vec![LodLevel::new(2, 1.0), LodLevel::new(1, 2.0)]).is_err());
        assert!(LodTable::new(vec![LodLevel::new(1, 5.0), LodLevel::new(2, 5.0)]).is_err());
    }

    #[test]
    fn test_resolution_check() {
        assert!(table().check_resolution(241).is_ok());
        assert!(table().check_resolution(17).is_ok());
        assert!(table().check_resolution(16).is_err());
    }

    #[test]
    fn test_stride_clamps() {
        let t = table();
        assert_eq!(t.stride(1), 2);
        assert_eq!(t.stride(9), 4);
        assert_eq!(LodTable::single().stride(0), 1);
    }
}
