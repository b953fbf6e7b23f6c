//! # Height Response Curve
//!
//! Reshapes normalized heights before they are scaled into world units.
//! The usual shape keeps everything below the water line at zero so lakes
//! and seas render as flat surfaces.

use serde::{Deserialize, Serialize};

use crate::error::{TerrainError, TerrainResult};

/// One `(input, output)` point of a [`HeightCurve`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    /// Normalized input height.
    pub time: f32,
    /// Output value at `time`.
    pub value: f32,
}

impl CurveKey {
    /// Creates a key.
    #[must_use]
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// Monotonic, piecewise-linear response curve.
///
/// Inputs before the first key or after the last key are clamped to the
/// end values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CurveKey>", into = "Vec<CurveKey>")]
pub struct HeightCurve {
    keys: Vec<CurveKey>,
}

impl HeightCurve {
    /// Builds a curve from keys sorted by `time`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidParameter`] if there are no keys, a key
    /// is not finite, times do not strictly ascend, or values decrease.
    pub fn new(keys: Vec<CurveKey>) -> TerrainResult<Self> {
        if keys.is_empty() {
            return Err(TerrainError::invalid("height_curve", "at least one key is required"));
        }
        if keys.iter().any(|k| !(k.time.is_finite() && k.value.is_finite())) {
            return Err(TerrainError::invalid("height_curve", "keys must be finite"));
        }
        for pair in keys.windows(2) {
            if pair[1].time <= pair[0].time {
                return Err(TerrainError::invalid("height_curve", "key times must strictly ascend"));
            }
            if pair[1].value < pair[0].value {
                return Err(TerrainError::invalid("height_curve", "curve must be monotonic non-decreasing"));
            }
        }
        Ok(Self { keys })
    }

    /// Identity on `[0, 1]`.
    #[must_use]
    pub fn linear() -> Self {
        Self {
            keys: vec![CurveKey::new(0.0, 0.0), CurveKey::new(1.0, 1.0)],
        }
    }

    /// Flat at zero up to `level`, then rising linearly to one.
    ///
    /// `level` is clamped into `[0, 0.99]`.
    #[must_use]
    pub fn water_table(level: f32) -> Self {
        let level = level.clamp(0.0, 0.99);
        if level <= 0.0 {
            return Self::linear();
        }
        Self {
            keys: vec![
                CurveKey::new(0.0, 0.0),
                CurveKey::new(level, 0.0),
                CurveKey::new(1.0, 1.0),
            ],
        }
    }

    /// The keys, ascending by time.
    #[must_use]
    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Evaluates the curve at `t`.
    #[must_use]
    pub fn evaluate(&self, t: f32) -> f32 {
        let first = self.keys[0];
        let last = self.keys[self.keys.len() - 1];
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; guaranteed to exist and be > 0
        let upper = self.keys.partition_point(|k| k.time <= t);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let f = (t - a.time) / (b.time - a.time);
        a.value + (b.value - a.value) * f
    }
}

impl Default for HeightCurve {
    fn default() -> Self {
        Self::water_table(0.4)
    }
}

impl TryFrom<Vec<CurveKey>> for HeightCurve {
    type Error = TerrainError;

    fn try_from(keys: Vec<CurveKey>) -> TerrainResult<Self> {
        Self::new(keys)
    }
}

impl From<HeightCurve> for Vec<CurveKey> {
    fn from(curve: HeightCurve) -> Self {
        curve.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_is_identity() {
        let curve = HeightCurve::linear();
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!((curve.evaluate(t) - t).abs() < 1e-6);
        }
    }

    #[test]
    fn test_water_table_flattens_low_ground() {
        let curve = HeightCurve::water_table(0.4);
        assert_eq!(curve.evaluate(0.0), 0.0);
        assert_eq!(curve.evaluate(0.2), 0.0);
        assert_eq!(curve.evaluate(0.4), 0.0);
        assert!(curve.evaluate(0.7) > 0.0);
        assert_eq!(curve.evaluate(1.0), 1.0);
    }

    #[test]
    fn test_clamps_outside_keys() {
        let curve = HeightCurve::new(vec![CurveKey::new(0.2, 0.1), CurveKey::new(0.8, 0.9)]).unwrap();
        assert_eq!(curve.evaluate(-1.0), 0.1);
        assert_eq!(curve.evaluate(2.0), 0.9);
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_monotonic() {
        let curve = HeightCurve::default();
        let mut prev = f32::MIN;
        for i in 0..=100 {
            let v = curve.evaluate(i as f32 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(HeightCurve::new(Vec::new()).is_err());
        assert!(HeightCurve::new(vec![CurveKey::new(0.5, 0.0), CurveKey::new(0.5, 1.0)]).is_err());
        assert!(HeightCurve::new(vec![CurveKey::new(0.0, 1.0), CurveKey::new(1.0, 0.0)]).is_err());
    }
}
