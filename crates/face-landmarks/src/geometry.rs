//! Landmark geometry

use serde::{Deserialize, Serialize};

/// Segments shorter than this are treated as degenerate
pub const MIN_SEGMENT: f64 = 1e-6;

/// A landmark coordinate in image space (y grows downward)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    /// Depth, when the detector provides it (unused by the 2D metrics)
    #[serde(default)]
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn with_depth(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Planar distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            z: (self.z + other.z) / 2.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// `numerator / denominator`, or `None` when the denominator is a degenerate
/// segment or the result is not finite
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if !denominator.is_finite() || denominator.abs() < MIN_SEGMENT {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_ignores_depth() {
        let a = Point::with_depth(0.0, 0.0, -20.0);
        let b = Point::with_depth(0.0, 2.0, 40.0);
        assert!((a.distance(&b) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_ratio_rejects_degenerate_denominator() {
        assert_eq!(ratio(1.0, 0.0), None);
        assert_eq!(ratio(1.0, 1e-9), None);
        assert_eq!(ratio(1.0, f64::NAN), None);
        assert_eq!(ratio(f64::INFINITY, 2.0), None);
        assert_eq!(ratio(3.0, 2.0), Some(1.5));
    }
}
