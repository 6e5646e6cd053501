//! Common types for the warehouse coordinate system.
//!
//! The floor is the X–Z plane and Y points up. Units are axis-aligned boxes
//! described by their center and their full extents, so most helpers here
//! work with centers and half extents rather than corners.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Global numerical tolerance for floating-point comparisons.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Default tolerance for footprint overlap.
///
/// Footprints that merely touch, or overlap by less than this amount on an
/// axis, are not treated as stacked on each other.
pub const DEFAULT_OVERLAP_EPSILON: f64 = 0.1;

/// Smallest extent a unit may have on any axis.
pub const MIN_UNIT_EXTENT: f64 = 0.1;

/// Represents a 3D vector or point in warehouse space.
///
/// Serialized as a plain `[x, y, z]` array, which is the shape the layout
/// documents use for both positions and sizes.
///
/// # Examples
/// ```
/// use warehouse_layout::types::Vec3;
///
/// let center = Vec3::new(1.0, 0.5, -2.0);
/// let size = Vec3::new(2.0, 1.0, 2.0);
/// assert_eq!(center + size * 0.5, Vec3::new(2.0, 1.0, -1.0));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    ///
    /// # Parameters
    /// * `x` - X component (width axis)
    /// * `y` - Y component (height axis)
    /// * `z` - Z component (depth axis)
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Unit-cube extents, the size every new unit starts with.
    #[inline]
    pub const fn one() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    /// Returns a copy with the Y component replaced.
    #[inline]
    pub const fn with_y(self, y: f64) -> Self {
        Self::new(self.x, y, self.z)
    }

    /// Calculates the volume (product of all components).
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Calculates the floor area (X × Z product).
    #[inline]
    pub fn floor_area(&self) -> f64 {
        self.x * self.z
    }

    /// Checks if all components are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Checks if all components are positive and finite.
    #[inline]
    pub fn is_valid_dimension(&self) -> bool {
        self.x > 0.0 && self.y > 0.0 && self.z > 0.0 && self.is_finite()
    }

    /// Raises every component to at least `min`.
    #[inline]
    pub fn clamp_min(&self, min: f64) -> Self {
        Self::new(self.x.max(min), self.y.max(min), self.z.max(min))
    }

    /// Component-wise comparison with tolerance.
    #[inline]
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl From<[f64; 3]> for Vec3 {
    #[inline]
    fn from(array: [f64; 3]) -> Self {
        Self::new(array[0], array[1], array[2])
    }
}

impl From<Vec3> for [f64; 3] {
    #[inline]
    fn from(vec: Vec3) -> Self {
        [vec.x, vec.y, vec.z]
    }
}

/// Horizontal axis-aligned bounding box of a unit (its footprint).
///
/// Height is deliberately absent: stacking only cares about what lies
/// beneath a footprint, not about vertical extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint {
    pub min_x: f64,
    pub max_x: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Footprint {
    /// Creates a footprint from explicit edges.
    #[inline]
    pub const fn new(min_x: f64, max_x: f64, min_z: f64, max_z: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_z,
            max_z,
        }
    }

    /// Width along X.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Depth along Z.
    #[inline]
    pub fn depth(&self) -> f64 {
        self.max_z - self.min_z
    }

    /// Floor area covered by the footprint.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.depth()
    }

    /// Center point on the floor as `(x, z)`.
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_z + self.max_z) / 2.0,
        )
    }
}

/// Validation functions for scalar inputs.
pub mod validation {

    /// Validates a single extent.
    ///
    /// # Parameters
    /// * `value` - The value to validate
    /// * `name` - Name of the extent for error messages
    ///
    /// # Returns
    /// `Ok(())` for valid values, otherwise error text
    pub fn validate_extent(value: f64, name: &str) -> Result<(), String> {
        if value.is_nan() {
            return Err(format!("{} must not be NaN", name));
        }
        if value.is_infinite() {
            return Err(format!("{} must not be infinite", name));
        }
        if value <= 0.0 {
            return Err(format!("{} must be positive, got: {}", name, value));
        }
        Ok(())
    }

    /// Validates a coordinate, which may be negative but must be finite.
    pub fn validate_coordinate(value: f64, name: &str) -> Result<(), String> {
        if !value.is_finite() {
            return Err(format!("{} must be finite, got: {}", name, value));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(a.with_y(9.0), Vec3::new(1.0, 9.0, 3.0));
    }

    #[test]
    fn test_vec3_default_is_origin() {
        assert_eq!(Vec3::default(), Vec3::zero());
    }

    #[test]
    fn test_vec3_volume_and_area() {
        let dims = Vec3::new(2.0, 3.0, 4.0);
        assert!((dims.volume() - 24.0).abs() < EPSILON_GENERAL);
        assert!((dims.floor_area() - 8.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_vec3_serializes_as_array() {
        let json = serde_json::to_string(&Vec3::new(1.0, 0.5, -2.0)).unwrap();
        assert_eq!(json, "[1.0,0.5,-2.0]");

        let parsed: Vec3 = serde_json::from_str("[3, 4.5, 6]").unwrap();
        assert_eq!(parsed, Vec3::new(3.0, 4.5, 6.0));
    }

    #[test]
    fn test_vec3_clamp_min_and_validity() {
        let dims = Vec3::new(0.0, 2.0, 0.05).clamp_min(MIN_UNIT_EXTENT);
        assert_eq!(dims, Vec3::new(0.1, 2.0, 0.1));
        assert!(dims.is_valid_dimension());
        assert!(!Vec3::new(1.0, f64::NAN, 1.0).is_valid_dimension());
    }

    #[test]
    fn test_footprint_measures() {
        let fp = Footprint::new(-1.0, 1.0, 0.0, 3.0);
        assert!((fp.width() - 2.0).abs() < EPSILON_GENERAL);
        assert!((fp.depth() - 3.0).abs() < EPSILON_GENERAL);
        assert!((fp.area() - 6.0).abs() < EPSILON_GENERAL);
        assert_eq!(fp.center(), (0.0, 1.5));
    }

    #[test]
    fn test_validation_extent() {
        assert!(validation::validate_extent(10.0, "Width").is_ok());
        assert!(validation::validate_extent(0.0, "Width").is_err());
        assert!(validation::validate_extent(-1.0, "Width").is_err());
        assert!(validation::validate_extent(f64::NAN, "Width").is_err());
        assert!(validation::validate_extent(f64::INFINITY, "Width").is_err());
    }

    #[test]
    fn test_validation_coordinate() {
        assert!(validation::validate_coordinate(-4.0, "x").is_ok());
        assert!(validation::validate_coordinate(f64::NEG_INFINITY, "x").is_err());
    }
}
