//! Geometric helpers for footprint overlap and bounds containment.
//!
//! All functions are pure: they take centers, extents and tolerances and
//! never look at the unit collection.

use crate::types::{EPSILON_GENERAL, Footprint};

/// Builds the footprint of a box from its horizontal center and extents.
///
/// # Parameters
/// * `center` - Center `(x, z)` on the floor
/// * `extent` - Full `(width, depth)` of the box
///
/// # Example
/// ```
/// use warehouse_layout::geometry::footprint_of;
///
/// let fp = footprint_of((1.0, 0.0), (2.0, 4.0));
/// assert_eq!((fp.min_x, fp.max_x, fp.min_z, fp.max_z), (0.0, 2.0, -2.0, 2.0));
/// ```
pub fn footprint_of(center: (f64, f64), extent: (f64, f64)) -> Footprint {
    let (cx, cz) = center;
    let (half_w, half_d) = (extent.0 / 2.0, extent.1 / 2.0);
    Footprint::new(cx - half_w, cx + half_w, cz - half_d, cz + half_d)
}

/// Checks whether two footprints overlap by more than `epsilon` on both axes.
///
/// Boxes that touch at an edge, or that overlap by a sliver no wider than
/// `epsilon`, do not count. This keeps neighbours placed side by side from
/// being stacked onto each other due to floating-point drift.
pub fn overlaps(a: &Footprint, b: &Footprint, epsilon: f64) -> bool {
    a.min_x < b.max_x - epsilon
        && a.max_x > b.min_x + epsilon
        && a.min_z < b.max_z - epsilon
        && a.max_z > b.min_z + epsilon
}

/// Calculates the overlap of two intervals in one dimension.
///
/// # Returns
/// Length of the overlap, at least 0.0
///
/// # Example
/// ```
/// use warehouse_layout::geometry::overlap_1d;
///
/// assert_eq!(overlap_1d(0.0, 5.0, 3.0, 8.0), 2.0);
/// ```
pub fn overlap_1d(a1: f64, a2: f64, b1: f64, b2: f64) -> f64 {
    (a2.min(b2) - a1.max(b1)).max(0.0)
}

/// Overlap area of two footprints.
pub fn overlap_area(a: &Footprint, b: &Footprint) -> f64 {
    overlap_1d(a.min_x, a.max_x, b.min_x, b.max_x) * overlap_1d(a.min_z, a.max_z, b.min_z, b.max_z)
}

/// Clamps a center coordinate so `[value - half_extent, value + half_extent]`
/// stays within `[min, max]`.
///
/// When the interval is wider than the range it cannot fit at all; the center
/// of the range is returned so the overhang is split evenly on both sides.
pub fn clamp_interval(value: f64, half_extent: f64, min: f64, max: f64) -> f64 {
    let lo = min + half_extent;
    let hi = max - half_extent;
    if lo > hi {
        return (min + max) / 2.0;
    }
    value.clamp(lo, hi)
}

/// Checks whether `inner` lies fully within `outer` (with general tolerance).
pub fn footprint_within(inner: &Footprint, outer: &Footprint) -> bool {
    inner.min_x >= outer.min_x - EPSILON_GENERAL
        && inner.max_x <= outer.max_x + EPSILON_GENERAL
        && inner.min_z >= outer.min_z - EPSILON_GENERAL
        && inner.max_z <= outer.max_z + EPSILON_GENERAL
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_OVERLAP_EPSILON;

    #[test]
    fn footprint_is_centered() {
        let fp = footprint_of((0.0, 0.0), (1.0, 1.0));
        assert_eq!(fp, Footprint::new(-0.5, 0.5, -0.5, 0.5));
    }

    #[test]
    fn overlapping_boxes_are_detected() {
        let a = footprint_of((0.0, 0.0), (2.0, 2.0));
        let b = footprint_of((1.0, 1.0), (2.0, 2.0));
        assert!(overlaps(&a, &b, DEFAULT_OVERLAP_EPSILON));
        assert!(overlaps(&b, &a, DEFAULT_OVERLAP_EPSILON));
    }

    #[test]
    fn touching_boxes_do_not_overlap() {
        let a = footprint_of((0.0, 0.0), (1.0, 1.0));
        let b = footprint_of((1.0, 0.0), (1.0, 1.0));
        assert!(!overlaps(&a, &b, DEFAULT_OVERLAP_EPSILON));
        // Even without tolerance, shared edges are not an overlap.
        assert!(!overlaps(&a, &b, 0.0));
    }

    #[test]
    fn sliver_overlap_within_epsilon_is_ignored() {
        let a = footprint_of((0.0, 0.0), (1.0, 1.0));
        let b = footprint_of((0.95, 0.0), (1.0, 1.0));
        assert!(!overlaps(&a, &b, DEFAULT_OVERLAP_EPSILON));
        assert!(overlaps(&a, &b, 0.0));
    }

    #[test]
    fn overlap_area_of_offset_squares() {
        let a = footprint_of((0.0, 0.0), (2.0, 2.0));
        let b = footprint_of((1.0, 1.0), (2.0, 2.0));
        assert!((overlap_area(&a, &b) - 1.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn clamp_interval_keeps_extent_inside() {
        assert_eq!(clamp_interval(5.0, 1.0, -2.0, 2.0), 1.0);
        assert_eq!(clamp_interval(-5.0, 1.0, -2.0, 2.0), -1.0);
        assert_eq!(clamp_interval(0.3, 1.0, -2.0, 2.0), 0.3);
    }

    #[test]
    fn clamp_interval_centers_oversized_extent() {
        assert_eq!(clamp_interval(3.0, 5.0, -2.0, 2.0), 0.0);
    }

    #[test]
    fn within_respects_edges() {
        let outer = Footprint::new(-2.0, 2.0, -2.0, 2.0);
        assert!(footprint_within(&footprint_of((1.0, 1.0), (2.0, 2.0)), &outer));
        assert!(!footprint_within(&footprint_of((1.5, 1.0), (2.0, 2.0)), &outer));
    }
}
