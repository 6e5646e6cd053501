//! Grid snapping of unit footprints.
//!
//! Snapping aligns the low edge of a footprint (`center - half_extent`) to
//! the nearest integer grid line on each horizontal axis, then clamps the
//! result so the whole footprint stays on the floor. Clamping wins over grid
//! alignment: a unit pushed against a wall rests flush with the wall even
//! when that edge is not on a grid line.

use crate::geometry::clamp_interval;
use crate::model::Bounds;
use crate::types::EPSILON_GENERAL;

/// Rounds half-way values upward, so `-0.5` becomes `0.0` and `0.5` becomes `1.0`.
///
/// `f64::round` rounds half away from zero, which would make snapping on the
/// negative half of the floor asymmetric to the positive half.
#[inline]
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Snaps one axis.
///
/// # Parameters
/// * `center` - Requested center coordinate
/// * `extent` - Full extent of the unit along this axis
/// * `min` / `max` - Range the footprint must stay inside
///
/// # Returns
/// The snapped center coordinate.
///
/// A footprint that already sits flush against one of the walls is left
/// there. Walls act as snap lines of their own; without that, a unit clamped
/// to a wall off the grid would be pulled back inward by a second snap.
pub fn snap_axis(center: f64, extent: f64, min: f64, max: f64) -> f64 {
    let half = extent / 2.0;
    let lowest_edge = min;
    let highest_edge = max - extent;
    if lowest_edge > highest_edge {
        return clamp_interval(center, half, min, max);
    }

    let edge = center - half;
    if (edge - lowest_edge).abs() <= EPSILON_GENERAL {
        return lowest_edge + half;
    }
    if (edge - highest_edge).abs() <= EPSILON_GENERAL {
        return highest_edge + half;
    }

    let snapped_edge = round_half_up(edge);
    clamp_interval(snapped_edge + half, half, min, max)
}

/// Snaps a horizontal position to the grid inside `bounds`.
///
/// # Parameters
/// * `position` - Requested center `(x, z)`
/// * `extent` - Unit `(width, depth)`
/// * `bounds` - Warehouse floor, centered at the origin
///
/// # Example
/// ```
/// use warehouse_layout::model::Bounds;
/// use warehouse_layout::snap::snap;
///
/// let bounds = Bounds::new(4.0, 4.0, 5.0).unwrap();
/// assert_eq!(snap((1.3, 1.8), (2.0, 2.0), &bounds), (1.0, 1.0));
/// ```
pub fn snap(position: (f64, f64), extent: (f64, f64), bounds: &Bounds) -> (f64, f64) {
    let floor = bounds.floor();
    (
        snap_axis(position.0, extent.0, floor.min_x, floor.max_x),
        snap_axis(position.1, extent.1, floor.min_z, floor.max_z),
    )
}

/// Keeps a horizontal position inside `bounds` without grid alignment.
pub fn clamp_to_bounds(position: (f64, f64), extent: (f64, f64), bounds: &Bounds) -> (f64, f64) {
    let floor = bounds.floor();
    (
        clamp_interval(position.0, extent.0 / 2.0, floor.min_x, floor.max_x),
        clamp_interval(position.1, extent.1 / 2.0, floor.min_z, floor.max_z),
    )
}

/// Final horizontal position for a commit: snapped when enabled, otherwise only clamped.
pub fn resolve_horizontal(
    position: (f64, f64),
    extent: (f64, f64),
    bounds: &Bounds,
    snap_enabled: bool,
) -> (f64, f64) {
    if snap_enabled {
        snap(position, extent, bounds)
    } else {
        clamp_to_bounds(position, extent, bounds)
    }
}
