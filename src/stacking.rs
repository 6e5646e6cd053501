//! Vertical stacking resolution.
//!
//! A unit always rests either on the floor or on top of the tallest unit
//! whose footprint overlaps its own. Horizontal overlap is never rejected;
//! it is resolved by lifting the moving unit above everything beneath it.

use std::collections::HashMap;

use crate::geometry::overlaps;
use crate::model::{Unit, UnitId};
use crate::types::EPSILON_GENERAL;

/// Units whose footprints overlap `moving` when it is centered at `(x, z)`.
///
/// The moving unit itself is skipped by id, so passing the full collection
/// (which still contains the unit at its old position) is fine.
pub fn supporting_units<'a>(
    moving: &'a Unit,
    x: f64,
    z: f64,
    units: &'a [Unit],
    epsilon: f64,
) -> impl Iterator<Item = &'a Unit> + 'a {
    let footprint = moving.footprint_at(x, z);
    units
        .iter()
        .filter(move |other| other.id != moving.id)
        .filter(move |other| overlaps(&footprint, &other.footprint(), epsilon))
}

/// Height of the surface a unit centered at `(x, z)` would rest on.
///
/// # Returns
/// The top face of the tallest overlapping neighbour, or `0.0` for the floor.
pub fn resting_surface(moving: &Unit, x: f64, z: f64, units: &[Unit], epsilon: f64) -> f64 {
    supporting_units(moving, x, z, units, epsilon)
        .map(Unit::top)
        .fold(0.0, f64::max)
}

/// Resolves the center height of `moving` at the candidate position `(x, z)`.
///
/// # Parameters
/// * `moving` - The unit being placed (its own position is ignored)
/// * `x`, `z` - Candidate horizontal center, snapped or raw
/// * `units` - Every unit in the layout
/// * `epsilon` - Footprint overlap tolerance
///
/// # Returns
/// `resting surface + moving.size.y / 2`
pub fn resolve_height(moving: &Unit, x: f64, z: f64, units: &[Unit], epsilon: f64) -> f64 {
    resting_surface(moving, x, z, units, epsilon) + moving.size.y / 2.0
}

/// Looks up `id` in `units` and resolves its height at `(x, z)`.
///
/// Returns `None` when the unit is not part of the collection.
pub fn resolve_height_by_id(
    id: UnitId,
    x: f64,
    z: f64,
    units: &[Unit],
    epsilon: f64,
) -> Option<f64> {
    let moving = units.iter().find(|unit| unit.id == id)?;
    Some(resolve_height(moving, x, z, units, epsilon))
}

/// Re-stacks everything that sat on or above the top of `before`.
///
/// `units` already holds the changed unit; `before` is its previous state.
/// Units whose bottom was at or above the old top are lifted or lowered in
/// ascending order of their bottom face, each resting on what has already
/// been settled. Everything else keeps its position.
///
/// # Returns
/// The collection in its original order.
pub fn settle_above(units: &[Unit], before: &Unit, epsilon: f64) -> Vec<Unit> {
    let threshold = before.top() - EPSILON_GENERAL;
    let (mut above, mut settled): (Vec<Unit>, Vec<Unit>) = units
        .iter()
        .cloned()
        .partition(|unit| unit.id != before.id && unit.bottom() >= threshold);
    above.sort_by(|a, b| a.bottom().total_cmp(&b.bottom()));

    for mut unit in above {
        unit.position.y = resolve_height(
            &unit,
            unit.position.x,
            unit.position.z,
            &settled,
            epsilon,
        );
        settled.push(unit);
    }

    let mut by_id: HashMap<UnitId, Unit> =
        settled.into_iter().map(|unit| (unit.id, unit)).collect();
    units
        .iter()
        .filter_map(|unit| by_id.remove(&unit.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;
    use crate::types::{DEFAULT_OVERLAP_EPSILON, EPSILON_GENERAL, Vec3};

    fn unit(id: u64, position: (f64, f64, f64), size: (f64, f64, f64)) -> Unit {
        Unit::new(
            UnitId(id),
            Vec3::new(position.0, position.1, position.2),
            Vec3::new(size.0, size.1, size.2),
            Item::default(),
        )
        .unwrap()
    }

    #[test]
    fn lone_unit_rests_on_floor() {
        let units = vec![unit(1, (3.0, 7.0, 3.0), (1.0, 2.0, 1.0))];
        let y = resolve_height(&units[0], 3.0, 3.0, &units, DEFAULT_OVERLAP_EPSILON);
        assert!((y - 1.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn unit_stacks_on_overlapping_neighbour() {
        let base = unit(1, (0.0, 1.0, 0.0), (1.0, 2.0, 1.0));
        let moving = unit(2, (5.0, 0.5, 5.0), (1.0, 1.0, 1.0));
        let units = vec![base, moving.clone()];

        let y = resolve_height(&moving, 0.0, 0.0, &units, DEFAULT_OVERLAP_EPSILON);
        assert!((y - 2.5).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn straddling_unit_rests_on_the_taller_neighbour() {
        let low = unit(1, (-0.5, 0.5, 0.0), (1.0, 1.0, 1.0));
        let high = unit(2, (0.5, 1.5, 0.0), (1.0, 3.0, 1.0));
        let moving = unit(3, (9.0, 0.5, 9.0), (2.0, 1.0, 1.0));
        let units = vec![low, high, moving.clone()];

        let y = resolve_height(&moving, 0.0, 0.0, &units, DEFAULT_OVERLAP_EPSILON);
        assert!((y - 3.5).abs() < EPSILON_GENERAL);
        assert_eq!(
            supporting_units(&moving, 0.0, 0.0, &units, DEFAULT_OVERLAP_EPSILON).count(),
            2
        );
    }

    #[test]
    fn adjacent_units_do_not_stack() {
        let left = unit(1, (0.0, 0.5, 0.0), (1.0, 1.0, 1.0));
        let right = unit(2, (1.0, 0.5, 0.0), (1.0, 1.0, 1.0));
        let units = vec![left.clone(), right.clone()];

        let y_left = resolve_height(&left, 0.0, 0.0, &units, DEFAULT_OVERLAP_EPSILON);
        let y_right = resolve_height(&right, 1.0, 0.0, &units, DEFAULT_OVERLAP_EPSILON);
        assert!((y_left - 0.5).abs() < EPSILON_GENERAL);
        assert!((y_right - 0.5).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn own_old_position_is_ignored() {
        let moving = unit(1, (0.0, 0.5, 0.0), (1.0, 1.0, 1.0));
        let units = vec![moving.clone()];
        let y = resolve_height(&moving, 0.0, 0.0, &units, DEFAULT_OVERLAP_EPSILON);
        assert!((y - 0.5).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn resolve_by_unknown_id_is_none() {
        let units = vec![unit(1, (0.0, 0.5, 0.0), (1.0, 1.0, 1.0))];
        assert!(resolve_height_by_id(UnitId(9), 0.0, 0.0, &units, DEFAULT_OVERLAP_EPSILON).is_none());
        assert!(resolve_height_by_id(UnitId(1), 0.0, 0.0, &units, DEFAULT_OVERLAP_EPSILON).is_some());
    }

    #[test]
    fn settle_above_follows_a_taller_base() {
        let before = unit(1, (0.0, 0.5, 0.0), (1.0, 1.0, 1.0));
        let grown = unit(1, (0.0, 1.5, 0.0), (1.0, 3.0, 1.0));
        let units = vec![
            grown,
            unit(2, (0.0, 1.5, 0.0), (1.0, 1.0, 1.0)),
            unit(3, (0.0, 2.5, 0.0), (1.0, 1.0, 1.0)),
            unit(4, (4.0, 0.5, 4.0), (1.0, 1.0, 1.0)),
        ];

        let settled = settle_above(&units, &before, DEFAULT_OVERLAP_EPSILON);
        let ids: Vec<UnitId> = settled.iter().map(|unit| unit.id).collect();
        assert_eq!(ids, vec![UnitId(1), UnitId(2), UnitId(3), UnitId(4)]);
        assert!((settled[1].position.y - 3.5).abs() < EPSILON_GENERAL);
        assert!((settled[2].position.y - 4.5).abs() < EPSILON_GENERAL);
        assert!((settled[3].position.y - 0.5).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn settle_above_drops_load_onto_a_shorter_base() {
        let before = unit(1, (0.0, 1.5, 0.0), (1.0, 3.0, 1.0));
        let shrunk = unit(1, (0.0, 0.5, 0.0), (1.0, 1.0, 1.0));
        let units = vec![shrunk, unit(2, (0.0, 3.5, 0.0), (1.0, 1.0, 1.0))];

        let settled = settle_above(&units, &before, DEFAULT_OVERLAP_EPSILON);
        assert!((settled[1].position.y - 1.5).abs() < EPSILON_GENERAL);
    }
}
