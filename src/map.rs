//! Top-down 2D projection of the layout.
//!
//! Positions and sizes are expressed in percent of the warehouse floor,
//! with the top-left corner of the map at `(-width/2, -depth/2)`.

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{Bounds, Unit, UnitId};

/// One unit on the map.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct MapRect {
    pub id: UnitId,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
    pub label: String,
    pub selected: bool,
    pub highlighted: bool,
}

/// The whole map with a utilization summary.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct MapView {
    pub rects: Vec<MapRect>,
    pub unit_count: usize,
    /// Sum of unit floor areas relative to the warehouse floor, in percent.
    /// Stacked units are counted separately, so this can exceed 100.
    pub utilization_percent: f64,
}

/// Projects units onto the floor plan.
///
/// # Parameters
/// * `units` - Units to draw
/// * `bounds` - Warehouse bounds the percentages refer to
/// * `selected` - Currently selected unit, drawn highlighted
/// * `matches` - Units matching the active search
pub fn project(
    units: &[Unit],
    bounds: &Bounds,
    selected: Option<UnitId>,
    matches: &[UnitId],
) -> MapView {
    let rects = units
        .iter()
        .map(|unit| {
            let (w, d) = (unit.size.x, unit.size.z);
            MapRect {
                id: unit.id,
                left: (unit.position.x - w / 2.0 + bounds.width / 2.0) / bounds.width * 100.0,
                top: (unit.position.z - d / 2.0 + bounds.depth / 2.0) / bounds.depth * 100.0,
                width: w / bounds.width * 100.0,
                height: d / bounds.depth * 100.0,
                color: unit.item.color.clone(),
                label: unit.item.sku.clone(),
                selected: selected == Some(unit.id),
                highlighted: matches.contains(&unit.id),
            }
        })
        .collect();

    MapView {
        rects,
        unit_count: units.len(),
        utilization_percent: utilization_percent(units, bounds),
    }
}

/// Floor utilization in percent.
pub fn utilization_percent(units: &[Unit], bounds: &Bounds) -> f64 {
    let total = bounds.floor_area();
    if total <= 0.0 {
        return 0.0;
    }
    let used: f64 = units.iter().map(|unit| unit.size.floor_area()).sum();
    used / total * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;
    use crate::types::{EPSILON_GENERAL, Vec3};

    fn unit(id: u64, x: f64, z: f64, w: f64, d: f64) -> Unit {
        Unit::new(
            UnitId(id),
            Vec3::new(x, 0.5, z),
            Vec3::new(w, 1.0, d),
            Item::numbered(id as usize),
        )
        .unwrap()
    }

    #[test]
    fn projects_into_percent_of_floor() {
        let units = vec![unit(1, 0.0, 0.0, 2.0, 4.0)];
        let view = project(&units, &Bounds::default(), Some(UnitId(1)), &[]);
        let rect = &view.rects[0];

        assert!((rect.left - 45.0).abs() < EPSILON_GENERAL);
        assert!((rect.top - 40.0).abs() < EPSILON_GENERAL);
        assert!((rect.width - 10.0).abs() < EPSILON_GENERAL);
        assert!((rect.height - 20.0).abs() < EPSILON_GENERAL);
        assert!(rect.selected);
        assert!(!rect.highlighted);
        assert_eq!(rect.label, "Item1");
    }

    #[test]
    fn corner_unit_starts_at_zero() {
        let units = vec![unit(1, -9.5, -9.5, 1.0, 1.0)];
        let view = project(&units, &Bounds::default(), None, &[UnitId(1)]);
        assert!(view.rects[0].left.abs() < EPSILON_GENERAL);
        assert!(view.rects[0].top.abs() < EPSILON_GENERAL);
        assert!(view.rects[0].highlighted);
    }

    #[test]
    fn utilization_sums_floor_areas() {
        let units = vec![unit(1, 0.0, 0.0, 2.0, 2.0), unit(2, 5.0, 5.0, 1.0, 4.0)];
        let bounds = Bounds::new(10.0, 10.0, 5.0).unwrap();
        let view = project(&units, &bounds, None, &[]);
        assert_eq!(view.unit_count, 2);
        assert!((view.utilization_percent - 8.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn empty_layout_has_zero_utilization() {
        assert_eq!(utilization_percent(&[], &Bounds::default()), 0.0);
    }
}
