//! The layout collection manager.
//!
//! [`LayoutManager`] owns the authoritative unit list and warehouse bounds.
//! Every mutating operation builds the complete new collection and swaps it
//! in as one step, pushing the previous state onto a bounded history. Undo
//! and redo are the only mutations that do not push.
//!
//! Selection and the copy/paste clipboard are kept here as well, keyed by
//! [`UnitId`], but they are transient and never enter history.

use tracing::debug;

use crate::history::History;
use crate::model::{
    Bounds, Item, ItemPatch, Unit, UnitId, ValidationError, normalize_size, validate_position,
};
use crate::placement::PlacementConfig;
use crate::snap::clamp_to_bounds;
use crate::stacking::{resolve_height, settle_above};
use crate::types::{EPSILON_GENERAL, Vec3};

/// Errors raised by editing operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditorError {
    #[error("unit {0} not found")]
    UnitNotFound(UnitId),
    #[error("no unit is selected")]
    NothingSelected,
    #[error("clipboard is empty")]
    ClipboardEmpty,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Full state captured by one history entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub units: Vec<Unit>,
    pub bounds: Bounds,
}

/// Owner of the authoritative unit collection.
#[derive(Clone, Debug)]
pub struct LayoutManager {
    units: Vec<Unit>,
    bounds: Bounds,
    history: History<Snapshot>,
    next_id: u64,
    selected: Option<UnitId>,
    clipboard: Option<Unit>,
    config: PlacementConfig,
}

impl LayoutManager {
    /// Horizontal offset applied to pasted units so they do not land on the original.
    pub const PASTE_OFFSET: f64 = 1.0;

    /// Creates an empty layout.
    pub fn new(bounds: Bounds, config: PlacementConfig) -> Self {
        Self::with_units(Vec::new(), bounds, config)
    }

    /// Creates a layout from existing units without recording history.
    pub fn with_units(units: Vec<Unit>, bounds: Bounds, config: PlacementConfig) -> Self {
        let next_id = next_free_id(&units, 0);
        Self {
            units,
            bounds,
            history: History::new(config.history_limit),
            next_id,
            selected: None,
            clipboard: None,
            config,
        }
    }

    /// The layout a fresh editor starts with: a single unit at the origin.
    pub fn seeded(config: PlacementConfig) -> Self {
        Self::with_units(vec![Self::seed_unit()], Bounds::default(), config)
    }

    /// Starter unit of a new layout.
    pub fn seed_unit() -> Unit {
        Unit {
            id: UnitId(0),
            position: Vec3::new(0.0, 0.5, 0.0),
            size: Vec3::one(),
            item: Item {
                sku: "Item1".to_string(),
                quantity: 10,
                category: "Electronics".to_string(),
                ..Item::default()
            },
        }
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    /// Size of a unit, for editing panels.
    pub fn unit_footprint(&self, id: UnitId) -> Option<Vec3> {
        self.unit(id).map(|unit| unit.size)
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn selected(&self) -> Option<UnitId> {
        self.selected
    }

    pub fn selected_unit(&self) -> Option<&Unit> {
        self.selected.and_then(|id| self.unit(id))
    }

    pub fn clipboard(&self) -> Option<&Unit> {
        self.clipboard.as_ref()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            units: self.units.clone(),
            bounds: self.bounds,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    /// Swaps in a new collection and records the previous one.
    fn apply(&mut self, units: Vec<Unit>, bounds: Bounds) {
        let previous = Snapshot {
            units: std::mem::replace(&mut self.units, units),
            bounds: std::mem::replace(&mut self.bounds, bounds),
        };
        self.history.push(previous);
        self.after_replace();
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.units = snapshot.units;
        self.bounds = snapshot.bounds;
        self.after_replace();
    }

    fn after_replace(&mut self) {
        self.next_id = next_free_id(&self.units, self.next_id);
        if let Some(id) = self.selected {
            if self.unit(id).is_none() {
                self.selected = None;
            }
        }
    }

    fn allocate_id(&mut self) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        id
    }

    fn require(&self, id: UnitId) -> Result<&Unit, EditorError> {
        self.unit(id).ok_or(EditorError::UnitNotFound(id))
    }

    /// Builds a copy of the collection with one unit replaced.
    fn with_replaced(&self, updated: Unit) -> Vec<Unit> {
        self.units
            .iter()
            .map(|unit| {
                if unit.id == updated.id {
                    updated.clone()
                } else {
                    unit.clone()
                }
            })
            .collect()
    }

    /// Adds a 1×1×1 unit at the floor origin, resting on whatever is there.
    pub fn add_unit(&mut self) -> UnitId {
        let item = Item::numbered(self.units.len() + 1);
        let id = self.allocate_id();
        let mut unit = Unit {
            id,
            position: Vec3::zero(),
            size: Vec3::one(),
            item,
        };
        unit.position.y = resolve_height(&unit, 0.0, 0.0, &self.units, self.config.overlap_epsilon);

        let mut units = self.units.clone();
        units.push(unit);
        self.apply(units, self.bounds);
        debug!(unit = %id, "unit added");
        id
    }

    /// Removes a unit. Clears the selection if it pointed at it.
    pub fn remove_unit(&mut self, id: UnitId) -> Result<Unit, EditorError> {
        let removed = self.require(id)?.clone();
        let units = self
            .units
            .iter()
            .filter(|unit| unit.id != id)
            .cloned()
            .collect();
        self.apply(units, self.bounds);
        debug!(unit = %id, "unit removed");
        Ok(removed)
    }

    /// Merges `patch` into the unit's item.
    pub fn update_item(&mut self, id: UnitId, patch: &ItemPatch) -> Result<Unit, EditorError> {
        let mut updated = self.require(id)?.clone();
        updated.item = patch.apply_to(&updated.item);
        self.apply(self.with_replaced(updated.clone()), self.bounds);
        Ok(updated)
    }

    /// Replaces the unit's item wholesale.
    pub fn set_item(&mut self, id: UnitId, item: Item) -> Result<Unit, EditorError> {
        let mut updated = self.require(id)?.clone();
        updated.item = item;
        self.apply(self.with_replaced(updated.clone()), self.bounds);
        Ok(updated)
    }

    /// Resizes a unit.
    ///
    /// Extents below the configured minimum are raised to it. The unit keeps
    /// its horizontal center unless the new footprint would leave the floor,
    /// in which case it is clamped back inside. It rests on whatever lay
    /// below its old bottom, and everything that was stacked on it is
    /// re-settled onto the new top. The whole change is one history entry.
    pub fn update_size(&mut self, id: UnitId, size: Vec3) -> Result<Unit, EditorError> {
        let size = normalize_size(size, self.config.min_extent)?;
        let original = self.require(id)?.clone();
        let mut updated = original.clone();
        updated.size = size;

        let (x, z) = clamp_to_bounds(
            (original.position.x, original.position.z),
            (size.x, size.z),
            &self.bounds,
        );
        let floor_level = original.bottom() + EPSILON_GENERAL;
        let below: Vec<Unit> = self
            .units
            .iter()
            .filter(|unit| unit.id != id && unit.top() <= floor_level)
            .cloned()
            .collect();
        updated.position = Vec3::new(
            x,
            resolve_height(&updated, x, z, &below, self.config.overlap_epsilon),
            z,
        );

        let units = settle_above(
            &self.with_replaced(updated.clone()),
            &original,
            self.config.overlap_epsilon,
        );
        debug!(unit = %id, size = ?size, "resized unit");
        self.apply(units, self.bounds);
        Ok(updated)
    }

    /// Writes an already resolved position.
    pub fn update_position(&mut self, id: UnitId, position: Vec3) -> Result<Unit, EditorError> {
        validate_position(position)?;
        let mut updated = self.require(id)?.clone();
        updated.position = position;
        self.apply(self.with_replaced(updated.clone()), self.bounds);
        Ok(updated)
    }

    /// Changes the warehouse bounds. Existing units are left where they are.
    pub fn set_bounds(&mut self, bounds: Bounds) -> Result<(), EditorError> {
        bounds.validate()?;
        self.apply(self.units.clone(), bounds);
        Ok(())
    }

    /// Replaces the whole collection, e.g. after an import or a layout switch.
    pub fn replace_all(&mut self, units: Vec<Unit>, bounds: Bounds) {
        self.apply(units, bounds);
    }

    /// Restores the state before the last committed edit.
    ///
    /// # Returns
    /// `false` when there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.snapshot()) {
            Some(previous) => {
                self.restore(previous);
                debug!(remaining = self.history.undo_depth(), "undo");
                true
            }
            None => false,
        }
    }

    /// Re-applies the last undone edit.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.snapshot()) {
            Some(next) => {
                self.restore(next);
                debug!(remaining = self.history.redo_depth(), "redo");
                true
            }
            None => false,
        }
    }

    /// Selects a unit, or clears the selection with `None`.
    pub fn select(&mut self, id: Option<UnitId>) -> Result<(), EditorError> {
        if let Some(id) = id {
            self.require(id)?;
        }
        self.selected = id;
        Ok(())
    }

    /// Deletes the selected unit and clears the selection.
    pub fn delete_selected(&mut self) -> Result<Unit, EditorError> {
        let id = self.selected.ok_or(EditorError::NothingSelected)?;
        let removed = self.remove_unit(id)?;
        self.selected = None;
        Ok(removed)
    }

    /// Copies the selected unit to the clipboard.
    pub fn copy_selected(&mut self) -> Result<(), EditorError> {
        let unit = self
            .selected_unit()
            .cloned()
            .ok_or(EditorError::NothingSelected)?;
        self.clipboard = Some(unit);
        Ok(())
    }

    /// Inserts a copy of the clipboard unit with a fresh id, next to the original.
    ///
    /// The copy is kept inside bounds, stacked onto whatever it lands on and
    /// becomes the selection.
    pub fn paste(&mut self) -> Result<UnitId, EditorError> {
        let template = self.clipboard.clone().ok_or(EditorError::ClipboardEmpty)?;
        let id = self.allocate_id();
        let (x, z) = clamp_to_bounds(
            (template.position.x + Self::PASTE_OFFSET, template.position.z),
            (template.size.x, template.size.z),
            &self.bounds,
        );
        let mut unit = Unit { id, ..template };
        let y = resolve_height(&unit, x, z, &self.units, self.config.overlap_epsilon);
        unit.position = Vec3::new(x, y, z);

        let mut units = self.units.clone();
        units.push(unit);
        self.apply(units, self.bounds);
        self.selected = Some(id);
        debug!(unit = %id, "unit pasted");
        Ok(id)
    }

    /// Ids of units whose SKU or category contains `query` (case-insensitive).
    ///
    /// A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<UnitId> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.units
            .iter()
            .filter(|unit| unit.item.matches_lowercase(&query))
            .map(|unit| unit.id)
            .collect()
    }
}

impl Default for LayoutManager {
    fn default() -> Self {
        Self::seeded(PlacementConfig::default())
    }
}

fn next_free_id(units: &[Unit], current: u64) -> u64 {
    units
        .iter()
        .map(|unit| unit.id.0 + 1)
        .max()
        .unwrap_or(0)
        .max(current)
}
