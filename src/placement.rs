//! Drag-and-drop placement of units.
//!
//! A [`PlacementSession`] follows one manipulation at a time:
//!
//! ```text
//! Idle --begin--> Dragging --tick (per frame)--> Dragging --commit--> Idle
//! ```
//!
//! While dragging, every tick samples the live horizontal position from the
//! renderer's transform handle and writes back a previewed resting height.
//! Nothing authoritative changes until the commit, which snaps (or clamps),
//! re-stacks at the final position and records the move in history.

use tracing::{debug, warn};

use crate::editor::LayoutManager;
use crate::model::{Unit, UnitId};
use crate::snap::resolve_horizontal;
use crate::stacking::resolve_height;
use crate::types::{DEFAULT_OVERLAP_EPSILON, EPSILON_GENERAL, MIN_UNIT_EXTENT, Vec3};

/// Tuning parameters for placement and editing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlacementConfig {
    /// Footprint overlap tolerance used by stacking
    pub overlap_epsilon: f64,
    /// Whether commits snap to the integer grid by default
    pub snap_enabled: bool,
    /// Maximum number of undo snapshots
    pub history_limit: usize,
    /// Smallest allowed extent on any axis
    pub min_extent: f64,
}

impl PlacementConfig {
    pub const DEFAULT_OVERLAP_EPSILON: f64 = DEFAULT_OVERLAP_EPSILON;
    pub const DEFAULT_SNAP_ENABLED: bool = true;
    pub const DEFAULT_HISTORY_LIMIT: usize = 20;
    pub const DEFAULT_MIN_EXTENT: f64 = MIN_UNIT_EXTENT;

    /// Creates a builder for custom configuration.
    pub fn builder() -> PlacementConfigBuilder {
        PlacementConfigBuilder::default()
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            overlap_epsilon: Self::DEFAULT_OVERLAP_EPSILON,
            snap_enabled: Self::DEFAULT_SNAP_ENABLED,
            history_limit: Self::DEFAULT_HISTORY_LIMIT,
            min_extent: Self::DEFAULT_MIN_EXTENT,
        }
    }
}

/// Builder for [`PlacementConfig`].
#[derive(Clone, Debug, Default)]
pub struct PlacementConfigBuilder {
    config: PlacementConfig,
}

impl PlacementConfigBuilder {
    pub fn overlap_epsilon(mut self, epsilon: f64) -> Self {
        self.config.overlap_epsilon = epsilon;
        self
    }

    pub fn snap_enabled(mut self, enabled: bool) -> Self {
        self.config.snap_enabled = enabled;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    pub fn min_extent(mut self, extent: f64) -> Self {
        self.config.min_extent = extent;
        self
    }

    pub fn build(self) -> PlacementConfig {
        self.config
    }
}

/// Live transform of a unit owned by the rendering layer.
///
/// The session reads the pointer-driven position from it every frame and
/// writes the previewed height back, without touching authoritative state.
pub trait TransformHandle {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
}

/// A plain in-memory transform, used when the renderer lives elsewhere and
/// only reports sampled positions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LiveTransform {
    pub position: Vec3,
}

impl LiveTransform {
    pub fn new(position: Vec3) -> Self {
        Self { position }
    }
}

impl TransformHandle for LiveTransform {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }
}

/// Notified after every successful commit (e.g. to play a confirmation sound).
pub trait PlacementObserver {
    fn on_commit_placement(&mut self, unit: &Unit);
}

impl<F> PlacementObserver for F
where
    F: FnMut(&Unit),
{
    fn on_commit_placement(&mut self, unit: &Unit) {
        self(unit)
    }
}

/// Errors when starting a drag.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlacementError {
    #[error("unit {0} does not exist")]
    UnknownUnit(UnitId),
    #[error("unit {0} is already being dragged")]
    AlreadyDragging(UnitId),
}

/// State of the current manipulation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        unit: UnitId,
        /// Authoritative position when the drag started
        origin: Vec3,
    },
}

/// Per-interaction state machine driving a single drag.
#[derive(Clone, Debug)]
pub struct PlacementSession {
    state: DragState,
    snap_enabled: bool,
}

impl PlacementSession {
    pub fn new(snap_enabled: bool) -> Self {
        Self {
            state: DragState::Idle,
            snap_enabled,
        }
    }

    pub fn from_config(config: &PlacementConfig) -> Self {
        Self::new(config.snap_enabled)
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Unit currently being dragged, if any.
    pub fn dragging_unit(&self) -> Option<UnitId> {
        match self.state {
            DragState::Dragging { unit, .. } => Some(unit),
            DragState::Idle => None,
        }
    }

    pub fn snap_enabled(&self) -> bool {
        self.snap_enabled
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.snap_enabled = enabled;
    }

    /// Pointer-down on the manipulation handle of `id`.
    ///
    /// Mirrors the authoritative position into the handle so the first tick
    /// starts from committed state.
    pub fn begin(
        &mut self,
        manager: &LayoutManager,
        id: UnitId,
        handle: &mut impl TransformHandle,
    ) -> Result<(), PlacementError> {
        if let DragState::Dragging { unit, .. } = self.state {
            return Err(PlacementError::AlreadyDragging(unit));
        }
        let unit = manager.unit(id).ok_or(PlacementError::UnknownUnit(id))?;
        handle.set_position(unit.position);
        self.state = DragState::Dragging {
            unit: id,
            origin: unit.position,
        };
        debug!(unit = %id, "drag started");
        Ok(())
    }

    /// Per-frame preview.
    ///
    /// Reads the unsnapped horizontal position from `handle`, resolves the
    /// resting height there and writes it back into the handle only.
    ///
    /// # Returns
    /// The previewed height, or `None` when idle or when the dragged unit
    /// no longer exists.
    pub fn tick(&self, manager: &LayoutManager, handle: &mut impl TransformHandle) -> Option<f64> {
        let id = self.dragging_unit()?;
        let moving = manager.unit(id)?;
        let live = handle.position();
        let y = resolve_height(
            moving,
            live.x,
            live.z,
            manager.units(),
            manager.config().overlap_epsilon,
        );
        handle.set_position(live.with_y(y));
        Some(y)
    }

    /// Pointer-up: resolves the final position and makes it authoritative.
    ///
    /// # Returns
    /// The committed unit, or `None` when no drag was active, the unit
    /// vanished during the drag, or its authoritative position changed
    /// underneath the drag (undo, import, layout switch). All are no-ops.
    pub fn commit(
        &mut self,
        manager: &mut LayoutManager,
        handle: &mut impl TransformHandle,
        observer: &mut impl PlacementObserver,
    ) -> Option<Unit> {
        let (id, origin) = match std::mem::take(&mut self.state) {
            DragState::Dragging { unit, origin } => (unit, origin),
            DragState::Idle => return None,
        };

        if let Some(current) = manager
            .unit(id)
            .map(|unit| unit.position)
            .filter(|position| !position.approx_eq(&origin, EPSILON_GENERAL))
        {
            warn!(unit = %id, "unit moved during the drag; dropping the release");
            handle.set_position(current);
            return None;
        }

        let live = handle.position();
        let Some(position) = resolve_placement(manager, id, live, self.snap_enabled) else {
            warn!(unit = %id, "commit for a unit that is no longer in the layout; ignoring");
            return None;
        };

        handle.set_position(position);
        if let Err(err) = manager.update_position(id, position) {
            warn!(unit = %id, error = %err, "commit could not be applied");
            return None;
        }

        let unit = manager.unit(id)?.clone();
        debug!(
            unit = %id,
            x = position.x,
            y = position.y,
            z = position.z,
            "placement committed"
        );
        observer.on_commit_placement(&unit);
        Some(unit)
    }

    /// Pointer capture lost mid-drag. Treated exactly like a release.
    pub fn abandon(
        &mut self,
        manager: &mut LayoutManager,
        handle: &mut impl TransformHandle,
        observer: &mut impl PlacementObserver,
    ) -> Option<Unit> {
        self.commit(manager, handle, observer)
    }
}

impl Default for PlacementSession {
    fn default() -> Self {
        Self::from_config(&PlacementConfig::default())
    }
}

/// Final position of `id` released at `live`: horizontal snap (or clamp)
/// followed by stacking at the resolved horizontal position.
pub fn resolve_placement(
    manager: &LayoutManager,
    id: UnitId,
    live: Vec3,
    snap_enabled: bool,
) -> Option<Vec3> {
    let moving = manager.unit(id)?;
    let (x, z) = resolve_horizontal(
        (live.x, live.z),
        (moving.size.x, moving.size.z),
        manager.bounds(),
        snap_enabled,
    );
    let y = resolve_height(
        moving,
        x,
        z,
        manager.units(),
        manager.config().overlap_epsilon,
    );
    Some(Vec3::new(x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bounds, Item};
    use crate::types::EPSILON_GENERAL;

    fn manager_with(units: Vec<Unit>) -> LayoutManager {
        LayoutManager::with_units(units, Bounds::default(), PlacementConfig::default())
    }

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
    fn tick_previews_without_touching_state() {
        let manager = manager_with(vec![
            unit(1, (0.0, 1.0, 0.0), (1.0, 2.0, 1.0)),
            unit(2, (4.0, 0.5, 4.0), (1.0, 1.0, 1.0)),
        ]);
        let mut session = PlacementSession::default();
        let mut handle = LiveTransform::default();
        // Begin needs only shared access.
        session.begin(&manager, UnitId(2), &mut handle).unwrap();

        handle.position = Vec3::new(0.2, 0.0, -0.1);
        let y = session.tick(&manager, &mut handle).unwrap();

        assert!((y - 2.5).abs() < EPSILON_GENERAL);
        assert_eq!(handle.position, Vec3::new(0.2, y, -0.1));
        assert_eq!(manager.unit(UnitId(2)).unwrap().position, Vec3::new(4.0, 0.5, 4.0));
        assert_eq!(manager.undo_depth(), 0);
    }

    #[test]
    fn tick_when_idle_does_nothing() {
        let manager = manager_with(vec![unit(1, (0.0, 0.5, 0.0), (1.0, 1.0, 1.0))]);
        let session = PlacementSession::default();
        let mut handle = LiveTransform::new(Vec3::new(3.0, 9.0, 3.0));
        assert!(session.tick(&manager, &mut handle).is_none());
        assert_eq!(handle.position, Vec3::new(3.0, 9.0, 3.0));
    }

    #[test]
    fn commit_snaps_stacks_and_records_history() {
        let mut manager = manager_with(vec![
            unit(1, (0.5, 1.0, 0.5), (1.0, 2.0, 1.0)),
            unit(2, (5.5, 0.5, 5.5), (1.0, 1.0, 1.0)),
        ]);
        let mut session = PlacementSession::new(true);
        let mut handle = LiveTransform::default();
        let mut confirmed = Vec::new();

        session.begin(&manager, UnitId(2), &mut handle).unwrap();
        handle.position = Vec3::new(0.62, 0.0, 0.41);
        session.tick(&manager, &mut handle);
        let committed = session
            .commit(&mut manager, &mut handle, &mut |u: &Unit| confirmed.push(u.id))
            .unwrap();

        assert_eq!(committed.position, Vec3::new(0.5, 2.5, 0.5));
        assert_eq!(handle.position, committed.position);
        assert_eq!(manager.unit(UnitId(2)).unwrap().position, committed.position);
        assert_eq!(confirmed, vec![UnitId(2)]);
        assert_eq!(manager.undo_depth(), 1);
        assert!(!session.is_dragging());
    }

    #[test]
    fn commit_without_snap_only_clamps() {
        let mut manager = manager_with(vec![unit(1, (0.0, 0.5, 0.0), (2.0, 1.0, 2.0))]);
        let mut session = PlacementSession::new(false);
        let mut handle = LiveTransform::default();

        session.begin(&manager, UnitId(1), &mut handle).unwrap();
        handle.position = Vec3::new(50.0, 3.0, 0.37);
        let committed = session
            .commit(&mut manager, &mut handle, &mut |_: &Unit| {})
            .unwrap();

        assert_eq!(committed.position, Vec3::new(9.0, 0.5, 0.37));
    }

    #[test]
    fn snapping_can_change_supporting_neighbours() {
        // Raw release overlaps the tall unit only by a sliver; the snapped
        // position moves fully off it.
        let mut manager = manager_with(vec![
            unit(1, (-0.5, 1.5, 0.5), (1.0, 3.0, 1.0)),
            unit(2, (5.5, 0.5, 5.5), (1.0, 1.0, 1.0)),
        ]);
        let mut session = PlacementSession::new(true);
        let mut handle = LiveTransform::default();

        session.begin(&manager, UnitId(2), &mut handle).unwrap();
        handle.position = Vec3::new(0.3, 0.0, 0.5);
        let preview = session.tick(&manager, &mut handle).unwrap();
        assert!((preview - 3.5).abs() < EPSILON_GENERAL);

        let committed = session
            .commit(&mut manager, &mut handle, &mut |_: &Unit| {})
            .unwrap();
        assert_eq!(committed.position, Vec3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn commit_for_vanished_unit_is_a_no_op() {
        let mut manager = manager_with(vec![
            unit(1, (0.0, 0.5, 0.0), (1.0, 1.0, 1.0)),
            unit(2, (3.0, 0.5, 3.0), (1.0, 1.0, 1.0)),
        ]);
        let mut session = PlacementSession::default();
        let mut handle = LiveTransform::default();
        let mut confirmed = 0;

        session.begin(&manager, UnitId(2), &mut handle).unwrap();
        manager.remove_unit(UnitId(2)).unwrap();
        let depth = manager.undo_depth();

        let result = session.commit(&mut manager, &mut handle, &mut |_: &Unit| confirmed += 1);
        assert!(result.is_none());
        assert_eq!(confirmed, 0);
        assert_eq!(manager.undo_depth(), depth);
        assert!(!session.is_dragging());
    }

    #[test]
    fn live_transform_starts_at_origin() {
        assert_eq!(LiveTransform::default().position, Vec3::zero());
    }

    #[test]
    fn commit_after_layout_replaced_mid_drag_is_dropped() {
        let mut manager = manager_with(vec![unit(1, (0.5, 0.5, 0.5), (1.0, 1.0, 1.0))]);
        let mut session = PlacementSession::new(true);
        let mut handle = LiveTransform::default();
        let mut confirmed = 0;

        session.begin(&manager, UnitId(1), &mut handle).unwrap();
        handle.position = Vec3::new(6.2, 0.0, 6.2);
        session.tick(&manager, &mut handle);

        manager.replace_all(
            vec![unit(1, (-4.5, 0.5, -4.5), (1.0, 1.0, 1.0))],
            Bounds::default(),
        );
        let depth = manager.undo_depth();

        let result = session.commit(&mut manager, &mut handle, &mut |_: &Unit| confirmed += 1);
        assert!(result.is_none());
        assert_eq!(confirmed, 0);
        assert_eq!(manager.unit(UnitId(1)).unwrap().position, Vec3::new(-4.5, 0.5, -4.5));
        assert_eq!(handle.position, Vec3::new(-4.5, 0.5, -4.5));
        assert_eq!(manager.undo_depth(), depth);
        assert!(!session.is_dragging());
    }

    #[test]
    fn commit_when_idle_is_a_no_op() {
        let mut manager = manager_with(vec![unit(1, (0.0, 0.5, 0.0), (1.0, 1.0, 1.0))]);
        let mut session = PlacementSession::default();
        let mut handle = LiveTransform::default();
        assert!(
            session
                .commit(&mut manager, &mut handle, &mut |_: &Unit| {})
                .is_none()
        );
        assert_eq!(manager.undo_depth(), 0);
    }

    #[test]
    fn only_one_drag_at_a_time() {
        let manager = manager_with(vec![
            unit(1, (0.0, 0.5, 0.0), (1.0, 1.0, 1.0)),
            unit(2, (3.0, 0.5, 3.0), (1.0, 1.0, 1.0)),
        ]);
        let mut session = PlacementSession::default();
        let mut handle = LiveTransform::default();

        session.begin(&manager, UnitId(1), &mut handle).unwrap();
        assert_eq!(
            session.begin(&manager, UnitId(2), &mut handle),
            Err(PlacementError::AlreadyDragging(UnitId(1)))
        );
        assert_eq!(session.dragging_unit(), Some(UnitId(1)));
    }

    #[test]
    fn begin_rejects_unknown_unit() {
        let manager = manager_with(vec![]);
        let mut session = PlacementSession::default();
        let mut handle = LiveTransform::default();
        assert_eq!(
            session.begin(&manager, UnitId(7), &mut handle),
            Err(PlacementError::UnknownUnit(UnitId(7)))
        );
        assert_eq!(session.state(), DragState::Idle);
    }

    #[test]
    fn abandon_commits_at_last_position() {
        let mut manager = manager_with(vec![unit(1, (0.5, 0.5, 0.5), (1.0, 1.0, 1.0))]);
        let mut session = PlacementSession::new(true);
        let mut handle = LiveTransform::default();

        session.begin(&manager, UnitId(1), &mut handle).unwrap();
        handle.position = Vec3::new(3.4, 0.0, -2.4);
        let committed = session
            .abandon(&mut manager, &mut handle, &mut |_: &Unit| {})
            .unwrap();
        assert_eq!(committed.position, Vec3::new(3.5, 0.5, -2.5));
    }
}
