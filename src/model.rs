//! Data models for the warehouse layout.
//!
//! This module defines the fundamental data structures of the editor:
//! - `Unit`: a box-shaped storage unit with position, size and item metadata
//! - `Item`: free-form metadata attached to a unit, opaque to placement
//! - `Bounds`: the floor plan units must stay inside
//! - `Layout`: a named snapshot of units plus bounds
//!
//! Serialization follows the layout document format, so these types are
//! written to and read from JSON directly.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::geometry::footprint_of;
use crate::types::{Footprint, MIN_UNIT_EXTENT, Vec3, validation};

/// Validation error for unit and bounds data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid position: {0}")]
    InvalidPosition(String),
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),
}

/// Stable identifier of a unit. Assigned once, never reused.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct UnitId(pub u64);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Metadata attached to a unit.
///
/// Every field has a default so older documents that only carry
/// `sku`, `quantity` and `category` still load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Item {
    pub sku: String,
    pub quantity: i64,
    pub category: String,
    pub weight: f64,
    pub notes: String,
    pub shipped: bool,
    /// Display color as `#rrggbb`.
    #[schema(example = "#ffffff")]
    pub color: String,
}

impl Item {
    pub const DEFAULT_COLOR: &'static str = "#ffffff";
    pub const DEFAULT_CATEGORY: &'static str = "Uncategorized";

    /// Item metadata for a freshly added unit.
    pub fn numbered(n: usize) -> Self {
        Self {
            sku: format!("Item{}", n),
            ..Self::default()
        }
    }

    /// Case-insensitive match of an already lower-cased query against SKU and category.
    pub fn matches_lowercase(&self, query: &str) -> bool {
        self.sku.to_lowercase().contains(query) || self.category.to_lowercase().contains(query)
    }
}

impl Default for Item {
    fn default() -> Self {
        Self {
            sku: String::new(),
            quantity: 0,
            category: Self::DEFAULT_CATEGORY.to_string(),
            weight: 0.0,
            notes: String::new(),
            shipped: false,
            color: Self::DEFAULT_COLOR.to_string(),
        }
    }
}

/// Partial update for [`Item`]; absent fields keep their current value.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, ToSchema)]
pub struct ItemPatch {
    pub sku: Option<String>,
    pub quantity: Option<i64>,
    pub category: Option<String>,
    pub weight: Option<f64>,
    pub notes: Option<String>,
    pub shipped: Option<bool>,
    pub color: Option<String>,
}

impl ItemPatch {
    /// Applies the patch to a copy of `item`.
    pub fn apply_to(&self, item: &Item) -> Item {
        Item {
            sku: self.sku.clone().unwrap_or_else(|| item.sku.clone()),
            quantity: self.quantity.unwrap_or(item.quantity),
            category: self.category.clone().unwrap_or_else(|| item.category.clone()),
            weight: self.weight.unwrap_or(item.weight),
            notes: self.notes.clone().unwrap_or_else(|| item.notes.clone()),
            shipped: self.shipped.unwrap_or(item.shipped),
            color: self.color.clone().unwrap_or_else(|| item.color.clone()),
        }
    }
}

fn default_size() -> Vec3 {
    Vec3::one()
}

/// A storage unit placed in the warehouse.
///
/// # Fields
/// * `id` - Stable identifier
/// * `position` - Center of the box; `y` is the height of the center above the floor
/// * `size` - Full extents (width, height, depth)
/// * `item` - Attached metadata
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "position": [0.0, 0.5, 0.0],
    "size": [1.0, 1.0, 1.0],
    "item": { "sku": "Item1", "quantity": 10, "category": "Electronics" }
}))]
pub struct Unit {
    pub id: UnitId,
    #[schema(value_type = [f64; 3])]
    pub position: Vec3,
    #[serde(default = "default_size")]
    #[schema(value_type = [f64; 3])]
    pub size: Vec3,
    #[serde(default)]
    pub item: Item,
}

impl Unit {
    /// Creates a new unit after validating position and size.
    ///
    /// # Returns
    /// `Ok(Unit)` for valid values, otherwise `Err(ValidationError)`
    ///
    /// # Examples
    /// ```
    /// use warehouse_layout::model::{Item, Unit, UnitId};
    /// use warehouse_layout::types::Vec3;
    ///
    /// let ok = Unit::new(UnitId(1), Vec3::new(0.0, 0.5, 0.0), Vec3::one(), Item::default());
    /// assert!(ok.is_ok());
    ///
    /// let flat = Unit::new(UnitId(2), Vec3::zero(), Vec3::new(1.0, 0.0, 1.0), Item::default());
    /// assert!(flat.is_err());
    /// ```
    pub fn new(id: UnitId, position: Vec3, size: Vec3, item: Item) -> Result<Self, ValidationError> {
        validate_size(size)?;
        validate_position(position)?;
        Ok(Self {
            id,
            position,
            size,
            item,
        })
    }

    /// Footprint at the current position.
    #[inline]
    pub fn footprint(&self) -> Footprint {
        self.footprint_at(self.position.x, self.position.z)
    }

    /// Footprint the unit would have if centered at `(x, z)`.
    #[inline]
    pub fn footprint_at(&self, x: f64, z: f64) -> Footprint {
        footprint_of((x, z), (self.size.x, self.size.z))
    }

    /// Height of the top face above the floor.
    #[inline]
    pub fn top(&self) -> f64 {
        self.position.y + self.size.y / 2.0
    }

    /// Height of the bottom face above the floor.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.position.y - self.size.y / 2.0
    }
}

/// Validates that all extents are positive and finite.
pub fn validate_size(size: Vec3) -> Result<(), ValidationError> {
    validation::validate_extent(size.x, "Width").map_err(ValidationError::InvalidDimension)?;
    validation::validate_extent(size.y, "Height").map_err(ValidationError::InvalidDimension)?;
    validation::validate_extent(size.z, "Depth").map_err(ValidationError::InvalidDimension)?;
    Ok(())
}

/// Validates that all coordinates are finite.
pub fn validate_position(position: Vec3) -> Result<(), ValidationError> {
    validation::validate_coordinate(position.x, "x").map_err(ValidationError::InvalidPosition)?;
    validation::validate_coordinate(position.y, "y").map_err(ValidationError::InvalidPosition)?;
    validation::validate_coordinate(position.z, "z").map_err(ValidationError::InvalidPosition)?;
    Ok(())
}

/// Checks a requested size and raises small extents to the minimum.
///
/// Non-finite values are rejected; zero or negative values are treated as
/// "too small" and clamped, mirroring the editor's numeric inputs.
pub fn normalize_size(size: Vec3, min_extent: f64) -> Result<Vec3, ValidationError> {
    if !size.is_finite() {
        return Err(ValidationError::InvalidDimension(format!(
            "size must be finite, got: [{}, {}, {}]",
            size.x, size.y, size.z
        )));
    }
    Ok(size.clamp_min(min_extent.max(MIN_UNIT_EXTENT)))
}

/// The floor plan of the warehouse, centered at the origin.
///
/// `height` is advisory; nothing enforces a ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Bounds {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Bounds {
    pub const DEFAULT_WIDTH: f64 = 20.0;
    pub const DEFAULT_DEPTH: f64 = 20.0;
    pub const DEFAULT_HEIGHT: f64 = 5.0;

    /// Creates bounds with validation.
    pub fn new(width: f64, depth: f64, height: f64) -> Result<Self, ValidationError> {
        let bounds = Self {
            width,
            depth,
            height,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Checks that every extent is positive and finite.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_extent(self.width, "Bounds width")
            .map_err(ValidationError::InvalidBounds)?;
        validation::validate_extent(self.depth, "Bounds depth")
            .map_err(ValidationError::InvalidBounds)?;
        validation::validate_extent(self.height, "Bounds height")
            .map_err(ValidationError::InvalidBounds)?;
        Ok(())
    }

    /// Placement region on the floor.
    #[inline]
    pub fn floor(&self) -> Footprint {
        footprint_of((0.0, 0.0), (self.width, self.depth))
    }

    /// Floor area of the warehouse.
    #[inline]
    pub fn floor_area(&self) -> f64 {
        self.width * self.depth
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            depth: Self::DEFAULT_DEPTH,
            height: Self::DEFAULT_HEIGHT,
        }
    }
}

/// A named, persisted configuration of units and bounds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Layout {
    pub name: String,
    pub cubes: Vec<Unit>,
    #[serde(default)]
    pub bounds: Bounds,
}

impl Layout {
    /// Creates a layout from its parts.
    pub fn new(name: impl Into<String>, cubes: Vec<Unit>, bounds: Bounds) -> Self {
        Self {
            name: name.into(),
            cubes,
            bounds,
        }
    }

    /// Default name for the layout at a zero-based position.
    pub fn default_name(index: usize) -> String {
        format!("Layout {}", index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_GENERAL;

    fn unit_at(position: Vec3, size: Vec3) -> Unit {
        Unit::new(UnitId(1), position, size, Item::default()).unwrap()
    }

    #[test]
    fn unit_faces_follow_center_and_height() {
        let unit = unit_at(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 2.0, 1.0));
        assert!((unit.top() - 2.0).abs() < EPSILON_GENERAL);
        assert!(unit.bottom().abs() < EPSILON_GENERAL);
    }

    #[test]
    fn unit_rejects_degenerate_size() {
        let err = Unit::new(
            UnitId(1),
            Vec3::zero(),
            Vec3::new(-1.0, 1.0, 1.0),
            Item::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDimension(_)));
    }

    #[test]
    fn unit_rejects_non_finite_position() {
        let err = Unit::new(
            UnitId(1),
            Vec3::new(f64::NAN, 0.0, 0.0),
            Vec3::one(),
            Item::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPosition(_)));
    }

    #[test]
    fn normalize_size_clamps_small_extents() {
        let size = normalize_size(Vec3::new(0.0, 3.0, 0.01), 0.1).unwrap();
        assert_eq!(size, Vec3::new(0.1, 3.0, 0.1));
        assert!(normalize_size(Vec3::new(f64::INFINITY, 1.0, 1.0), 0.1).is_err());
    }

    #[test]
    fn bounds_validation() {
        assert!(Bounds::new(20.0, 20.0, 5.0).is_ok());
        assert!(matches!(
            Bounds::new(0.0, 20.0, 5.0),
            Err(ValidationError::InvalidBounds(_))
        ));
        let floor = Bounds::new(4.0, 6.0, 5.0).unwrap().floor();
        assert_eq!(floor, Footprint::new(-2.0, 2.0, -3.0, 3.0));
    }

    #[test]
    fn item_patch_only_touches_given_fields() {
        let item = Item {
            sku: "A-1".to_string(),
            quantity: 4,
            ..Item::default()
        };
        let patch = ItemPatch {
            quantity: Some(9),
            shipped: Some(true),
            ..ItemPatch::default()
        };
        let patched = patch.apply_to(&item);
        assert_eq!(patched.sku, "A-1");
        assert_eq!(patched.quantity, 9);
        assert!(patched.shipped);
        assert_eq!(patched.color, Item::DEFAULT_COLOR);
    }

    #[test]
    fn item_defaults_fill_missing_fields() {
        let item: Item =
            serde_json::from_str(r#"{"sku": "Item1", "quantity": 10, "category": "Electronics"}"#)
                .unwrap();
        assert_eq!(item.sku, "Item1");
        assert_eq!(item.notes, "");
        assert!(!item.shipped);
        assert_eq!(item.color, "#ffffff");
    }

    #[test]
    fn item_query_matches_sku_or_category() {
        let item = Item {
            sku: "PAL-204".to_string(),
            category: "Electronics".to_string(),
            ..Item::default()
        };
        assert!(item.matches_lowercase("pal"));
        assert!(item.matches_lowercase("tronic"));
        assert!(!item.matches_lowercase("food"));
    }
}
