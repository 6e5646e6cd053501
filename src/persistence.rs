//! Layout documents: JSON export and validated import.
//!
//! The current document shape is
//! `{ "cubes": [ { id, position, size, item } ], "bounds": { width, depth, height } }`.
//! Older exports are a bare array of cubes; those are accepted with default bounds.
//! Import either yields a complete, valid layout or an error; nothing in
//! between reaches the editor.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::model::{Bounds, Unit, ValidationError, normalize_size, validate_position};
use crate::types::MIN_UNIT_EXTENT;

/// Reasons an import payload is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("payload is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),
    #[error("payload does not describe a layout: {0}")]
    WrongShape(#[source] serde_json::Error),
    #[error("layout contains no units")]
    Empty,
    #[error("unit {index}: {source}")]
    InvalidUnit {
        index: usize,
        #[source]
        source: ValidationError,
    },
    #[error("duplicate unit id {0}")]
    DuplicateId(u64),
    #[error(transparent)]
    InvalidBounds(ValidationError),
}

/// The exported layout document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "cubes": [
        {
            "id": 0,
            "position": [0.0, 0.5, 0.0],
            "size": [1.0, 1.0, 1.0],
            "item": {
                "sku": "Item1", "quantity": 10, "category": "Electronics",
                "weight": 0.0, "notes": "", "shipped": false, "color": "#ffffff"
            }
        }
    ],
    "bounds": { "width": 20.0, "depth": 20.0, "height": 5.0 }
}))]
pub struct LayoutDocument {
    pub cubes: Vec<Unit>,
    #[serde(default)]
    pub bounds: Bounds,
}

impl LayoutDocument {
    pub fn new(cubes: Vec<Unit>, bounds: Bounds) -> Self {
        Self { cubes, bounds }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IncomingDocument {
    Current(LayoutDocument),
    Legacy(Vec<Unit>),
}

impl From<IncomingDocument> for LayoutDocument {
    fn from(incoming: IncomingDocument) -> Self {
        match incoming {
            IncomingDocument::Current(document) => document,
            IncomingDocument::Legacy(cubes) => LayoutDocument::new(cubes, Bounds::default()),
        }
    }
}

/// Serializes units and bounds as a pretty-printed layout document.
pub fn export_layout(units: &[Unit], bounds: &Bounds) -> Result<String, serde_json::Error> {
    let document = LayoutDocument::new(units.to_vec(), *bounds);
    let json = serde_json::to_string_pretty(&document)?;
    info!(units = units.len(), "layout exported");
    Ok(json)
}

/// Parses and validates a layout document in either format.
///
/// # Returns
/// The validated document, or the first problem found.
pub fn import_layout(payload: &str) -> Result<LayoutDocument, ImportError> {
    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(ImportError::MalformedJson)?;
    let incoming: IncomingDocument =
        serde_json::from_value(value).map_err(ImportError::WrongShape)?;
    let document = validate_document(incoming.into())?;
    info!(units = document.cubes.len(), "layout imported");
    Ok(document)
}

/// Checks a parsed document and normalizes unit sizes.
///
/// Sizes below the minimum extent are raised to it; non-finite values,
/// duplicate ids, invalid bounds and empty layouts are rejected.
pub fn validate_document(document: LayoutDocument) -> Result<LayoutDocument, ImportError> {
    if document.cubes.is_empty() {
        return Err(ImportError::Empty);
    }
    let cubes = validate_units(document.cubes, &document.bounds)?;
    Ok(LayoutDocument::new(cubes, document.bounds))
}

/// Checks bounds and every unit, raising degenerate extents to the minimum.
///
/// An empty collection is accepted; callers that need at least one unit
/// check that themselves.
pub fn validate_units(units: Vec<Unit>, bounds: &Bounds) -> Result<Vec<Unit>, ImportError> {
    bounds.validate().map_err(ImportError::InvalidBounds)?;

    let mut seen = HashSet::new();
    let mut cubes = Vec::with_capacity(units.len());
    for (index, mut unit) in units.into_iter().enumerate() {
        if !seen.insert(unit.id) {
            return Err(ImportError::DuplicateId(unit.id.0));
        }
        validate_position(unit.position)
            .map_err(|source| ImportError::InvalidUnit { index, source })?;
        let size = normalize_size(unit.size, MIN_UNIT_EXTENT)
            .map_err(|source| ImportError::InvalidUnit { index, source })?;
        if size != unit.size {
            warn!(unit = %unit.id, "degenerate size raised to minimum extent");
            unit.size = size;
        }
        cubes.push(unit);
    }
    Ok(cubes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, UnitId};
    use crate::types::Vec3;

    #[test]
    fn imports_current_format() {
        let payload = r##"{
            "cubes": [
                {"id": 7, "position": [1, 0.5, -1], "size": [1, 1, 1],
                 "item": {"sku": "A", "quantity": 3, "category": "Tools",
                          "weight": 2.5, "notes": "n", "shipped": true, "color": "#ff0000"}}
            ],
            "bounds": {"width": 12, "depth": 8, "height": 4}
        }"##;
        let document = import_layout(payload).unwrap();
        assert_eq!(document.cubes.len(), 1);
        assert_eq!(document.cubes[0].id, UnitId(7));
        assert_eq!(document.cubes[0].position, Vec3::new(1.0, 0.5, -1.0));
        assert!(document.cubes[0].item.shipped);
        assert_eq!(document.bounds, Bounds::new(12.0, 8.0, 4.0).unwrap());
    }

    #[test]
    fn imports_legacy_array_with_default_bounds() {
        let payload = r#"[
            {"id": 1, "position": [0, 0.5, 0], "size": [1, 1, 1],
             "item": {"sku": "Item1", "quantity": 10, "category": "Electronics"}}
        ]"#;
        let document = import_layout(payload).unwrap();
        assert_eq!(document.bounds, Bounds::default());
        assert_eq!(document.cubes[0].item.color, Item::DEFAULT_COLOR);
    }

    #[test]
    fn missing_size_defaults_to_unit_cube() {
        let document = import_layout(r#"[{"id": 1, "position": [0, 0.5, 0]}]"#).unwrap();
        assert_eq!(document.cubes[0].size, Vec3::one());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            import_layout("{ not json"),
            Err(ImportError::MalformedJson(_))
        ));
    }

    #[test]
    fn rejects_wrong_shape() {
        assert!(matches!(
            import_layout(r#"{"layouts": 3}"#),
            Err(ImportError::WrongShape(_))
        ));
        assert!(matches!(
            import_layout(r#"[{"id": "x", "position": [0, 0]}]"#),
            Err(ImportError::WrongShape(_))
        ));
    }

    #[test]
    fn rejects_empty_layouts() {
        assert!(matches!(import_layout("[]"), Err(ImportError::Empty)));
        assert!(matches!(
            import_layout(r#"{"cubes": []}"#),
            Err(ImportError::Empty)
        ));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let payload = r#"[{"id": 1, "position": [0, 0.5, 0]}, {"id": 1, "position": [2, 0.5, 0]}]"#;
        assert!(matches!(
            import_layout(payload),
            Err(ImportError::DuplicateId(1))
        ));
    }

    #[test]
    fn rejects_invalid_bounds() {
        let payload = r#"{"cubes": [{"id": 1, "position": [0, 0.5, 0]}],
                          "bounds": {"width": 0, "depth": 5, "height": 5}}"#;
        assert!(matches!(
            import_layout(payload),
            Err(ImportError::InvalidBounds(_))
        ));
    }

    #[test]
    fn raises_degenerate_sizes() {
        let payload = r#"[{"id": 1, "position": [0, 0.5, 0], "size": [0, 1, -2]}]"#;
        let document = import_layout(payload).unwrap();
        assert_eq!(document.cubes[0].size, Vec3::new(0.1, 1.0, 0.1));
    }

    #[test]
    fn export_then_import_is_lossless() {
        let units = vec![Unit {
            id: UnitId(5),
            position: Vec3::new(-1.5, 2.5, 3.0),
            size: Vec3::new(1.0, 3.0, 2.0),
            item: Item {
                sku: "SKU-5".to_string(),
                quantity: 12,
                category: "Food".to_string(),
                weight: 40.5,
                notes: "keep cool".to_string(),
                shipped: false,
                color: "#00ccff".to_string(),
            },
        }];
        let bounds = Bounds::new(14.0, 9.0, 6.0).unwrap();

        let json = export_layout(&units, &bounds).unwrap();
        let document = import_layout(&json).unwrap();
        assert_eq!(document.cubes, units);
        assert_eq!(document.bounds, bounds);
    }
}
