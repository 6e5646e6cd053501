//! Spatial placement and stacking engine for warehouse layout editing.
//!
//! Units are axis-aligned boxes on a bounded floor (Y up, floor on X–Z,
//! positions are box centers). Dragged units snap to the integer grid, stay
//! on the floor and rest on top of whatever they overlap.

pub mod api;
pub mod config;
pub mod editor;
pub mod geometry;
pub mod history;
pub mod map;
pub mod model;
pub mod persistence;
pub mod placement;
pub mod snap;
pub mod stacking;
pub mod store;
pub mod types;
