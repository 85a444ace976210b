//! # Data Extensions
//!
//! Get-or-create helpers for containers nested inside dynamic value maps.
//!
//! The library covers the dictionary-of-lists and dictionary-of-maps
//! patterns: look up a key, make sure it holds a list or a map, then append
//! to the list or set an entry in the map.
//!
//! ## Modules
//!
//! - [`value`] - Dynamically shaped values, maps keyed by values, and shape tags
//! - [`upsert`] - Nested list and map upserts with configurable shape mismatch handling

pub mod upsert;
pub mod value;

pub use upsert::{NestedUpsert, ShapePolicy, UpsertError, UpsertRoot, Upserter, UpserterBuilder};
pub use value::{Map, Shape, Value};
