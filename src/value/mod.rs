//! Value module - Dynamically shaped values and the maps that hold them.
//!
//! This module provides the tagged [`Value`] union, its [`Map`] and the
//! [`Shape`] tag used for shape-checked lookups.

mod shape;
mod value;

pub use shape::*;
pub use value::*;
