//! Shape tags for values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape is the active variant of a [`Value`](super::Value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Null,
    Bool,
    Int,
    Float,
    String,
    List,
    Map,
}

impl Shape {
    /// Returns true for bool, int, float and string.
    pub fn is_scalar(self) -> bool {
        matches!(self, Shape::Bool | Shape::Int | Shape::Float | Shape::String)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Null => "null",
            Shape::Bool => "bool",
            Shape::Int => "int",
            Shape::Float => "float",
            Shape::String => "string",
            Shape::List => "list",
            Shape::Map => "map",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
