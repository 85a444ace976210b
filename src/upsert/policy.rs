//! Policies for entries that hold the wrong shape.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// ShapePolicy decides what happens when the addressed entry exists but
/// does not hold the container shape an operation needs.
///
/// A `Null` entry counts as absent under every policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ShapePolicy {
    /// Replace the entry with an empty container. The old value is lost.
    #[default]
    Overwrite,
    /// Refuse the operation.
    Fail,
    /// Carry a scalar over as the first element of a new list; refuse
    /// anything that cannot be carried over.
    Merge,
}

impl ShapePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapePolicy::Overwrite => "overwrite",
            ShapePolicy::Fail => "fail",
            ShapePolicy::Merge => "merge",
        }
    }
}

impl fmt::Display for ShapePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
