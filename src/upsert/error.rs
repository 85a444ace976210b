//! Errors raised by nested upserts.

use crate::value::{Shape, Value};
use thiserror::Error;

/// UpsertError describes why a nested upsert was refused.
///
/// No operation mutates the root when it returns an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpsertError {
    #[error("root map is not initialized")]
    UninitializedRoot,

    #[error("root is a {actual}, not a map")]
    RootNotMap { actual: Shape },

    #[error("entry {key} holds a {actual}, expected a {expected}")]
    ShapeMismatch {
        key: Value,
        expected: Shape,
        actual: Shape,
    },
}

impl UpsertError {
    /// Creates a shape mismatch error.
    pub fn shape_mismatch(key: &Value, expected: Shape, actual: Shape) -> Self {
        UpsertError::ShapeMismatch {
            key: key.clone(),
            expected,
            actual,
        }
    }
}
