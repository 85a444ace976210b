//! Upsert module - Get-or-create nested containers, then mutate them.
//!
//! This module provides the list and map upserts along with the policy
//! that governs entries holding the wrong shape.

mod error;
mod policy;
mod upserter;


pub use error::*;
pub use policy::*;
pub use upserter::*;
