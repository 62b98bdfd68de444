//! Shared primitives: errors, geometry re-exports and small integer math helpers.

pub mod core;
pub mod error;
pub(crate) mod math;
