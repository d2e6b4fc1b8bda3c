//! Compute layer for temporal query processing.
//!
//! This module separates the indexing and lookup algorithms from loading
//! concerns. It provides:
//! - The bucketed timeline index over entity lifetimes
//! - Bracketing and linear interpolation over time-ordered samples
//! - Validation of query windows and loaded paths
//!
//! Nothing here performs I/O; the indexes in [`crate::db`] feed it.

pub mod interpolate;
pub mod timeline;
pub mod validation;
