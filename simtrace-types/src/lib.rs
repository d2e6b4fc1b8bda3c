//! # simtrace-types
//!
//! Data contracts for discrete-event simulation output.
//!
//! This crate provides the serde models for every JSON document a study is
//! made of:
//!
//! - **Manifests**: `ReplicationManifest` with its entity path and statistics file descriptors
//! - **Entity paths**: `EntityPathBatch`, `EntityPath`, `PathPoint`
//! - **Statistics**: `StatisticsSeries`, `TimeSeriesPoint`, `StatisticsSummary`, `StatisticKey`
//! - **Shared documents**: `ModelLayout`, `SharedVisualConfig`
//!
//! Every document carries an optional `formatVersion` tag (defaulting to
//! [`SUPPORTED_FORMAT_VERSION`]). Unknown fields are ignored and missing
//! optional fields fall back to their defaults.
//!
//! ## Examples
//!
//! ```rust
//! use simtrace_types::path::EntityPathBatch;
//!
//! let json = r#"{
//!     "entities": {
//!         "E1": { "type": "customer", "path": [
//!             { "clock": 10.0, "x": 10.0, "y": 0.0, "state": "moving" },
//!             { "clock": 0.0, "x": 0.0, "y": 0.0, "state": "idle" }
//!         ]}
//!     }
//! }"#;
//!
//! let mut batch: EntityPathBatch = serde_json::from_str(json).unwrap();
//! batch.sort_points();
//! assert_eq!(batch.entities[0].id, "E1");
//! assert_eq!(batch.entities[0].lifetime(), Some((0.0, 10.0)));
//! ```

pub mod layout;
pub mod manifest;
pub mod path;
pub mod statistics;
pub mod stats;

/// Highest document `formatVersion` this crate understands.
pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// Serde default for documents that omit `formatVersion`.
pub const fn default_format_version() -> u32 {
    SUPPORTED_FORMAT_VERSION
}

/// Documents tagged with a schema version.
pub trait Versioned {
    fn format_version(&self) -> u32;
}
