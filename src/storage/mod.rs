//! Storage reader abstraction for simtrace
//!
//! This module provides a trait-based abstraction over where study documents
//! live, so the same catalog and indexes work against a local directory, a
//! static web server, or an in-memory fixture.
//!
//! Readers never surface I/O errors: an unreadable file or unlistable
//! directory is logged and reported as a miss (`None`).

use serde::{Deserialize, Serialize};
use std::future::Future;

mod local;
mod memory;
#[cfg(feature = "remote")]
mod remote;

pub use local::LocalReader;
pub use memory::MemoryReader;
#[cfg(feature = "remote")]
pub use remote::{DEFAULT_LISTING_FILE, HttpReader};

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    pub name: String,
    /// Logical path of the entry, relative to the reader root
    pub path: String,
    #[serde(default)]
    pub is_directory: bool,
}

/// Trait for storage reader implementations
///
/// All paths are logical, `/`-separated and relative to the reader root.
pub trait StorageReader: Send + Sync {
    /// Read a whole document as text, `None` on any failure
    fn read_text(&self, path: &str) -> impl Future<Output = Option<String>> + Send;

    /// List the direct children of a directory, `None` on any failure
    fn list_directory(&self, path: &str) -> impl Future<Output = Option<Vec<DirEntry>>> + Send;

    /// Physical location of a logical path (filesystem path or URL)
    fn resolve_full_path(&self, path: &str) -> String;
}

/// Join a logical directory and a child name with a single `/`.
pub fn join_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}
