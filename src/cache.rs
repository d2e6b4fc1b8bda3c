//! Content cache: parsed documents memoized by logical path
//!
//! The cache guarantees at most one successful parse per path until the
//! entry is cleared. Documents are stored type-erased so one cache serves
//! manifests, path batches, statistics and shared documents alike.
//!
//! There is no expiration: study documents are immutable while a study is
//! open, so eviction happens only through [`ContentCache::clear`].

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use simtrace_types::layout::{ModelLayout, SharedVisualConfig};
use simtrace_types::manifest::ReplicationManifest;
use simtrace_types::path::EntityPathBatch;
use simtrace_types::statistics::StatisticsSeries;
use simtrace_types::stats::CacheStats;
use simtrace_types::{SUPPORTED_FORMAT_VERSION, Versioned};

use crate::error::{Result, SimtraceError};
use crate::storage::StorageReader;

/// A JSON document kind the cache knows how to decode.
pub trait Document: DeserializeOwned + Versioned + Send + Sync + 'static {
    /// Human readable name used in errors and logs
    const KIND: &'static str;

    /// Restore invariants the producer may not have honoured.
    fn normalize(&mut self) {}
}

impl Document for ReplicationManifest {
    const KIND: &'static str = "replication manifest";
}

impl Document for EntityPathBatch {
    const KIND: &'static str = "entity path batch";

    fn normalize(&mut self) {
        self.sort_points();
    }
}

impl Document for StatisticsSeries {
    const KIND: &'static str = "statistics series";

    fn normalize(&mut self) {
        self.sort_points();
    }
}

impl Document for ModelLayout {
    const KIND: &'static str = "model layout";
}

impl Document for SharedVisualConfig {
    const KIND: &'static str = "shared visual config";
}

/// Decode and version-check one document.
pub fn decode<T: Document>(path: &str, text: &str) -> Result<T> {
    let mut document: T =
        serde_json::from_str(text).map_err(|source| SimtraceError::Decode {
            path: path.to_string(),
            source,
        })?;

    let found = document.format_version();
    if found > SUPPORTED_FORMAT_VERSION {
        return Err(SimtraceError::UnsupportedFormatVersion {
            path: path.to_string(),
            found,
            supported: SUPPORTED_FORMAT_VERSION,
        });
    }

    document.normalize();
    Ok(document)
}

type CachedDocument = Arc<dyn Any + Send + Sync>;

/// Memoizes parsed documents by logical path.
#[derive(Default)]
pub struct ContentCache {
    entries: RwLock<FxHashMap<String, CachedDocument>>,
    hits: AtomicU64,
    misses: AtomicU64,
    parse_failures: AtomicU64,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn cache_key(path: &str) -> &str {
        path.trim_start_matches('/')
    }

    /// `None` when nothing is cached at `path`, `Some(Err)` when the cached
    /// document has a different type.
    fn lookup<T: Document>(&self, path: &str) -> Option<Result<Arc<T>>> {
        let cached = self.entries.read().get(Self::cache_key(path)).cloned()?;
        Some(cached.downcast::<T>().map_err(|_| SimtraceError::DocumentKind {
            path: path.to_string(),
            expected: T::KIND,
        }))
    }

    /// Previously parsed document at `path`, if it has type `T`.
    pub fn get<T: Document>(&self, path: &str) -> Option<Arc<T>> {
        self.lookup::<T>(path).and_then(|result| result.ok())
    }

    /// Store a parsed document.
    ///
    /// If another document was stored for the same path in the meantime,
    /// the earlier one is kept and returned so every caller observes the
    /// same value.
    pub fn put<T: Document>(&self, path: &str, document: T) -> Arc<T> {
        let document = Arc::new(document);
        let stored = self
            .entries
            .write()
            .entry(Self::cache_key(path).to_string())
            .or_insert_with(|| document.clone() as CachedDocument)
            .clone();

        stored.downcast::<T>().unwrap_or(document)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.read().contains_key(Self::cache_key(path))
    }

    /// Evict one path, or everything when `path` is `None`.
    ///
    /// Returns the number of evicted entries.
    pub fn clear(&self, path: Option<&str>) -> usize {
        let mut entries = self.entries.write();
        match path {
            Some(path) => usize::from(entries.remove(Self::cache_key(path)).is_some()),
            None => {
                let removed = entries.len();
                entries.clear();
                removed
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
        }
    }

    /// Return the cached document at `path`, reading and parsing it on a miss.
    ///
    /// Failed reads and failed parses are not cached, so the next call
    /// retries the storage reader.
    pub async fn load<T, R>(&self, reader: &R, path: &str) -> Result<Arc<T>>
    where
        T: Document,
        R: StorageReader,
    {
        if let Some(cached) = self.lookup::<T>(path) {
            if cached.is_ok() {
                self.hits.fetch_add(1, Ordering::Relaxed);
            }
            return cached;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let text = reader
            .read_text(path)
            .await
            .ok_or_else(|| SimtraceError::NotFound {
                path: path.to_string(),
            })?;

        match decode::<T>(path, &text) {
            Ok(document) => {
                log::debug!("Cached {} '{}'", T::KIND, path);
                Ok(self.put(path, document))
            }
            Err(e) => {
                self.parse_failures.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }
}
