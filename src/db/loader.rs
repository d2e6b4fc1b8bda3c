//! Shared document loading plumbing for the catalog and the indexes.

use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::cache::{ContentCache, Document};
use crate::error::Result;
use crate::storage::StorageReader;

/// Outcome of a bulk load, counted per document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Documents read and merged
    pub loaded: usize,
    /// Documents skipped because they were already merged
    pub skipped: usize,
    /// Documents that could not be read or decoded
    pub failed: usize,
}

impl LoadReport {
    pub fn total(&self) -> usize {
        self.loaded + self.skipped + self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Borrowed storage reader and cache, plus the in-flight read limit.
pub struct LoadContext<'a, R> {
    pub reader: &'a R,
    pub cache: &'a ContentCache,
    pub max_concurrent_loads: usize,
}

impl<R> Clone for LoadContext<'_, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for LoadContext<'_, R> {}

impl<'a, R: StorageReader> LoadContext<'a, R> {
    pub fn new(reader: &'a R, cache: &'a ContentCache, max_concurrent_loads: usize) -> Self {
        Self {
            reader,
            cache,
            max_concurrent_loads: max_concurrent_loads.max(1),
        }
    }

    /// Load one document through the cache.
    pub async fn load<T: Document>(&self, path: &str) -> Result<Arc<T>> {
        self.cache.load::<T, R>(self.reader, path).await
    }

    /// Load many documents with overlapping reads.
    ///
    /// Results come back in input order. A failed document never stops the
    /// others.
    pub async fn load_all<T: Document>(&self, paths: Vec<String>) -> Vec<(String, Result<Arc<T>>)> {
        stream::iter(paths.into_iter().map(|path| async move {
            let result = self.load::<T>(&path).await;
            (path, result)
        }))
        .buffered(self.max_concurrent_loads)
        .collect()
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryReader;
    use simtrace_types::layout::ModelLayout;

    #[tokio::test]
    async fn test_load_all_keeps_order_and_isolates_failures() {
        let reader = MemoryReader::with_files([
            ("a.json", r#"{ "name": "a" }"#),
            ("bad.json", "["),
            ("c.json", r#"{ "name": "c" }"#),
        ]);
        let cache = ContentCache::new();
        let ctx = LoadContext::new(&reader, &cache, 2);

        let results = ctx
            .load_all::<ModelLayout>(vec![
                "a.json".into(),
                "bad.json".into(),
                "missing.json".into(),
                "c.json".into(),
            ])
            .await;

        let paths: Vec<_> = results.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["a.json", "bad.json", "missing.json", "c.json"]);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert!(results[2].1.is_err());
        assert_eq!(results[3].1.as_ref().unwrap().get("name").unwrap(), "c");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_report_totals() {
        let report = LoadReport {
            loaded: 2,
            skipped: 1,
            failed: 1,
        };
        assert_eq!(report.total(), 4);
        assert!(!report.is_complete());
    }
}
