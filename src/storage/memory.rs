use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use super::{DirEntry, StorageReader, join_path};

/// In-memory storage reader keyed by logical path.
///
/// Directories are implied by the `/`-separated file paths. Every successful
/// or failed `read_text` is counted, which makes this reader useful for
/// asserting how often documents are actually fetched.
#[derive(Default)]
pub struct MemoryReader {
    files: RwLock<BTreeMap<String, String>>,
    reads: AtomicU64,
    reads_by_path: RwLock<FxHashMap<String, u64>>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a reader from `(path, text)` pairs.
    pub fn with_files<I, P, T>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<String>,
        T: Into<String>,
    {
        let reader = Self::new();
        for (path, text) in files {
            reader.insert(path, text);
        }
        reader
    }

    /// Insert or replace a document.
    pub fn insert(&self, path: impl Into<String>, text: impl Into<String>) {
        let path = path.into();
        let path = path.trim_matches('/').to_string();
        self.files.write().insert(path, text.into());
    }

    pub fn remove(&self, path: &str) -> Option<String> {
        self.files.write().remove(path.trim_matches('/'))
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    /// Total number of `read_text` calls served.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of `read_text` calls for one path.
    pub fn read_count_for(&self, path: &str) -> u64 {
        self.reads_by_path
            .read()
            .get(path.trim_matches('/'))
            .copied()
            .unwrap_or(0)
    }

    fn read_now(&self, path: &str) -> Option<String> {
        let path = path.trim_matches('/');
        self.reads.fetch_add(1, Ordering::Relaxed);
        *self
            .reads_by_path
            .write()
            .entry(path.to_string())
            .or_insert(0) += 1;

        let text = self.files.read().get(path).cloned();
        if text.is_none() {
            log::debug!("No in-memory document at '{}'", path);
        }
        text
    }

    fn list_now(&self, path: &str) -> Option<Vec<DirEntry>> {
        let dir = path.trim_matches('/');
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{}/", dir)
        };

        let files = self.files.read();
        let mut directories = BTreeSet::new();
        let mut entries = Vec::new();
        let mut found = false;

        for file in files.keys().filter(|k| k.starts_with(&prefix)) {
            found = true;
            let rest = &file[prefix.len()..];
            match rest.split_once('/') {
                Some((child, _)) => {
                    directories.insert(child.to_string());
                }
                None => entries.push(DirEntry {
                    name: rest.to_string(),
                    path: join_path(dir, rest),
                    is_directory: false,
                }),
            }
        }

        if !found {
            log::debug!("No in-memory directory at '{}'", dir);
            return None;
        }

        entries.extend(directories.into_iter().map(|name| DirEntry {
            path: join_path(dir, &name),
            name,
            is_directory: true,
        }));
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Some(entries)
    }
}

impl StorageReader for MemoryReader {
    async fn read_text(&self, path: &str) -> Option<String> {
        self.read_now(path)
    }

    async fn list_directory(&self, path: &str) -> Option<Vec<DirEntry>> {
        self.list_now(path)
    }

    fn resolve_full_path(&self, path: &str) -> String {
        format!("memory://{}", path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> MemoryReader {
        MemoryReader::with_files([
            ("replications/replication_1/replication_1_manifest.json", "{}"),
            ("replications/replication_2/replication_2_manifest.json", "{}"),
            ("replications/notes.txt", "hello"),
            ("layout.json", "{}"),
        ])
    }

    #[tokio::test]
    async fn test_read_counts_every_call() {
        let reader = fixture();

        assert_eq!(reader.read_text("replications/notes.txt").await.as_deref(), Some("hello"));
        assert_eq!(reader.read_text("/replications/notes.txt").await.as_deref(), Some("hello"));
        assert!(reader.read_text("missing.json").await.is_none());

        assert_eq!(reader.read_count(), 3);
        assert_eq!(reader.read_count_for("replications/notes.txt"), 2);
        assert_eq!(reader.read_count_for("missing.json"), 1);
    }

    #[tokio::test]
    async fn test_listing_implies_directories() {
        let reader = fixture();
        let entries = reader.list_directory("replications").await.unwrap();

        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["notes.txt", "replication_1", "replication_2"]);
        assert!(!entries[0].is_directory);
        assert!(entries[1].is_directory);
        assert_eq!(entries[1].path, "replications/replication_1");
    }

    #[tokio::test]
    async fn test_listing_root_and_missing() {
        let reader = fixture();

        let root = reader.list_directory("").await.unwrap();
        assert_eq!(root.len(), 2);
        assert!(reader.list_directory("nowhere").await.is_none());
    }
}
