use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{DirEntry, StorageReader, join_path};

/// Reads study documents from a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalReader {
    root: PathBuf,
}

impl LocalReader {
    /// Create a reader resolving logical paths against `root`.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> PathBuf {
        // A leading slash would make `join` discard the root.
        self.root.join(path.trim_start_matches('/'))
    }
}

impl StorageReader for LocalReader {
    async fn read_text(&self, path: &str) -> Option<String> {
        let full = self.full_path(path);
        match tokio::fs::read_to_string(&full).await {
            Ok(text) => Some(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("File not found: {}", full.display());
                None
            }
            Err(e) => {
                log::debug!("Failed to read {}: {}", full.display(), e);
                None
            }
        }
    }

    async fn list_directory(&self, path: &str) -> Option<Vec<DirEntry>> {
        let full = self.full_path(path);
        let mut dir = match tokio::fs::read_dir(&full).await {
            Ok(dir) => dir,
            Err(e) => {
                log::debug!("Failed to list directory {}: {}", full.display(), e);
                return None;
            }
        };

        let mut entries = Vec::new();
        loop {
            match dir.next_entry().await {
                Ok(Some(entry)) => {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    let is_directory = match entry.file_type().await {
                        Ok(file_type) => file_type.is_dir(),
                        Err(e) => {
                            log::debug!("Failed to stat {}: {}", entry.path().display(), e);
                            false
                        }
                    };
                    entries.push(DirEntry {
                        path: join_path(path, &name),
                        name,
                        is_directory,
                    });
                }
                Ok(None) => break,
                Err(e) => {
                    // Keep what was listed so far.
                    log::debug!("Directory listing of {} interrupted: {}", full.display(), e);
                    break;
                }
            }
        }

        Some(entries)
    }

    fn resolve_full_path(&self, path: &str) -> String {
        self.full_path(path).to_string_lossy().into_owned()
    }
}
