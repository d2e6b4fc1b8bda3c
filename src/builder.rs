//! Study builder for flexible configuration
//!
//! This module provides a builder pattern for assembling a study from a
//! storage reader and a configuration.

use std::path::PathBuf;

use crate::config::Config;
use crate::db::Study;
use crate::error::{Result, SimtraceError};
use crate::storage::{LocalReader, StorageReader};

/// Builder for a [`Study`] with a custom reader and settings.
#[derive(Debug)]
pub struct StudyBuilder<R> {
    reader: Option<R>,
    config: Config,
}

impl<R> StudyBuilder<R> {
    /// Create a new builder with the default configuration and no reader.
    pub fn new() -> Self {
        Self {
            reader: None,
            config: Config::default(),
        }
    }

    /// Set the storage reader documents are read through.
    pub fn reader(mut self, reader: R) -> Self {
        self.reader = Some(reader);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn replications_dir(mut self, dir: impl Into<String>) -> Self {
        self.config = self.config.with_replications_dir(dir);
        self
    }

    pub fn max_concurrent_loads(mut self, limit: usize) -> Self {
        self.config = self.config.with_max_concurrent_loads(limit);
        self
    }

    /// Defer entity batches to time-range loads.
    pub fn lazy_entity_loading(mut self, lazy: bool) -> Self {
        self.config = self.config.with_lazy_entity_loading(lazy);
        self
    }
}

impl StudyBuilder<LocalReader> {
    /// Read documents from a local directory.
    pub fn root<P: Into<PathBuf>>(self, root: P) -> Self {
        self.reader(LocalReader::new(root))
    }
}

impl<R: StorageReader> StudyBuilder<R> {
    /// Build the study. Fails when no reader was set or the configuration
    /// is invalid.
    pub fn build(self) -> Result<Study<R>> {
        let reader = self
            .reader
            .ok_or_else(|| SimtraceError::InvalidConfig("No storage reader configured".into()))?;
        Study::with_reader_and_config(reader, self.config)
    }
}

impl<R> Default for StudyBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryReader;

    #[test]
    fn test_builder_default() {
        let builder = StudyBuilder::<MemoryReader>::new();
        assert!(builder.reader.is_none());
        assert_eq!(builder.config, Config::default());
    }

    #[test]
    fn test_builder_requires_reader() {
        let result = StudyBuilder::<MemoryReader>::new().build();
        assert!(matches!(result, Err(SimtraceError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_with_settings() {
        let study = StudyBuilder::new()
            .reader(MemoryReader::new())
            .replications_dir("runs")
            .max_concurrent_loads(2)
            .lazy_entity_loading(true)
            .build()
            .unwrap();

        assert_eq!(study.config().replications_dir, "runs");
        assert_eq!(study.config().max_concurrent_loads, 2);
        assert!(study.config().lazy_entity_loading);
    }

    #[test]
    fn test_builder_rejects_zero_load_limit() {
        let result = StudyBuilder::new()
            .reader(MemoryReader::new())
            .max_concurrent_loads(0)
            .build();
        assert!(matches!(result, Err(SimtraceError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder_local_root() {
        let dir = tempfile::tempdir().unwrap();
        let study = Study::<LocalReader>::builder()
            .root(dir.path())
            .build()
            .unwrap();
        assert_eq!(study.reader().root(), dir.path());
    }
}
