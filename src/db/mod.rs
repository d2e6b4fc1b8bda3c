//! Study facade over the catalog, the indexes and the content cache.
//!
//! This module defines the main `Study` type. It owns one instance of every
//! component, wires them to a single storage reader, and forwards each query
//! to the component that answers it.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use simtrace_types::layout::{ModelLayout, SharedVisualConfig};
use simtrace_types::manifest::{ReplicationManifest, ReplicationMetadata};
use simtrace_types::path::EntityPath;
use simtrace_types::statistics::{
    StatisticKey, StatisticsSeries, StatisticsSummary, TimeSeriesPoint,
};
use simtrace_types::stats::{CacheStats, IndexStats, StudyStats};

use crate::builder::StudyBuilder;
use crate::cache::ContentCache;
use crate::config::Config;
use crate::error::{Result, SimtraceError};
#[cfg(feature = "remote")]
use crate::storage::HttpReader;
use crate::storage::{LocalReader, StorageReader};

mod catalog;
mod entity_paths;
mod loader;
mod statistics;

#[cfg(feature = "sync")]
mod sync;

pub use catalog::{DiscoveryReport, ReplicationCatalog};
pub use entity_paths::{EntityPathIndex, EntityState};
pub use loader::{LoadContext, LoadReport};
pub use statistics::StatisticsIndex;

#[cfg(feature = "sync")]
pub use sync::SyncStudy;

/// What one activation loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationReport {
    pub replication_id: u32,
    pub entity_batches: LoadReport,
    pub statistics: LoadReport,
}

/// One simulation study: its replications and the data of the active one.
///
/// # Thread Safety
///
/// Discovery and activation take `&mut self`, so the borrow checker
/// serialises activation transitions. Queries take `&self`. For shared use
/// across tasks enable the `sync` feature and use `SyncStudy`.
///
/// # Examples
///
/// ```rust,no_run
/// use simtrace::Study;
///
/// # async fn run() -> simtrace::Result<()> {
/// let mut study = Study::open("output/study")?;
/// study.discover_replications().await;
///
/// let report = study.set_active_replication(1).await?;
/// println!("{} entity batches loaded", report.entity_batches.loaded);
///
/// for id in study.get_entity_ids_at_time(42.0) {
///     if let Some(state) = study.get_entity_state_at_time(&id, 42.0) {
///         println!("{} is {} at ({}, {})", id, state.state, state.x, state.y);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct Study<R> {
    reader: R,
    config: Config,
    cache: ContentCache,
    catalog: ReplicationCatalog,
    entity_paths: EntityPathIndex,
    statistics: StatisticsIndex,
}

impl Study<LocalReader> {
    /// Open a study stored in a local directory.
    pub fn open<P: Into<PathBuf>>(root: P) -> Result<Self> {
        Self::open_with_config(root, Config::default())
    }

    pub fn open_with_config<P: Into<PathBuf>>(root: P, config: Config) -> Result<Self> {
        Study::with_reader_and_config(LocalReader::new(root), config)
    }
}

#[cfg(feature = "remote")]
impl Study<HttpReader> {
    /// Open a study served over HTTP under `base_url`.
    pub fn remote(base_url: impl Into<String>) -> Result<Self> {
        Study::with_reader_and_config(HttpReader::new(base_url), Config::default())
    }
}

impl<R: StorageReader> Study<R> {
    pub fn with_reader(reader: R) -> Result<Self> {
        Self::with_reader_and_config(reader, Config::default())
    }

    pub fn with_reader_and_config(reader: R, config: Config) -> Result<Self> {
        config.validate().map_err(SimtraceError::InvalidConfig)?;
        Ok(Self {
            reader,
            config,
            cache: ContentCache::new(),
            catalog: ReplicationCatalog::new(),
            entity_paths: EntityPathIndex::new(),
            statistics: StatisticsIndex::new(),
        })
    }

    pub fn builder() -> StudyBuilder<R> {
        StudyBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    // ===== Catalog =====

    /// Scan storage for replications and load the shared documents.
    pub async fn discover_replications(&mut self) -> DiscoveryReport {
        let ctx = LoadContext::new(&self.reader, &self.cache, self.config.max_concurrent_loads);
        self.catalog.discover_replications(ctx, &self.config).await
    }

    /// Activate a replication and load its data.
    ///
    /// The catalog is switched first; on an unknown id nothing changes and
    /// `ReplicationNotFound` is returned. Entity paths and statistics of the
    /// previous replication are dropped before the new ones load. With lazy
    /// entity loading on, no batch is read here.
    pub async fn set_active_replication(&mut self, id: u32) -> Result<ActivationReport> {
        if !self.catalog.set_active_replication(id) {
            return Err(SimtraceError::ReplicationNotFound(id));
        }
        let manifest = self.catalog.require_active_manifest()?;
        Ok(self.load_replication(id, &manifest).await)
    }

    /// Drop and reload everything for the active replication.
    pub async fn reload_active_replication(&mut self) -> Result<ActivationReport> {
        let id = self
            .catalog
            .active_replication_id()
            .ok_or(SimtraceError::NoActiveReplication)?;
        let manifest = self.catalog.require_active_manifest()?;
        Ok(self.load_replication(id, &manifest).await)
    }

    async fn load_replication(&mut self, id: u32, manifest: &ReplicationManifest) -> ActivationReport {
        let ctx = LoadContext::new(&self.reader, &self.cache, self.config.max_concurrent_loads);

        let entity_batches = if self.config.lazy_entity_loading {
            self.entity_paths.clear();
            LoadReport::default()
        } else {
            self.entity_paths.load_for_replication(manifest, ctx).await
        };
        let statistics = self.statistics.load_for_replication(manifest, ctx).await;

        log::info!(
            "Activated replication {}: {} entity batches, {} statistics series, {} failures",
            id,
            entity_batches.loaded,
            statistics.loaded,
            entity_batches.failed + statistics.failed
        );

        ActivationReport {
            replication_id: id,
            entity_batches,
            statistics,
        }
    }

    /// Load the active replication's batches whose entities enter by `end`.
    pub async fn load_entity_paths_for_time_range(
        &mut self,
        start: f64,
        end: f64,
    ) -> Result<LoadReport> {
        let manifest = self.catalog.require_active_manifest()?;
        let ctx = LoadContext::new(&self.reader, &self.cache, self.config.max_concurrent_loads);
        Ok(self
            .entity_paths
            .load_for_time_range(&manifest, start, end, ctx)
            .await)
    }

    pub fn replication_ids(&self) -> Vec<u32> {
        self.catalog.replication_ids()
    }

    pub fn replication_manifest(&self, id: u32) -> Option<Arc<ReplicationManifest>> {
        self.catalog.manifest(id)
    }

    pub fn active_replication_id(&self) -> Option<u32> {
        self.catalog.active_replication_id()
    }

    pub fn get_active_replication_metadata(&self) -> Option<ReplicationMetadata> {
        self.catalog.get_active_replication_metadata()
    }

    pub fn model_layout(&self) -> Option<Arc<ModelLayout>> {
        self.catalog.model_layout()
    }

    pub fn visual_config(&self) -> Option<Arc<SharedVisualConfig>> {
        self.catalog.visual_config()
    }

    // ===== Entity paths =====

    pub fn get_entity_ids_at_time(&self, t: f64) -> BTreeSet<String> {
        self.entity_paths.get_entity_ids_at_time(t)
    }

    pub fn get_entities_in_time_range(
        &self,
        start: f64,
        end: f64,
    ) -> BTreeMap<String, Arc<EntityPath>> {
        self.entity_paths.get_entities_in_time_range(start, end)
    }

    pub fn get_entity_state_at_time(&self, id: &str, t: f64) -> Option<EntityState> {
        self.entity_paths.get_entity_state_at_time(id, t)
    }

    pub fn get_entities_by_type(&self, entity_type: &str) -> Vec<Arc<EntityPath>> {
        self.entity_paths.get_entities_by_type(entity_type)
    }

    pub fn get_entity_path(&self, id: &str) -> Option<Arc<EntityPath>> {
        self.entity_paths.get_entity_path(id)
    }

    pub fn get_loaded_entity_ids(&self) -> BTreeSet<String> {
        self.entity_paths.get_loaded_entity_ids()
    }

    pub fn get_entity_types(&self) -> BTreeSet<String> {
        self.entity_paths.get_entity_types()
    }

    pub fn get_time_bounds(&self) -> Option<(f64, f64)> {
        self.entity_paths.get_time_bounds()
    }

    // ===== Statistics =====

    pub fn get_statistic_value_at_time(
        &self,
        key: &StatisticKey,
        t: f64,
        interpolate: bool,
    ) -> Option<f64> {
        self.statistics.get_value_at_time(key, t, interpolate)
    }

    pub fn get_time_series_for_range(
        &self,
        key: &StatisticKey,
        start: f64,
        end: f64,
    ) -> Vec<TimeSeriesPoint> {
        self.statistics.get_time_series_for_range(key, start, end)
    }

    pub fn get_statistics_summary(&self, key: &StatisticKey) -> Option<StatisticsSummary> {
        self.statistics.get_summary(key)
    }

    pub fn get_statistics_series(&self, key: &StatisticKey) -> Option<Arc<StatisticsSeries>> {
        self.statistics.get_series(key)
    }

    pub fn get_available_statistics(&self) -> Vec<StatisticKey> {
        self.statistics.get_available_keys()
    }

    pub fn get_statistics_by_type(&self, stat_type: &str) -> Vec<Arc<StatisticsSeries>> {
        self.statistics.get_statistics_by_type(stat_type)
    }

    pub fn get_statistics_by_component(&self, component_id: &str) -> Vec<Arc<StatisticsSeries>> {
        self.statistics.get_statistics_by_component(component_id)
    }

    // ===== Cache and stats =====

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Evict one cached document, or all of them. Loaded indexes are kept.
    pub fn clear_cache(&self, path: Option<&str>) -> usize {
        let evicted = self.cache.clear(path);
        log::debug!("Evicted {} cached documents", evicted);
        evicted
    }

    pub fn entity_index_stats(&self) -> IndexStats {
        self.entity_paths.stats()
    }

    pub fn stats(&self) -> StudyStats {
        StudyStats {
            replications: self.catalog.len(),
            active_replication: self.catalog.active_replication_id(),
            entity_index: self.entity_paths.stats(),
            statistics_series: self.statistics.series_count(),
            cache: self.cache.stats(),
        }
    }

    /// Physical location of a logical path, for diagnostics.
    pub fn resolve_full_path(&self, path: &str) -> String {
        self.reader.resolve_full_path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryReader;

    fn study() -> Study<MemoryReader> {
        let reader = MemoryReader::with_files([
            (
                "replications/replication_1/replication_1_manifest.json",
                r#"{ "metadata": { "replicationNumber": 1, "duration": 100.0 },
                     "entityPathFiles": [ { "path": "replications/replication_1/paths.json",
                                            "entryTimeStart": 0.0, "entryTimeEnd": 0.0 } ],
                     "statisticsFiles": [ { "type": "activity_metric", "componentId": "act1",
                                            "metricName": "queueLength",
                                            "path": "replications/replication_1/queue.json" } ] }"#,
            ),
            (
                "replications/replication_1/paths.json",
                r#"{ "entities": { "E1": { "type": "customer", "path": [
                        { "clock": 0.0, "x": 0.0, "y": 0.0, "state": "idle" },
                        { "clock": 10.0, "x": 10.0, "y": 0.0, "state": "moving" } ] } } }"#,
            ),
            (
                "replications/replication_1/queue.json",
                r#"{ "metadata": { "type": "activity_metric", "componentId": "act1", "metricName": "queueLength" },
                     "timeSeries": [ { "time": 0.0, "value": 2.0 }, { "time": 10.0, "value": 8.0 } ] }"#,
            ),
        ]);
        Study::with_reader(reader).unwrap()
    }

    #[tokio::test]
    async fn test_activation_loads_both_indexes() {
        let mut study = study();
        study.discover_replications().await;

        let report = study.set_active_replication(1).await.unwrap();
        assert_eq!(report.entity_batches.loaded, 1);
        assert_eq!(report.statistics.loaded, 1);

        let state = study.get_entity_state_at_time("E1", 5.0).unwrap();
        assert_eq!((state.state.as_str(), state.x, state.y), ("idle", 5.0, 0.0));

        let key = StatisticKey::new("activity_metric", "act1", "queueLength");
        assert_eq!(study.get_statistic_value_at_time(&key, 5.0, true), Some(5.0));

        let stats = study.stats();
        assert_eq!(stats.active_replication, Some(1));
        assert_eq!(stats.statistics_series, 1);
        assert_eq!(stats.cache.entries, 3);
    }

    #[tokio::test]
    async fn test_unknown_replication_changes_nothing() {
        let mut study = study();
        study.discover_replications().await;
        study.set_active_replication(1).await.unwrap();

        let err = study.set_active_replication(9).await.unwrap_err();
        assert!(matches!(err, SimtraceError::ReplicationNotFound(9)));
        assert_eq!(study.active_replication_id(), Some(1));
        assert!(study.get_loaded_entity_ids().contains("E1"));
    }

    #[tokio::test]
    async fn test_range_load_requires_active_replication() {
        let mut study = study();
        study.discover_replications().await;

        let err = study
            .load_entity_paths_for_time_range(0.0, 10.0)
            .await
            .unwrap_err();
        assert!(matches!(err, SimtraceError::NoActiveReplication));
        assert!(matches!(
            study.reload_active_replication().await,
            Err(SimtraceError::NoActiveReplication)
        ));
    }

    #[tokio::test]
    async fn test_clear_cache_keeps_indexes() {
        let mut study = study();
        study.discover_replications().await;
        study.set_active_replication(1).await.unwrap();

        assert_eq!(study.clear_cache(None), 3);
        assert_eq!(study.cache_size(), 0);
        assert_eq!(study.get_loaded_entity_ids().len(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = Config::default().with_manifest_file_template("manifest.json");
        let result = Study::with_reader_and_config(MemoryReader::new(), config);
        assert!(matches!(result, Err(SimtraceError::InvalidConfig(_))));
    }
}
