//! Shared handle for using one study from many tasks.
//!
//! `SyncStudy` wraps `Study` in `Arc<RwLock<Study>>`. Discovery, activation
//! and range loads take the write lock, so activation transitions never
//! overlap; queries share the read lock.
//!
//! # Features
//!
//! Enable the `sync` feature to use this module:
//!
//! ```toml
//! [dependencies]
//! simtrace = { version = "0.1", features = ["sync"] }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

use super::{ActivationReport, DiscoveryReport, EntityState, LoadReport, Study};
use crate::config::Config;
use crate::error::Result;
use crate::storage::{LocalReader, StorageReader};
use simtrace_types::manifest::ReplicationMetadata;
use simtrace_types::path::EntityPath;
use simtrace_types::statistics::{StatisticKey, StatisticsSummary, TimeSeriesPoint};
use simtrace_types::stats::StudyStats;

/// Cloneable, task-safe handle to a `Study`.
pub struct SyncStudy<R> {
    inner: Arc<RwLock<Study<R>>>,
}

impl<R> Clone for SyncStudy<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SyncStudy<LocalReader> {
    pub fn open<P: Into<PathBuf>>(root: P) -> Result<Self> {
        Ok(Self::new(Study::open(root)?))
    }

    pub fn open_with_config<P: Into<PathBuf>>(root: P, config: Config) -> Result<Self> {
        Ok(Self::new(Study::open_with_config(root, config)?))
    }
}

impl<R: StorageReader> SyncStudy<R> {
    pub fn new(study: Study<R>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(study)),
        }
    }

    /// Shared access for queries not forwarded here.
    pub async fn read(&self) -> RwLockReadGuard<'_, Study<R>> {
        self.inner.read().await
    }

    // ===== Transitions (write lock) =====

    pub async fn discover_replications(&self) -> DiscoveryReport {
        self.inner.write().await.discover_replications().await
    }

    pub async fn set_active_replication(&self, id: u32) -> Result<ActivationReport> {
        self.inner.write().await.set_active_replication(id).await
    }

    pub async fn reload_active_replication(&self) -> Result<ActivationReport> {
        self.inner.write().await.reload_active_replication().await
    }

    pub async fn load_entity_paths_for_time_range(&self, start: f64, end: f64) -> Result<LoadReport> {
        self.inner
            .write()
            .await
            .load_entity_paths_for_time_range(start, end)
            .await
    }

    // ===== Queries (read lock) =====

    pub async fn replication_ids(&self) -> Vec<u32> {
        self.inner.read().await.replication_ids()
    }

    pub async fn get_active_replication_metadata(&self) -> Option<ReplicationMetadata> {
        self.inner.read().await.get_active_replication_metadata()
    }

    pub async fn get_entity_ids_at_time(&self, t: f64) -> BTreeSet<String> {
        self.inner.read().await.get_entity_ids_at_time(t)
    }

    pub async fn get_entities_in_time_range(
        &self,
        start: f64,
        end: f64,
    ) -> BTreeMap<String, Arc<EntityPath>> {
        self.inner.read().await.get_entities_in_time_range(start, end)
    }

    pub async fn get_entity_state_at_time(&self, id: &str, t: f64) -> Option<EntityState> {
        self.inner.read().await.get_entity_state_at_time(id, t)
    }

    pub async fn get_loaded_entity_ids(&self) -> BTreeSet<String> {
        self.inner.read().await.get_loaded_entity_ids()
    }

    pub async fn get_statistic_value_at_time(
        &self,
        key: &StatisticKey,
        t: f64,
        interpolate: bool,
    ) -> Option<f64> {
        self.inner
            .read()
            .await
            .get_statistic_value_at_time(key, t, interpolate)
    }

    pub async fn get_time_series_for_range(
        &self,
        key: &StatisticKey,
        start: f64,
        end: f64,
    ) -> Vec<TimeSeriesPoint> {
        self.inner
            .read()
            .await
            .get_time_series_for_range(key, start, end)
    }

    pub async fn get_statistics_summary(&self, key: &StatisticKey) -> Option<StatisticsSummary> {
        self.inner.read().await.get_statistics_summary(key)
    }

    pub async fn clear_cache(&self, path: Option<&str>) -> usize {
        self.inner.read().await.clear_cache(path)
    }

    pub async fn stats(&self) -> StudyStats {
        self.inner.read().await.stats()
    }
}
