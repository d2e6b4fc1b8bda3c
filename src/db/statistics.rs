//! Statistics index: one time series per metric of the active replication

use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

use simtrace_types::manifest::{ReplicationManifest, StatisticsFileDescriptor};
use simtrace_types::statistics::{
    StatisticKey, StatisticsSeries, StatisticsSummary, TimeSeriesPoint,
};

use super::loader::{LoadContext, LoadReport};
use crate::compute::interpolate::{Bracket, bracket, fraction, lerp};
use crate::compute::validation::{normalize_window, validate_series};
use crate::error::Result;
use crate::storage::StorageReader;

/// Metric series keyed by `type::componentId::metricName`.
#[derive(Debug, Default)]
pub struct StatisticsIndex {
    series: FxHashMap<StatisticKey, Arc<StatisticsSeries>>,
    loaded_files: FxHashSet<String>,
}

impl StatisticsIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoded series under the key its descriptor declares.
    fn register(
        &mut self,
        descriptor: &StatisticsFileDescriptor,
        series: Arc<StatisticsSeries>,
    ) -> Result<StatisticKey> {
        validate_series(&series)?;

        let key = descriptor.key();
        if series.key() != key {
            log::warn!(
                "Series '{}' declares key '{}', registering it as '{}'",
                descriptor.path,
                series.key(),
                key
            );
        }

        self.series.insert(key.clone(), series);
        self.loaded_files.insert(descriptor.path.clone());
        Ok(key)
    }

    /// Load one series. A file that was already loaded is not read again.
    pub async fn load_series<R: StorageReader>(
        &mut self,
        descriptor: &StatisticsFileDescriptor,
        ctx: LoadContext<'_, R>,
    ) -> Result<StatisticKey> {
        if self.loaded_files.contains(&descriptor.path) {
            return Ok(descriptor.key());
        }

        let series = ctx.load::<StatisticsSeries>(&descriptor.path).await?;
        self.register(descriptor, series)
    }

    /// Replace everything with the series listed by `manifest`.
    pub async fn load_for_replication<R: StorageReader>(
        &mut self,
        manifest: &ReplicationManifest,
        ctx: LoadContext<'_, R>,
    ) -> LoadReport {
        self.clear();

        let paths = manifest
            .statistics_files
            .iter()
            .map(|d| d.path.clone())
            .collect();
        let results = ctx.load_all::<StatisticsSeries>(paths).await;

        let mut report = LoadReport::default();
        for (descriptor, (_, result)) in manifest.statistics_files.iter().zip(results) {
            match result.and_then(|series| self.register(descriptor, series)) {
                Ok(_) => report.loaded += 1,
                Err(e) => {
                    log::warn!("Failed to load statistics '{}': {}", descriptor.key(), e);
                    report.failed += 1;
                }
            }
        }

        log::info!(
            "Loaded {} statistics series for replication {} ({} failed)",
            self.series.len(),
            manifest.metadata.replication_number,
            report.failed
        );
        report
    }

    /// Value of a metric at `t`.
    ///
    /// Times at or before the first sample yield the first value and times
    /// at or after the last sample yield the last value. Between samples the
    /// value is interpolated linearly, or, with `interpolate` off, taken from
    /// the nearer sample; a tie goes to the earlier sample.
    pub fn get_value_at_time(&self, key: &StatisticKey, t: f64, interpolate: bool) -> Option<f64> {
        let points = &self.series.get(key)?.time_series;
        let first = points.first()?;
        let last = points.last()?;

        if t.is_nan() {
            return None;
        }
        if t <= first.time {
            return Some(first.value);
        }
        if t >= last.time {
            return Some(last.value);
        }

        match bracket(points, t, |p| p.time)? {
            Bracket::Exact(point) | Bracket::Before(point) | Bracket::After(point) => {
                Some(point.value)
            }
            Bracket::Between(before, after) => {
                if interpolate {
                    Some(lerp(
                        before.value,
                        after.value,
                        fraction(before.time, after.time, t),
                    ))
                } else if t - before.time <= after.time - t {
                    Some(before.value)
                } else {
                    Some(after.value)
                }
            }
        }
    }

    /// Samples with `start <= time <= end`, in series order.
    pub fn get_time_series_for_range(
        &self,
        key: &StatisticKey,
        start: f64,
        end: f64,
    ) -> Vec<TimeSeriesPoint> {
        let Some(series) = self.series.get(key) else {
            return Vec::new();
        };
        let (start, end) = match normalize_window(start, end) {
            Ok(window) => window,
            Err(e) => {
                log::warn!("Rejecting series range query on '{}': {}", key, e);
                return Vec::new();
            }
        };

        let points = &series.time_series;
        let lo = points.partition_point(|p| p.time < start);
        let hi = points.partition_point(|p| p.time <= end);
        if lo >= hi {
            return Vec::new();
        }
        points[lo..hi].to_vec()
    }

    /// Summary shipped with the series; never recomputed here.
    pub fn get_summary(&self, key: &StatisticKey) -> Option<StatisticsSummary> {
        self.series.get(key).map(|series| series.summary.clone())
    }

    pub fn get_series(&self, key: &StatisticKey) -> Option<Arc<StatisticsSeries>> {
        self.series.get(key).cloned()
    }

    /// Every loaded key, sorted.
    pub fn get_available_keys(&self) -> Vec<StatisticKey> {
        let mut keys: Vec<_> = self.series.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn get_statistics_by_type(&self, stat_type: &str) -> Vec<Arc<StatisticsSeries>> {
        self.filtered(|series| series.metadata.stat_type == stat_type)
    }

    pub fn get_statistics_by_component(&self, component_id: &str) -> Vec<Arc<StatisticsSeries>> {
        self.filtered(|series| series.metadata.component_id == component_id)
    }

    fn filtered<F>(&self, predicate: F) -> Vec<Arc<StatisticsSeries>>
    where
        F: Fn(&StatisticsSeries) -> bool,
    {
        let mut matches: Vec<_> = self
            .series
            .iter()
            .filter(|(_, series)| predicate(series))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(b.0));
        matches.into_iter().map(|(_, series)| series.clone()).collect()
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    pub fn clear(&mut self) {
        self.series.clear();
        self.loaded_files.clear();
    }
}
