use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Versioned, default_format_version};

/// Composite identifier of a metric series: `type::componentId::metricName`.
///
/// # Examples
///
/// ```
/// use simtrace_types::statistics::StatisticKey;
///
/// let key = StatisticKey::new("activity_metric", "act1", "queueLength");
/// assert_eq!(key.to_string(), "activity_metric::act1::queueLength");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatisticKey(String);

impl StatisticKey {
    pub const SEPARATOR: &'static str = "::";

    pub fn new(stat_type: &str, component_id: &str, metric_name: &str) -> Self {
        Self(format!(
            "{}{sep}{}{sep}{}",
            stat_type,
            component_id,
            metric_name,
            sep = Self::SEPARATOR
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatisticKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<StatisticKey> for String {
    fn from(key: StatisticKey) -> Self {
        key.0
    }
}

/// One sample of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub time: f64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// Aggregates computed by the simulation when the series was written.
///
/// These values are authoritative input and are never recomputed from the
/// raw points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatisticsSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsMetadata {
    #[serde(rename = "type")]
    pub stat_type: String,
    #[serde(default)]
    pub component_id: String,
    pub metric_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<String>,
}

/// A metric time series with its precomputed summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSeries {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    pub metadata: StatisticsMetadata,
    #[serde(default)]
    pub summary: StatisticsSummary,
    #[serde(default)]
    pub time_series: Vec<TimeSeriesPoint>,
}

impl StatisticsSeries {
    pub fn key(&self) -> StatisticKey {
        StatisticKey::new(
            &self.metadata.stat_type,
            &self.metadata.component_id,
            &self.metadata.metric_name,
        )
    }

    /// Stable sort of the samples by time.
    pub fn sort_points(&mut self) {
        self.time_series.sort_by(|a, b| a.time.total_cmp(&b.time));
    }
}

impl Versioned for StatisticsSeries {
    fn format_version(&self) -> u32 {
        self.format_version
    }
}
