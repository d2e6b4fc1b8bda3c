use serde::{Deserialize, Serialize};

use crate::statistics::StatisticKey;
use crate::{Versioned, default_format_version};

/// Manifest describing one replication and the files it is made of.
///
/// Manifests are immutable once loaded; the catalog shares them behind `Arc`.
///
/// # Examples
///
/// ```
/// use simtrace_types::manifest::ReplicationManifest;
///
/// let manifest: ReplicationManifest = serde_json::from_str(r#"{
///     "metadata": { "simulationId": "bank", "replicationNumber": 3, "duration": 100.0 },
///     "entityPathFiles": [
///         { "path": "replications/replication_3/paths_0.json", "entryTimeStart": 0.0, "entryTimeEnd": 50.0 }
///     ]
/// }"#).unwrap();
///
/// assert_eq!(manifest.metadata.replication_number, 3);
/// assert!(manifest.statistics_files.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationManifest {
    #[serde(default = "default_format_version")]
    pub format_version: u32,

    pub metadata: ReplicationMetadata,

    #[serde(default)]
    pub entity_path_files: Vec<EntityPathFileDescriptor>,

    #[serde(default)]
    pub statistics_files: Vec<StatisticsFileDescriptor>,
}

impl Versioned for ReplicationManifest {
    fn format_version(&self) -> u32 {
        self.format_version
    }
}

/// Run-level metadata carried by a manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplicationMetadata {
    pub simulation_id: String,
    pub replication_number: u32,
    /// Simulated duration, in `time_unit`.
    pub duration: f64,
    pub time_unit: String,
    /// Root-relative path of the shared model layout document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_layout_path: Option<String>,
    /// Root-relative path of the shared visual configuration document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_config_path: Option<String>,
}

/// One batch of entity paths, with the window in which its entities enter
/// the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPathFileDescriptor {
    pub path: String,
    #[serde(default)]
    pub entry_time_start: f64,
    #[serde(default)]
    pub entry_time_end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_count: Option<u64>,
}

impl EntityPathFileDescriptor {
    /// Whether the batch can hold entities alive at or before `end`.
    ///
    /// An entity that entered before a window's start may still be alive
    /// inside it, so batches are never excluded on `entry_time_end`.
    pub fn enters_by(&self, end: f64) -> bool {
        self.entry_time_start <= end
    }
}

/// Identifies one metric time series and where to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsFileDescriptor {
    #[serde(rename = "type")]
    pub stat_type: String,
    #[serde(default)]
    pub component_id: String,
    pub metric_name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_end: Option<f64>,
}

impl StatisticsFileDescriptor {
    pub fn key(&self) -> StatisticKey {
        StatisticKey::new(&self.stat_type, &self.component_id, &self.metric_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_optional_fields_default() {
        let manifest: ReplicationManifest =
            serde_json::from_str(r#"{ "metadata": { "replicationNumber": 7 } }"#).unwrap();

        assert_eq!(manifest.format_version, 1);
        assert_eq!(manifest.metadata.replication_number, 7);
        assert_eq!(manifest.metadata.duration, 0.0);
        assert!(manifest.metadata.model_layout_path.is_none());
        assert!(manifest.entity_path_files.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let manifest: ReplicationManifest = serde_json::from_str(
            r#"{ "metadata": { "replicationNumber": 1, "seed": 42 }, "generator": "v9" }"#,
        )
        .unwrap();
        assert_eq!(manifest.metadata.replication_number, 1);
    }

    #[test]
    fn test_descriptor_relevance_uses_entry_start_only() {
        let descriptor = EntityPathFileDescriptor {
            path: "p.json".into(),
            entry_time_start: 50.0,
            entry_time_end: 60.0,
            entity_count: None,
        };

        assert!(descriptor.enters_by(50.0));
        assert!(descriptor.enters_by(200.0));
        assert!(!descriptor.enters_by(49.9));
    }

    #[test]
    fn test_statistics_descriptor_key() {
        let descriptor: StatisticsFileDescriptor = serde_json::from_str(
            r#"{ "type": "activity_metric", "componentId": "act1", "metricName": "queueLength", "path": "s.json" }"#,
        )
        .unwrap();
        assert_eq!(
            descriptor.key().as_str(),
            "activity_metric::act1::queueLength"
        );
    }
}
