//! Configuration for a simtrace study
//!
//! This module provides the study configuration and re-exports the data
//! contracts from the `simtrace-types` crate for convenience.
use crate::error::SimtraceError;

pub use simtrace_types::layout::{ModelLayout, SharedVisualConfig};
pub use simtrace_types::manifest::{
    EntityPathFileDescriptor, ReplicationManifest, ReplicationMetadata, StatisticsFileDescriptor,
};
pub use simtrace_types::path::{EntityPath, EntityPathBatch, PathPoint};
pub use simtrace_types::statistics::{
    StatisticKey, StatisticsMetadata, StatisticsSeries, StatisticsSummary, TimeSeriesPoint,
};
pub use simtrace_types::stats::{CacheStats, IndexStats, StudyStats};

/// Placeholder substituted with the replication id in manifest file names
pub const ID_PLACEHOLDER: &str = "{id}";

/// Study configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding one subdirectory per replication
    #[serde(default = "Config::default_replications_dir")]
    pub replications_dir: String,

    /// Replication directories are named `<prefix><id>`
    #[serde(default = "Config::default_replication_dir_prefix")]
    pub replication_dir_prefix: String,

    /// Manifest file name inside a replication directory; `{id}` is replaced
    #[serde(default = "Config::default_manifest_file_template")]
    pub manifest_file_template: String,

    /// Upper bound on document reads in flight during one bulk load
    #[serde(default = "Config::default_max_concurrent_loads")]
    pub max_concurrent_loads: usize,

    /// Skip entity batches on activation; load them by time range instead
    #[serde(default)]
    pub lazy_entity_loading: bool,
}

impl Config {
    fn default_replications_dir() -> String {
        "replications".to_string()
    }

    fn default_replication_dir_prefix() -> String {
        "replication_".to_string()
    }

    fn default_manifest_file_template() -> String {
        "replication_{id}_manifest.json".to_string()
    }

    const fn default_max_concurrent_loads() -> usize {
        16
    }

    pub fn with_replications_dir(mut self, dir: impl Into<String>) -> Self {
        self.replications_dir = dir.into();
        self
    }

    pub fn with_replication_dir_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.replication_dir_prefix = prefix.into();
        self
    }

    pub fn with_manifest_file_template(mut self, template: impl Into<String>) -> Self {
        self.manifest_file_template = template.into();
        self
    }

    /// A limit of zero is kept and rejected later by [`validate`](Self::validate).
    pub fn with_max_concurrent_loads(mut self, limit: usize) -> Self {
        if limit > 1024 {
            log::warn!(
                "Concurrent load limit of {} is very large; every in-flight read \
                holds its whole document in memory.",
                limit
            );
        }

        self.max_concurrent_loads = limit;
        self
    }

    pub fn with_lazy_entity_loading(mut self, lazy: bool) -> Self {
        self.lazy_entity_loading = lazy;
        self
    }

    /// Replication id encoded in a directory name, if it follows the pattern.
    ///
    /// ```
    /// use simtrace::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.parse_replication_dir("replication_12"), Some(12));
    /// assert_eq!(config.parse_replication_dir("replication_"), None);
    /// assert_eq!(config.parse_replication_dir("replication_1a"), None);
    /// assert_eq!(config.parse_replication_dir("shared"), None);
    /// ```
    pub fn parse_replication_dir(&self, name: &str) -> Option<u32> {
        let digits = name.strip_prefix(&self.replication_dir_prefix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Manifest file name for a replication id.
    pub fn manifest_file_name(&self, id: u32) -> String {
        self.manifest_file_template
            .replace(ID_PLACEHOLDER, &id.to_string())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.replication_dir_prefix.is_empty() {
            return Err("Replication directory prefix cannot be empty".to_string());
        }

        if !self.manifest_file_template.contains(ID_PLACEHOLDER) {
            return Err(format!(
                "Manifest file template '{}' must contain '{}'",
                self.manifest_file_template, ID_PLACEHOLDER
            ));
        }

        if self.max_concurrent_loads == 0 {
            return Err("Concurrent load limit must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Parse and validate a JSON config. Malformed JSON is a
    /// [`SimtraceError::Json`], a rejected value an
    /// [`SimtraceError::InvalidConfig`].
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate().map_err(SimtraceError::InvalidConfig)?;
        Ok(config)
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        let config: Config = toml::from_str(toml_str)
            .map_err(|e| SimtraceError::InvalidConfig(e.to_string()))?;
        config.validate().map_err(SimtraceError::InvalidConfig)?;
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> crate::error::Result<String> {
        toml::to_string_pretty(self).map_err(|e| SimtraceError::InvalidConfig(e.to_string()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            replications_dir: Self::default_replications_dir(),
            replication_dir_prefix: Self::default_replication_dir_prefix(),
            manifest_file_template: Self::default_manifest_file_template(),
            max_concurrent_loads: Self::default_max_concurrent_loads(),
            lazy_entity_loading: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.replications_dir, "replications");
        assert_eq!(config.manifest_file_name(4), "replication_4_manifest.json");
        assert_eq!(config.max_concurrent_loads, 16);
        assert!(!config.lazy_entity_loading);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default()
            .with_replications_dir("runs")
            .with_replication_dir_prefix("run-")
            .with_manifest_file_template("manifest-{id}.json")
            .with_max_concurrent_loads(4)
            .with_lazy_entity_loading(true);

        let json = config.to_json().unwrap();
        let deserialized = Config::from_json(&json).unwrap();

        assert_eq!(deserialized, config);
        assert_eq!(deserialized.parse_replication_dir("run-3"), Some(3));
        assert_eq!(deserialized.manifest_file_name(3), "manifest-3.json");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json(r#"{ "replications_dir": "out" }"#).unwrap();
        assert_eq!(config.replications_dir, "out");
        assert_eq!(config.replication_dir_prefix, "replication_");
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default().with_manifest_file_template("manifest.json");
        assert!(config.validate().is_err());
        assert!(matches!(
            Config::from_json(r#"{ "max_concurrent_loads": 0 }"#),
            Err(SimtraceError::InvalidConfig(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{ "unknown": 1 }"#),
            Err(SimtraceError::Json(_))
        ));
        assert!(matches!(Config::from_json("{"), Err(SimtraceError::Json(_))));
    }

    #[test]
    fn test_zero_load_limit_is_rejected_not_panicking() {
        let config = Config::default().with_max_concurrent_loads(0);
        assert_eq!(config.max_concurrent_loads, 0);
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_config_toml() {
        let config = Config::from_toml("replications_dir = \"runs\"\nlazy_entity_loading = true\n")
            .unwrap();
        assert_eq!(config.replications_dir, "runs");
        assert!(config.lazy_entity_loading);
        assert!(Config::from_toml(&config.to_toml().unwrap()).is_ok());
        assert!(matches!(
            Config::from_toml("max_concurrent_loads = 0\n"),
            Err(SimtraceError::InvalidConfig(_))
        ));
    }
}
