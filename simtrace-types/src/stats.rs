use serde::{Deserialize, Serialize};

/// Content cache counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of parsed documents currently held
    pub entries: usize,
    /// Requests answered without touching storage
    pub hits: u64,
    /// Requests that had to read from storage
    pub misses: u64,
    /// Reads whose content failed to decode
    pub parse_failures: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of requests served from memory, 0.0 when nothing was requested.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Entity path index counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub entities: usize,
    /// Non-empty timeline buckets
    pub buckets: usize,
    /// Batch files merged since the last clear
    pub loaded_files: usize,
}

/// Snapshot of a whole study
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyStats {
    /// Replications registered by discovery
    pub replications: usize,
    pub active_replication: Option<u32>,
    pub entity_index: IndexStats,
    pub statistics_series: usize,
    pub cache: CacheStats,
}

impl StudyStats {
    pub fn new() -> Self {
        Self::default()
    }
}
