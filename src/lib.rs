//! Temporal indexing and querying of discrete-event simulation output.
//!
//! A study is a directory (or web root) of replications. Each replication
//! ships a manifest, entity path batches and metric time series. `Study`
//! discovers the replications, activates one at a time and answers
//! point-in-time and range queries over its data.
//!
//! ```rust,no_run
//! use simtrace::{StatisticKey, Study};
//!
//! # async fn run() -> simtrace::Result<()> {
//! let mut study = Study::open("output/study")?;
//! study.discover_replications().await;
//! study.set_active_replication(1).await?;
//!
//! let key = StatisticKey::new("activity_metric", "act1", "queueLength");
//! let queue = study.get_statistic_value_at_time(&key, 30.0, true);
//! let active = study.get_entity_ids_at_time(30.0);
//! # Ok::<(), simtrace::SimtraceError>(())
//! # }
//! ```

pub mod builder;
pub mod cache;
pub mod compute;
pub mod config;
pub mod db;
pub mod error;
pub mod storage;

pub use builder::StudyBuilder;
pub use cache::{ContentCache, Document};
pub use compute::timeline::{BUCKET_SIZE, TimelineIndex};
pub use db::{
    ActivationReport, DiscoveryReport, EntityPathIndex, EntityState, LoadContext, LoadReport,
    ReplicationCatalog, StatisticsIndex, Study,
};
pub use error::{Result, SimtraceError};

#[cfg(feature = "sync")]
pub use db::SyncStudy;

pub use config::{
    CacheStats, Config, EntityPath, EntityPathBatch, EntityPathFileDescriptor, IndexStats,
    ModelLayout, PathPoint, ReplicationManifest, ReplicationMetadata, SharedVisualConfig,
    StatisticKey, StatisticsFileDescriptor, StatisticsMetadata, StatisticsSeries,
    StatisticsSummary, StudyStats, TimeSeriesPoint,
};

pub use storage::{DirEntry, LocalReader, MemoryReader, StorageReader};
#[cfg(feature = "remote")]
pub use storage::HttpReader;

pub use geo::Point;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Result, SimtraceError, Study, StudyBuilder};

    pub use crate::{Config, StatisticKey};

    pub use crate::{LocalReader, MemoryReader, StorageReader};

    #[cfg(feature = "remote")]
    pub use crate::HttpReader;

    #[cfg(feature = "sync")]
    pub use crate::SyncStudy;

    pub use geo::Point;
}
