//! Entity path index: loaded entity paths plus their timeline
//!
//! This module owns every entity path loaded for the active replication and
//! answers point-in-time and range queries over them. Batches are merged
//! whole; an entity's path is never mutated after it is loaded.

use geo::Point;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use simtrace_types::manifest::{EntityPathFileDescriptor, ReplicationManifest};
use simtrace_types::path::{EntityPath, EntityPathBatch};
use simtrace_types::stats::IndexStats;

use super::loader::{LoadContext, LoadReport};
use crate::compute::interpolate::{Bracket, bracket, fraction};
use crate::compute::timeline::TimelineIndex;
use crate::compute::validation::{normalize_window, validate_entity_path};
use crate::error::Result;
use crate::storage::StorageReader;

/// Where an entity is and what it is doing at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    pub entity_id: String,
    pub entity_type: String,
    /// State of the latest sample at or before the query time
    pub state: String,
    pub x: f64,
    pub y: f64,
    /// False when the query time hit a sample exactly
    pub interpolated: bool,
    /// Event of the sample hit exactly, never set when interpolated
    pub event: Option<String>,
    pub component_id: Option<String>,
}

impl EntityState {
    pub fn position(&self) -> Point<f64> {
        Point::new(self.x, self.y)
    }
}

/// Loaded entity paths keyed by id, with a bucketed timeline over their
/// lifetimes.
#[derive(Debug, Default)]
pub struct EntityPathIndex {
    entities: FxHashMap<Arc<str>, Arc<EntityPath>>,
    timeline: TimelineIndex,
    loaded_files: FxHashSet<String>,
}

impl EntityPathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one decoded batch. Invalid entities are skipped.
    ///
    /// Returns the number of entities registered.
    fn merge_batch(&mut self, path: &str, batch: &EntityPathBatch) -> usize {
        let mut merged = 0;
        for entity in &batch.entities {
            if let Err(e) = validate_entity_path(entity) {
                log::warn!("Skipping entity in '{}': {}", path, e);
                continue;
            }

            let id: Arc<str> = Arc::from(entity.id.as_str());
            if self
                .entities
                .insert(id, Arc::new(entity.clone()))
                .is_some()
            {
                log::warn!("Entity '{}' from '{}' replaces an earlier path", entity.id, path);
            }
            merged += 1;
        }

        if merged < batch.len() {
            log::debug!("Merged {} of {} entities from '{}'", merged, batch.len(), path);
        } else if batch.is_empty() {
            log::debug!("Entity path batch '{}' is empty", path);
        }

        self.loaded_files.insert(path.to_string());
        merged
    }

    /// Rebuild the timeline from scratch over the current entity set.
    fn rebuild_index(&mut self) {
        self.timeline = TimelineIndex::build(
            self.entities
                .iter()
                .map(|(id, entity)| (id, entity.as_ref())),
        );
        log::debug!(
            "Timeline rebuilt: {} entities over {} buckets",
            self.entities.len(),
            self.timeline.bucket_count()
        );
    }

    /// Load and merge the batches at `paths`, then rebuild the timeline once.
    async fn load_batches<R: StorageReader>(
        &mut self,
        paths: Vec<String>,
        ctx: LoadContext<'_, R>,
    ) -> LoadReport {
        let mut report = LoadReport::default();
        if paths.is_empty() {
            return report;
        }

        for (path, result) in ctx.load_all::<EntityPathBatch>(paths).await {
            match result {
                Ok(batch) => {
                    self.merge_batch(&path, &batch);
                    report.loaded += 1;
                }
                Err(e) => {
                    log::warn!("Failed to load entity path batch: {}", e);
                    report.failed += 1;
                }
            }
        }

        self.rebuild_index();
        report
    }

    /// Load a single batch and merge it.
    ///
    /// A batch whose file was already merged is not read again and yields
    /// `Ok(0)`. A decode failure registers nothing from the batch.
    pub async fn load_batch<R: StorageReader>(
        &mut self,
        descriptor: &EntityPathFileDescriptor,
        ctx: LoadContext<'_, R>,
    ) -> Result<usize> {
        if self.is_file_loaded(&descriptor.path) {
            return Ok(0);
        }

        let batch = ctx.load::<EntityPathBatch>(&descriptor.path).await?;
        let merged = self.merge_batch(&descriptor.path, &batch);
        self.rebuild_index();
        Ok(merged)
    }

    /// Replace everything with the batches listed by `manifest`.
    pub async fn load_for_replication<R: StorageReader>(
        &mut self,
        manifest: &ReplicationManifest,
        ctx: LoadContext<'_, R>,
    ) -> LoadReport {
        self.clear();
        let paths = manifest
            .entity_path_files
            .iter()
            .map(|d| d.path.clone())
            .collect();

        let report = self.load_batches(paths, ctx).await;
        log::info!(
            "Loaded {} entities for replication {} ({} batches, {} failed)",
            self.entities.len(),
            manifest.metadata.replication_number,
            report.loaded,
            report.failed
        );
        report
    }

    /// Additively load every not-yet-merged batch that can hold entities
    /// relevant to `[start, end]`.
    pub async fn load_for_time_range<R: StorageReader>(
        &mut self,
        manifest: &ReplicationManifest,
        start: f64,
        end: f64,
        ctx: LoadContext<'_, R>,
    ) -> LoadReport {
        let (_, end) = match normalize_window(start, end) {
            Ok(window) => window,
            Err(e) => {
                log::warn!("Rejecting range load: {}", e);
                return LoadReport::default();
            }
        };

        let mut skipped = 0;
        let mut paths = Vec::new();
        for descriptor in manifest
            .entity_path_files
            .iter()
            .filter(|d| d.enters_by(end))
        {
            if self.is_file_loaded(&descriptor.path) {
                skipped += 1;
            } else {
                paths.push(descriptor.path.clone());
            }
        }

        let mut report = self.load_batches(paths, ctx).await;
        report.skipped = skipped;
        report
    }

    /// Ids of entities alive at `t`.
    pub fn get_entity_ids_at_time(&self, t: f64) -> BTreeSet<String> {
        self.timeline
            .candidates_at(t)
            .iter()
            .filter(|id| {
                self.entities
                    .get(*id)
                    .is_some_and(|entity| entity.is_active_at(t))
            })
            .map(|id| id.to_string())
            .collect()
    }

    /// Entities whose lifetime overlaps `[start, end]`, keyed by id.
    pub fn get_entities_in_time_range(
        &self,
        start: f64,
        end: f64,
    ) -> BTreeMap<String, Arc<EntityPath>> {
        let (start, end) = match normalize_window(start, end) {
            Ok(window) => window,
            Err(e) => {
                log::warn!("Rejecting range query: {}", e);
                return BTreeMap::new();
            }
        };

        self.timeline
            .candidates_in_range(start, end)
            .into_iter()
            .filter_map(|id| {
                let entity = self.entities.get(&id)?;
                entity
                    .overlaps(start, end)
                    .then(|| (id.to_string(), entity.clone()))
            })
            .collect()
    }

    /// State and position of one entity at `t`, or `None` when the entity
    /// is unknown or not alive at `t`.
    ///
    /// Position is interpolated linearly between the bracketing samples;
    /// the state is held from the earlier sample.
    pub fn get_entity_state_at_time(&self, id: &str, t: f64) -> Option<EntityState> {
        let entity = self.entities.get(id)?;

        match bracket(&entity.path, t, |p| p.clock)? {
            Bracket::Before(_) | Bracket::After(_) => None,
            Bracket::Exact(point) => Some(EntityState {
                entity_id: entity.id.clone(),
                entity_type: entity.entity_type.clone(),
                state: point.state.clone(),
                x: point.x,
                y: point.y,
                interpolated: false,
                event: point.event.clone(),
                component_id: point.component_id.clone(),
            }),
            Bracket::Between(before, after) => {
                let f = fraction(before.clock, after.clock, t);
                let position =
                    before.position() + (after.position() - before.position()) * f;
                Some(EntityState {
                    entity_id: entity.id.clone(),
                    entity_type: entity.entity_type.clone(),
                    state: before.state.clone(),
                    x: position.x(),
                    y: position.y(),
                    interpolated: true,
                    event: None,
                    component_id: before.component_id.clone(),
                })
            }
        }
    }

    /// Entities with exactly this type tag, ordered by id.
    pub fn get_entities_by_type(&self, entity_type: &str) -> Vec<Arc<EntityPath>> {
        let mut matches: Vec<_> = self
            .entities
            .values()
            .filter(|entity| entity.entity_type == entity_type)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches
    }

    pub fn get_entity_path(&self, id: &str) -> Option<Arc<EntityPath>> {
        self.entities.get(id).cloned()
    }

    pub fn get_loaded_entity_ids(&self) -> BTreeSet<String> {
        self.entities.keys().map(|id| id.to_string()).collect()
    }

    pub fn get_entity_types(&self) -> BTreeSet<String> {
        self.entities
            .values()
            .map(|entity| entity.entity_type.clone())
            .collect()
    }

    /// Earliest first sample and latest last sample over all entities.
    pub fn get_time_bounds(&self) -> Option<(f64, f64)> {
        self.entities
            .values()
            .filter_map(|entity| entity.lifetime())
            .reduce(|(lo, hi), (first, last)| (lo.min(first), hi.max(last)))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn loaded_file_count(&self) -> usize {
        self.loaded_files.len()
    }

    pub fn is_file_loaded(&self, path: &str) -> bool {
        self.loaded_files.contains(path)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            entities: self.entities.len(),
            buckets: self.timeline.bucket_count(),
            loaded_files: self.loaded_files.len(),
        }
    }

    /// Drop every entity, the timeline and the loaded-file record.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.timeline.clear();
        self.loaded_files.clear();
    }
}
