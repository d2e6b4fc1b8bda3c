//! Replication catalog: discovery, the active replication and shared documents

use std::collections::BTreeMap;
use std::sync::Arc;

use simtrace_types::layout::{ModelLayout, SharedVisualConfig};
use simtrace_types::manifest::{ReplicationManifest, ReplicationMetadata};

use super::loader::LoadContext;
use crate::config::Config;
use crate::error::{Result, SimtraceError};
use crate::storage::{StorageReader, join_path};

/// Outcome of one discovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Replications registered in the catalog
    pub registered: usize,
    /// Directories or manifests that were rejected
    pub skipped: usize,
}

/// Every replication found under the replications directory, keyed by id.
#[derive(Debug, Default)]
pub struct ReplicationCatalog {
    replications: BTreeMap<u32, Arc<ReplicationManifest>>,
    active: Option<u32>,
    model_layout: Option<Arc<ModelLayout>>,
    visual_config: Option<Arc<SharedVisualConfig>>,
}

impl ReplicationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the replications directory and register every readable manifest.
    ///
    /// The catalog is rebuilt from scratch. Bad directories and manifests are
    /// skipped with a warning. The shared layout and visual config come from
    /// the replication with the lowest id. The active replication survives
    /// only if it is still present.
    pub async fn discover_replications<R: StorageReader>(
        &mut self,
        ctx: LoadContext<'_, R>,
        config: &Config,
    ) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();
        self.replications.clear();
        self.model_layout = None;
        self.visual_config = None;

        let Some(listing) = ctx.reader.list_directory(&config.replications_dir).await else {
            log::warn!(
                "Replications directory '{}' could not be listed",
                config.replications_dir
            );
            self.active = None;
            return report;
        };

        let mut candidates = Vec::new();
        for entry in listing {
            if !entry.is_directory {
                log::debug!("Ignoring non-directory entry '{}'", entry.path);
                continue;
            }
            match config.parse_replication_dir(&entry.name) {
                Some(id) => {
                    let dir = join_path(&config.replications_dir, &entry.name);
                    candidates.push((id, join_path(&dir, &config.manifest_file_name(id))));
                }
                None => {
                    log::warn!("Skipping directory '{}': not a replication directory", entry.path);
                    report.skipped += 1;
                }
            }
        }

        let paths = candidates.iter().map(|(_, path)| path.clone()).collect();
        let results = ctx.load_all::<ReplicationManifest>(paths).await;

        for ((id, _), (path, result)) in candidates.into_iter().zip(results) {
            match result {
                Ok(manifest) => {
                    if manifest.metadata.replication_number != id {
                        log::warn!(
                            "Manifest '{}' declares replication {}, registering it as {}",
                            path,
                            manifest.metadata.replication_number,
                            id
                        );
                    }
                    if self.replications.insert(id, manifest).is_some() {
                        log::warn!("Replication {} from '{}' replaces an earlier manifest", id, path);
                    } else {
                        report.registered += 1;
                    }
                }
                Err(e) => {
                    log::warn!("Skipping replication {}: {}", id, e);
                    report.skipped += 1;
                }
            }
        }

        self.load_shared_documents(ctx).await;

        if let Some(id) = self.active
            && !self.replications.contains_key(&id)
        {
            log::warn!("Active replication {} disappeared during discovery", id);
            self.active = None;
        }

        log::info!(
            "Discovered {} replications ({} skipped)",
            report.registered,
            report.skipped
        );
        report
    }

    async fn load_shared_documents<R: StorageReader>(&mut self, ctx: LoadContext<'_, R>) {
        let Some(manifest) = self.replications.values().next().cloned() else {
            return;
        };

        if let Some(path) = &manifest.metadata.model_layout_path {
            match ctx.load::<ModelLayout>(path).await {
                Ok(layout) => self.model_layout = Some(layout),
                Err(e) => log::warn!("Failed to load model layout: {}", e),
            }
        }

        if let Some(path) = &manifest.metadata.visual_config_path {
            match ctx.load::<SharedVisualConfig>(path).await {
                Ok(visual) => self.visual_config = Some(visual),
                Err(e) => log::warn!("Failed to load shared visual config: {}", e),
            }
        }
    }

    /// Mark `id` active. Returns false, leaving the catalog untouched, when
    /// the id is unknown.
    pub fn set_active_replication(&mut self, id: u32) -> bool {
        if !self.replications.contains_key(&id) {
            log::warn!("Cannot activate replication {}: not in the catalog", id);
            return false;
        }
        self.active = Some(id);
        true
    }

    pub fn active_replication_id(&self) -> Option<u32> {
        self.active
    }

    pub fn active_manifest(&self) -> Option<Arc<ReplicationManifest>> {
        self.active.and_then(|id| self.manifest(id))
    }

    /// Active manifest, or an error when nothing is active.
    pub fn require_active_manifest(&self) -> Result<Arc<ReplicationManifest>> {
        self.active_manifest()
            .ok_or(SimtraceError::NoActiveReplication)
    }

    pub fn get_active_replication_metadata(&self) -> Option<ReplicationMetadata> {
        self.active_manifest()
            .map(|manifest| manifest.metadata.clone())
    }

    pub fn manifest(&self, id: u32) -> Option<Arc<ReplicationManifest>> {
        self.replications.get(&id).cloned()
    }

    /// Registered ids, ascending.
    pub fn replication_ids(&self) -> Vec<u32> {
        self.replications.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.replications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replications.is_empty()
    }

    pub fn model_layout(&self) -> Option<Arc<ModelLayout>> {
        self.model_layout.clone()
    }

    pub fn visual_config(&self) -> Option<Arc<SharedVisualConfig>> {
        self.visual_config.clone()
    }
}
