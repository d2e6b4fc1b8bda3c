use geo::Point;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::{Versioned, default_format_version};

/// A single sample of an entity's path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathPoint {
    /// Simulation clock at which the sample was taken.
    pub clock: f64,
    pub x: f64,
    pub y: f64,
    /// Logical state of the entity from this sample on.
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
}

impl PathPoint {
    pub fn new(clock: f64, x: f64, y: f64, state: impl Into<String>) -> Self {
        Self {
            clock,
            x,
            y,
            state: state.into(),
            event: None,
            component_id: None,
            attributes: None,
        }
    }

    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn with_component(mut self, component_id: impl Into<String>) -> Self {
        self.component_id = Some(component_id.into());
        self
    }

    /// Position as a 2D point.
    pub fn position(&self) -> Point<f64> {
        Point::new(self.x, self.y)
    }
}

/// The full path of one simulated entity.
///
/// Points are kept in ascending clock order, so the entity is alive over
/// `[path[0].clock, path[last].clock]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPath {
    pub id: String,
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default)]
    pub path: Vec<PathPoint>,
}

impl EntityPath {
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>, path: Vec<PathPoint>) -> Self {
        let mut entity = Self {
            id: id.into(),
            entity_type: entity_type.into(),
            path,
        };
        entity.sort_points();
        entity
    }

    pub fn first(&self) -> Option<&PathPoint> {
        self.path.first()
    }

    pub fn last(&self) -> Option<&PathPoint> {
        self.path.last()
    }

    /// `(first clock, last clock)`, or `None` for an empty path.
    pub fn lifetime(&self) -> Option<(f64, f64)> {
        match (self.path.first(), self.path.last()) {
            (Some(first), Some(last)) => Some((first.clock, last.clock)),
            _ => None,
        }
    }

    /// Whether `t` lies inside the entity's lifetime (both ends inclusive).
    pub fn is_active_at(&self, t: f64) -> bool {
        self.lifetime()
            .is_some_and(|(first, last)| first <= t && t <= last)
    }

    /// Whether the lifetime overlaps `[start, end]`.
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.lifetime()
            .is_some_and(|(first, last)| first <= end && last >= start)
    }

    /// Stable sort of the points by clock.
    pub fn sort_points(&mut self) {
        self.path.sort_by(|a, b| a.clock.total_cmp(&b.clock));
    }
}

/// A batch document holding many entity paths.
///
/// Two encodings of `entities` are accepted and normalised to the same
/// shape: an object keyed by entity id, or an array of objects that carry
/// their own `id` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawEntityPathBatch")]
pub struct EntityPathBatch {
    pub format_version: u32,
    pub entities: Vec<EntityPath>,
}

impl EntityPathBatch {
    pub fn sort_points(&mut self) {
        for entity in &mut self.entities {
            entity.sort_points();
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Versioned for EntityPathBatch {
    fn format_version(&self) -> u32 {
        self.format_version
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntityPathBatch {
    #[serde(default = "default_format_version")]
    format_version: u32,
    #[serde(default)]
    entities: RawEntities,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntities {
    Keyed(BTreeMap<String, KeyedEntity>),
    Listed(Vec<EntityPath>),
}

impl Default for RawEntities {
    fn default() -> Self {
        RawEntities::Listed(Vec::new())
    }
}

#[derive(Deserialize)]
struct KeyedEntity {
    #[serde(rename = "type", default)]
    entity_type: String,
    #[serde(default)]
    path: Vec<PathPoint>,
}

impl From<RawEntityPathBatch> for EntityPathBatch {
    fn from(raw: RawEntityPathBatch) -> Self {
        let entities = match raw.entities {
            RawEntities::Listed(entities) => entities,
            RawEntities::Keyed(map) => map
                .into_iter()
                .map(|(id, entity)| EntityPath {
                    id,
                    entity_type: entity.entity_type,
                    path: entity.path,
                })
                .collect(),
        };

        Self {
            format_version: raw.format_version,
            entities,
        }
    }
}
