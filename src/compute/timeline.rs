//! Time-bucketed index of entity lifetimes.
//!
//! Every entity is registered in each fixed-width bucket its lifetime
//! `[first clock, last clock]` touches. Bucket lookups are a conservative
//! superset of the entities alive in the bucket; callers apply the exact
//! interval test afterwards.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::sync::Arc;

use simtrace_types::path::EntityPath;

/// Width of one timeline bucket in simulation time units.
pub const BUCKET_SIZE: f64 = 10.0;

pub type BucketId = i64;

/// Most buckets a single lifetime may span. Longer lifetimes are rejected
/// before indexing since every spanned bucket is materialized.
pub const MAX_BUCKET_SPAN: BucketId = 1 << 20;

/// Bucket holding simulation time `t`.
#[inline]
pub fn bucket_of(t: f64) -> BucketId {
    (t / BUCKET_SIZE).floor() as BucketId
}

type Bucket = SmallVec<[Arc<str>; 4]>;

/// Mapping from bucket id to the entities whose lifetime overlaps it.
///
/// Derived data: always rebuilt in full from the loaded entity set.
#[derive(Debug, Clone, Default)]
pub struct TimelineIndex {
    buckets: FxHashMap<BucketId, Bucket>,
}

impl TimelineIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index over `(id, path)` pairs. Entities with an empty path
    /// have no lifetime and are not indexed.
    pub fn build<'a, I>(entities: I) -> Self
    where
        I: IntoIterator<Item = (&'a Arc<str>, &'a EntityPath)>,
    {
        let mut index = Self::new();
        for (id, entity) in entities {
            if let Some((first, last)) = entity.lifetime() {
                index.insert(id, first, last);
            }
        }
        index
    }

    /// Register `id` in every bucket of `[first, last]`.
    ///
    /// Callers keep the span within [`MAX_BUCKET_SPAN`].
    pub fn insert(&mut self, id: &Arc<str>, first: f64, last: f64) {
        let start_bucket = bucket_of(first);
        let end_bucket = bucket_of(last);
        for bucket in start_bucket..=end_bucket {
            self.buckets.entry(bucket).or_default().push(id.clone());
        }
    }

    /// Entities registered in the bucket holding `t`.
    pub fn candidates_at(&self, t: f64) -> &[Arc<str>] {
        self.buckets
            .get(&bucket_of(t))
            .map(|bucket| bucket.as_slice())
            .unwrap_or(&[])
    }

    /// Entities registered in any bucket spanned by `[start, end]`.
    pub fn candidates_in_range(&self, start: f64, end: f64) -> FxHashSet<Arc<str>> {
        let start_bucket = bucket_of(start);
        let end_bucket = bucket_of(end);
        let mut candidates = FxHashSet::default();

        let span = end_bucket.saturating_sub(start_bucket);
        if span < 0 || self.is_empty() {
            return candidates;
        }

        // Wide windows: walk the populated buckets instead of every id in range.
        if span as u64 >= self.buckets.len() as u64 {
            for (_, bucket) in self
                .buckets
                .iter()
                .filter(|(id, _)| (start_bucket..=end_bucket).contains(*id))
            {
                candidates.extend(bucket.iter().cloned());
            }
        } else {
            for bucket_id in start_bucket..=end_bucket {
                if let Some(bucket) = self.buckets.get(&bucket_id) {
                    candidates.extend(bucket.iter().cloned());
                }
            }
        }

        candidates
    }

    /// Number of populated buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}
