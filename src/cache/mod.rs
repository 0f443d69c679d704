//! Local chunk-cache contract used by the delete path.
//!
//! Eviction policy and chunk bookkeeping are cache internals behind this
//! seam; the write path only needs to register cached archives and drop
//! every cached archive of a metric.

use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;

/// Outcome of deleting one metric from the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelMetricResult {
    pub series: usize,
    pub archives: usize,
}

pub trait ChunkCache: Send + Sync {
    /// Record that chunks of `archive_key` (one archive of metric `id`)
    /// are cached.
    fn add(&self, metric_id: &str, archive_key: &str);

    /// Drop every cached archive of `metric_id`. Deleting an absent id is
    /// a no-op reported as zero counts, not an error.
    fn del_metric(&self, metric_id: &str) -> DelMetricResult;
}

/// In-memory cache bookkeeping: metric id -> cached archive keys.
#[derive(Default)]
pub struct MemoryCache {
    metrics: RwLock<AHashMap<String, AHashSet<String>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.metrics.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.read().is_empty()
    }
}

impl ChunkCache for MemoryCache {
    fn add(&self, metric_id: &str, archive_key: &str) {
        self.metrics
            .write()
            .entry(metric_id.to_string())
            .or_default()
            .insert(archive_key.to_string());
    }

    fn del_metric(&self, metric_id: &str) -> DelMetricResult {
        match self.metrics.write().remove(metric_id) {
            Some(archives) => DelMetricResult {
                series: 1,
                archives: archives.len(),
            },
            None => DelMetricResult::default(),
        }
    }
}
