//! Chunked in-memory series and the store that owns them.

use super::aggregator::{AggFunc, Aggregator};
use crate::conf::WritePathConfig;
use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::debug;

/// A single (timestamp, value) sample.
pub type Point = (u32, f64);

/// Append surface of a chunked series. The raw series of a metric and every
/// rollup series derived from it are instances of this.
pub trait SeriesSink: Send + Sync {
    fn add(&self, ts: u32, value: f64);
}

/// A fixed-width run of points within a series. `t0` is aligned to the
/// chunk span.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub t0: u32,
    pub points: Vec<Point>,
}

struct SeriesInner {
    last_ts: u32,
    chunks: Vec<Chunk>,
    aggregators: Vec<Aggregator>,
}

/// In-memory chunked series.
///
/// Appends and any rollup derivation they trigger run under one lock, so a
/// series never observes its own points out of order even if transports
/// misroute a metric across workers.
pub struct MemorySeries {
    id: String,
    name: String,
    schema_id: u16,
    agg_id: u16,
    chunk_span: u32,
    inner: Mutex<SeriesInner>,
}

impl MemorySeries {
    pub fn new(id: &str, name: &str, schema_id: u16, agg_id: u16, chunk_span: u32) -> Self {
        Self::with_aggregators(id, name, schema_id, agg_id, chunk_span, Vec::new())
    }

    pub fn with_aggregators(
        id: &str,
        name: &str,
        schema_id: u16,
        agg_id: u16,
        chunk_span: u32,
        aggregators: Vec<Aggregator>,
    ) -> Self {
        MemorySeries {
            id: id.to_string(),
            name: name.to_string(),
            schema_id,
            agg_id,
            chunk_span,
            inner: Mutex::new(SeriesInner {
                last_ts: 0,
                chunks: Vec::new(),
                aggregators,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema_id(&self) -> u16 {
        self.schema_id
    }

    pub fn agg_id(&self) -> u16 {
        self.agg_id
    }

    /// All points across chunks, oldest first.
    pub fn points(&self) -> Vec<Point> {
        let inner = self.inner.lock();
        inner
            .chunks
            .iter()
            .flat_map(|chunk| chunk.points.iter().copied())
            .collect()
    }

    pub fn num_chunks(&self) -> usize {
        self.inner.lock().chunks.len()
    }

    /// The rollup series for `func` at `span`, if this series is aggregated.
    pub fn rollup(&self, func: AggFunc, span: u32) -> Option<Arc<MemorySeries>> {
        let inner = self.inner.lock();
        inner
            .aggregators
            .iter()
            .find(|agg| agg.span() == span)
            .and_then(|agg| agg.aggregated(func))
    }
}

impl SeriesSink for MemorySeries {
    fn add(&self, ts: u32, value: f64) {
        let mut inner = self.inner.lock();
        if ts <= inner.last_ts {
            debug!(
                "{}: discarding point with ts {} not after last ts {}",
                self.name, ts, inner.last_ts
            );
            return;
        }
        inner.last_ts = ts;

        let needs_new_chunk = match inner.chunks.last() {
            Some(chunk) => ts >= chunk.t0 + self.chunk_span,
            None => true,
        };
        if needs_new_chunk {
            inner.chunks.push(Chunk {
                t0: ts - (ts % self.chunk_span),
                points: Vec::new(),
            });
        }
        if let Some(chunk) = inner.chunks.last_mut() {
            chunk.points.push((ts, value));
        }

        for aggregator in &mut inner.aggregators {
            aggregator.add(ts, value);
        }
    }
}

/// Contract the ingestion path needs from series storage.
pub trait MetricStore: Send + Sync {
    /// Fetch the raw series for `id`, creating it (with any configured
    /// rollups) on first sight.
    fn get_or_create(
        &self,
        id: &str,
        name: &str,
        schema_id: u16,
        agg_id: u16,
    ) -> Arc<MemorySeries>;
}

/// Process-local store of raw series, plus the rollup rules applied when a
/// series is first created. Rollup child series are owned by their
/// aggregators and are not store members themselves.
pub struct MemoryStore {
    config: WritePathConfig,
    series: RwLock<AHashMap<String, Arc<MemorySeries>>>,
}

impl MemoryStore {
    pub fn new(config: WritePathConfig) -> Self {
        MemoryStore {
            config,
            series: RwLock::new(AHashMap::new()),
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<MemorySeries>> {
        self.series.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.series.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.read().is_empty()
    }
}

impl MetricStore for MemoryStore {
    fn get_or_create(
        &self,
        id: &str,
        name: &str,
        schema_id: u16,
        agg_id: u16,
    ) -> Arc<MemorySeries> {
        if let Some(series) = self.series.read().get(id) {
            return series.clone();
        }

        let mut all = self.series.write();
        all.entry(id.to_string())
            .or_insert_with(|| {
                let aggregators = match self.config.rule_for(name) {
                    Some(rule) => rule
                        .spans
                        .iter()
                        .map(|&span| {
                            Aggregator::new(id, span, &rule.methods, self.config.chunk_span)
                        })
                        .collect(),
                    None => Vec::new(),
                };
                debug!(
                    "creating series {} ({}) with {} aggregator(s)",
                    name,
                    id,
                    aggregators.len()
                );
                Arc::new(MemorySeries::with_aggregators(
                    id,
                    name,
                    schema_id,
                    agg_id,
                    self.config.chunk_span,
                    aggregators,
                ))
            })
            .clone()
    }
}
