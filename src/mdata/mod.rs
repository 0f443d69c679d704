//! In-memory chunked metric storage and rollup derivation.

mod accumulator;
mod aggregator;
mod series;

pub use accumulator::Aggregation;
pub use aggregator::{agg_boundary, AggFunc, Aggregator, SinkSet};
pub use series::{Chunk, MemorySeries, MemoryStore, MetricStore, Point, SeriesSink};
