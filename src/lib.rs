pub mod api;
pub mod cache;
pub mod cluster;
pub mod conf;
pub mod idx;
pub mod input;
pub mod mdata;
pub mod observability;
pub mod pattern;
pub mod schema;
pub mod stats;

pub use input::{DefaultHandler, Handler};
pub use mdata::{agg_boundary, Aggregator, MemorySeries, MemoryStore, MetricStore, SeriesSink};
pub use schema::MetricData;
