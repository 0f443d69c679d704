//! Ingestion Pipeline Integration Tests
//!
//! Drives points through the default handler and verifies:
//! - validation and drop behavior
//! - index and store writes
//! - rollup derivation through configured rules

use std::sync::Arc;
use tickstore::conf::{AggMethod, RollupRule, WritePathConfig};
use tickstore::idx::{MemoryIndex, MetricIndex};
use tickstore::input::{DefaultHandler, Handler};
use tickstore::mdata::{AggFunc, MemoryStore};
use tickstore::schema::{MetricData, Mtype};

fn point(name: &str, time: u32, value: f64) -> MetricData {
    let mut md = MetricData {
        id: String::new(),
        org_id: 1,
        name: name.to_string(),
        interval: 10,
        value,
        unit: "ms".to_string(),
        time,
        mtype: Mtype::Gauge,
        tags: vec!["host=web01".to_string()],
    };
    md.set_id();
    md
}

fn pipeline(config: WritePathConfig) -> (DefaultHandler, Arc<MemoryStore>, Arc<MemoryIndex>) {
    let store = Arc::new(MemoryStore::new(config));
    let index = Arc::new(MemoryIndex::new());
    let handler = DefaultHandler::new(store.clone(), index.clone(), "test");
    (handler, store, index)
}

#[test]
fn test_process_stores_point_and_indexes_it() {
    let (handler, store, index) = pipeline(WritePathConfig::default());
    let md = point("app.requests", 60, 4.5);

    handler.process(Some(md.clone()), 3);

    assert_eq!(handler.metrics_received().peek(), 1);
    assert_eq!(handler.metric_invalid().peek(), 0);

    let series = store.get(&md.id).expect("series should exist");
    assert_eq!(series.points(), vec![(60, 4.5)]);

    let nodes = index.find(1, "app.requests", 0).unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].defs[0].id, md.id);
    assert_eq!(nodes[0].defs[0].partition, 3);
}

#[test]
fn test_process_none_is_a_noop() {
    let (handler, store, _) = pipeline(WritePathConfig::default());
    handler.process(None, 0);
    assert_eq!(handler.metrics_received().peek(), 0);
    assert!(store.is_empty());
}

#[test]
fn test_invalid_point_is_counted_and_dropped() {
    let (handler, store, index) = pipeline(WritePathConfig::default());
    let mut md = point("app.requests", 60, 1.0);
    md.name.clear();

    handler.process(Some(md), 0);

    assert_eq!(handler.metrics_received().peek(), 1);
    assert_eq!(handler.metric_invalid().peek(), 1);
    assert!(store.is_empty());
    assert!(index.is_empty());
}

#[test]
fn test_zero_time_point_is_counted_and_dropped() {
    let (handler, store, index) = pipeline(WritePathConfig::default());
    handler.process(Some(point("app.requests", 0, 1.0)), 0);

    assert_eq!(handler.metric_invalid().peek(), 1);
    assert!(store.is_empty());
    assert!(index.is_empty());
}

#[test]
fn test_successive_points_extend_the_series() {
    let (handler, store, _) = pipeline(WritePathConfig::default());
    let first = point("app.requests", 10, 1.0);
    handler.process(Some(first.clone()), 0);
    handler.process(Some(point("app.requests", 20, 2.0)), 0);
    handler.process(Some(point("app.requests", 30, 3.0)), 0);

    let series = store.get(&first.id).unwrap();
    assert_eq!(series.points(), vec![(10, 1.0), (20, 2.0), (30, 3.0)]);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_lag_is_recorded() {
    let (handler, _, _) = pipeline(WritePathConfig::default());
    handler.process(Some(point("app.requests", 60, 1.0)), 0);
    // a point stamped in 1970 arrives decades late
    let (min, _) = handler.lag().min_max().expect("lag should be recorded");
    assert!(min > 0);
}

#[test]
fn test_rollups_derived_through_configured_rule() {
    let config = WritePathConfig {
        chunk_span: 600,
        rollups: vec![RollupRule {
            name: "app".to_string(),
            pattern: "app.*".to_string(),
            spans: vec![60],
            methods: vec![AggMethod::Avg, AggMethod::Sum],
        }],
    };
    let (handler, store, _) = pipeline(config);

    let first = point("app.requests", 30, 4.0);
    handler.process(Some(first.clone()), 0);
    handler.process(Some(point("app.requests", 60, 6.0)), 0);

    let raw = store.get(&first.id).unwrap();
    let sum = raw.rollup(AggFunc::Sum, 60).expect("sum rollup configured");
    assert_eq!(sum.points(), vec![(60, 10.0)]);
    let cnt = raw.rollup(AggFunc::Cnt, 60).expect("avg needs a cnt rollup");
    assert_eq!(cnt.points(), vec![(60, 2.0)]);

    // names outside the rule pattern are not aggregated
    let other = point("web.requests", 30, 1.0);
    handler.process(Some(other.clone()), 0);
    assert!(store.get(&other.id).unwrap().rollup(AggFunc::Sum, 60).is_none());
}
