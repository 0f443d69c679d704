//! Windowed rollup derivation from a raw point stream.
//!
//! All points with timestamps t1, t2, ... tn where tn % span == 0 aggregate
//! into one point with timestamp tn. An emitted rollup point summarizes the
//! window preceding it, and rollup timestamps are quantized to the span even
//! when the raw series has an offset.

use super::accumulator::Aggregation;
use super::series::{MemorySeries, SeriesSink};
use crate::conf::AggMethod;
use std::sync::Arc;

/// Returns `ts` if it is a boundary, or the next boundary otherwise.
///
/// A boundary is a multiple of `span`; windows are right-closed, so a
/// timestamp sitting exactly on a multiple belongs to the window it ends.
/// `ts` must be at least 1.
pub fn agg_boundary(ts: u32, span: u32) -> u32 {
    debug_assert!(ts > 0, "agg_boundary needs ts >= 1");
    ts + span - ((ts - 1) % span + 1)
}

/// A derived series written by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    Min,
    Max,
    Sum,
    Cnt,
    Lst,
}

impl AggFunc {
    /// Key suffix of the derived series, as in `"<key>_sum_<span>"`.
    pub fn suffix(&self) -> &'static str {
        match self {
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::Sum => "sum",
            AggFunc::Cnt => "cnt",
            AggFunc::Lst => "lst",
        }
    }
}

/// The sink slots an aggregator can write to. Methods that need the same
/// underlying series share one slot: `avg` fills `sum` and `cnt`, and a
/// rule asking for both `avg` and `sum` still gets a single sum series.
pub struct SinkSet<S> {
    pub min: Option<Arc<S>>,
    pub max: Option<Arc<S>>,
    pub sum: Option<Arc<S>>,
    pub cnt: Option<Arc<S>>,
    pub lst: Option<Arc<S>>,
}

impl<S> Default for SinkSet<S> {
    fn default() -> Self {
        SinkSet {
            min: None,
            max: None,
            sum: None,
            cnt: None,
            lst: None,
        }
    }
}

/// Buckets one metric's point stream into fixed windows and appends the
/// derived values into the configured rollup series.
///
/// One aggregator exists per (metric, span); it consumes points in
/// non-decreasing timestamp order, an ordering the upstream partition
/// assignment guarantees.
pub struct Aggregator<S: SeriesSink = MemorySeries> {
    key: String,
    span: u32,
    current_boundary: u32,
    agg: Aggregation,
    sinks: SinkSet<S>,
}

impl Aggregator<MemorySeries> {
    /// Build an aggregator and the rollup series `methods` require at `span`.
    pub fn new(key: &str, span: u32, methods: &[AggMethod], chunk_span: u32) -> Self {
        assert!(
            !methods.is_empty(),
            "aggregator for {} created without any rollup method",
            key
        );

        let child = |func: AggFunc| {
            let key = format!("{}_{}_{}", key, func.suffix(), span);
            Some(Arc::new(MemorySeries::new(&key, &key, 0, 0, chunk_span)))
        };

        let mut sinks = SinkSet::default();
        for method in methods {
            match method {
                AggMethod::Avg => {
                    if sinks.sum.is_none() {
                        sinks.sum = child(AggFunc::Sum);
                    }
                    if sinks.cnt.is_none() {
                        sinks.cnt = child(AggFunc::Cnt);
                    }
                }
                AggMethod::Sum => {
                    if sinks.sum.is_none() {
                        sinks.sum = child(AggFunc::Sum);
                    }
                }
                AggMethod::Lst => {
                    if sinks.lst.is_none() {
                        sinks.lst = child(AggFunc::Lst);
                    }
                }
                AggMethod::Max => {
                    if sinks.max.is_none() {
                        sinks.max = child(AggFunc::Max);
                    }
                }
                AggMethod::Min => {
                    if sinks.min.is_none() {
                        sinks.min = child(AggFunc::Min);
                    }
                }
            }
        }

        Aggregator::with_sinks(key, span, sinks)
    }
}

impl<S: SeriesSink> Aggregator<S> {
    /// Build an aggregator over pre-built sinks.
    pub fn with_sinks(key: &str, span: u32, sinks: SinkSet<S>) -> Self {
        Aggregator {
            key: key.to_string(),
            span,
            current_boundary: 0,
            agg: Aggregation::new(),
            sinks,
        }
    }

    pub fn span(&self) -> u32 {
        self.span
    }

    /// The series backing one derived function, if configured.
    pub fn aggregated(&self, func: AggFunc) -> Option<Arc<S>> {
        match func {
            AggFunc::Min => self.sinks.min.clone(),
            AggFunc::Max => self.sinks.max.clone(),
            AggFunc::Sum => self.sinks.sum.clone(),
            AggFunc::Cnt => self.sinks.cnt.clone(),
            AggFunc::Lst => self.sinks.lst.clone(),
        }
    }

    /// Consume one point. Timestamps must be non-decreasing across calls;
    /// a point for an already-closed window means the upstream ordering
    /// contract is broken and the accumulated state can no longer be
    /// trusted, so it panics rather than corrupt the rollups.
    pub fn add(&mut self, ts: u32, val: f64) {
        let boundary = agg_boundary(ts, self.span);

        if boundary == self.current_boundary {
            self.agg.add(val);
            if ts == boundary {
                self.flush();
            }
        } else if boundary > self.current_boundary {
            // store current totals as a new point in their series.
            // cnt == 0 means nothing accumulated and the sentinels are
            // invalid, so the accumulation is simply reused.
            if self.agg.cnt != 0 {
                self.flush();
            }
            self.current_boundary = boundary;
            self.agg.add(val);
        } else {
            panic!(
                "aggregator {}: boundary {} < current boundary {}; caller must feed timestamps in order",
                self.key, boundary, self.current_boundary
            );
        }
    }

    /// Append the accumulated values to each configured series at the
    /// current boundary and reset the accumulation.
    fn flush(&mut self) {
        if let Some(series) = &self.sinks.min {
            series.add(self.current_boundary, self.agg.min);
        }
        if let Some(series) = &self.sinks.max {
            series.add(self.current_boundary, self.agg.max);
        }
        if let Some(series) = &self.sinks.sum {
            series.add(self.current_boundary, self.agg.sum);
        }
        if let Some(series) = &self.sinks.cnt {
            series.add(self.current_boundary, f64::from(self.agg.cnt));
        }
        if let Some(series) = &self.sinks.lst {
            series.add(self.current_boundary, self.agg.lst);
        }
        self.agg.reset();
    }
}
