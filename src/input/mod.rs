//! Ingestion handlers that turn validated points into index and store
//! writes. Concrete transports (kafka, carbon, ...) wrap [`DefaultHandler`]
//! and feed it one point at a time per partition.

use crate::idx::MetricIndex;
use crate::mdata::{MetricStore, SeriesSink};
use crate::schema::MetricData;
use crate::stats::{Counter, Meter, Range};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// A per-transport ingestion handler. Fire and forget: failures are counted,
/// not returned.
pub trait Handler: Send + Sync {
    fn process(&self, point: Option<MetricData>, partition: i32);
}

/// Base handler wrapped by concrete transport implementations.
///
/// Safe to call concurrently across identities; the upstream partition
/// assignment guarantees that any one identity arrives from a single caller
/// in timestamp order.
pub struct DefaultHandler {
    metrics_received: Counter,
    metric_invalid: Counter,
    msgs_age: Meter,
    pressure_idx: Counter,
    pressure_tank: Counter,
    lag: Range,

    store: Arc<dyn MetricStore>,
    index: Arc<dyn MetricIndex>,
}

impl DefaultHandler {
    pub fn new(store: Arc<dyn MetricStore>, index: Arc<dyn MetricIndex>, input: &str) -> Self {
        DefaultHandler {
            metrics_received: Counter::new(format!("input.{}.metrics_received", input)),
            metric_invalid: Counter::new(format!("input.{}.metric_invalid", input)),
            msgs_age: Meter::new(format!("input.{}.message_age", input)),
            pressure_idx: Counter::new(format!("input.{}.pressure.idx", input)),
            pressure_tank: Counter::new(format!("input.{}.pressure.tank", input)),
            lag: Range::new(format!("input.{}.lag", input)),
            store,
            index,
        }
    }

    pub fn metrics_received(&self) -> &Counter {
        &self.metrics_received
    }

    pub fn metric_invalid(&self) -> &Counter {
        &self.metric_invalid
    }

    /// Message age in ms, recorded by transports that know when a message
    /// was produced.
    pub fn msgs_age(&self) -> &Meter {
        &self.msgs_age
    }

    /// Nanoseconds spent waiting on the index; a backpressure signal.
    pub fn pressure_idx(&self) -> &Counter {
        &self.pressure_idx
    }

    /// Nanoseconds spent waiting on the store; a backpressure signal.
    pub fn pressure_tank(&self) -> &Counter {
        &self.pressure_tank
    }

    /// Ingestion lag in ms: wall-clock arrival minus the point's own time.
    pub fn lag(&self) -> &Range {
        &self.lag
    }
}

impl Handler for DefaultHandler {
    fn process(&self, point: Option<MetricData>, partition: i32) {
        let Some(point) = point else {
            return;
        };
        self.metrics_received.inc();

        if let Err(e) = point.validate() {
            self.metric_invalid.inc();
            debug!("in: invalid metric {}: {}", point.name, e);
            return;
        }
        if point.time == 0 {
            self.metric_invalid.inc();
            warn!("in: invalid metric {}: time is 0", point.id);
            return;
        }

        let pre = Instant::now();
        let archive = self.index.add_or_update(&point, partition);
        self.pressure_idx.add(pre.elapsed().as_nanos() as u64);

        let pre = Instant::now();
        let series =
            self.store
                .get_or_create(&point.id, &point.name, archive.schema_id, archive.agg_id);
        series.add(point.time, point.value);
        self.lag
            .value(unix_millis() - i64::from(point.time) * 1000);
        self.pressure_tank.add(pre.elapsed().as_nanos() as u64);
    }
}

fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
