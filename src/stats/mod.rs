//! Process-internal instruments for the write path.
//!
//! Components construct the instruments they own at startup and update them
//! on the hot path; nothing here is registered globally. Reporting transports
//! read them back through the snapshot accessors.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter.
#[derive(Debug)]
pub struct Counter {
    name: String,
    value: AtomicU64,
}

impl Counter {
    pub fn new(name: impl Into<String>) -> Self {
        Counter {
            name: name.into(),
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn peek(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Distribution summary of a recorded stream of values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeterSnapshot {
    pub min: u64,
    pub max: u64,
    pub sum: u64,
    pub count: u64,
}

/// Records a value distribution (min/max/sum/count).
#[derive(Debug)]
pub struct Meter {
    name: String,
    state: Mutex<MeterSnapshot>,
}

impl Meter {
    pub fn new(name: impl Into<String>) -> Self {
        Meter {
            name: name.into(),
            state: Mutex::new(MeterSnapshot::default()),
        }
    }

    pub fn record(&self, value: u64) {
        let mut state = self.state.lock();
        if state.count == 0 {
            state.min = value;
            state.max = value;
        } else {
            state.min = state.min.min(value);
            state.max = state.max.max(value);
        }
        state.sum += value;
        state.count += 1;
    }

    pub fn snapshot(&self) -> MeterSnapshot {
        *self.state.lock()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Tracks the lowest and highest value seen. Values may be negative
/// (e.g. ingestion lag when a producer's clock runs ahead).
#[derive(Debug)]
pub struct Range {
    name: String,
    state: Mutex<Option<(i64, i64)>>,
}

impl Range {
    pub fn new(name: impl Into<String>) -> Self {
        Range {
            name: name.into(),
            state: Mutex::new(None),
        }
    }

    pub fn value(&self, v: i64) {
        let mut state = self.state.lock();
        *state = match *state {
            None => Some((v, v)),
            Some((min, max)) => Some((min.min(v), max.max(v))),
        };
    }

    pub fn min_max(&self) -> Option<(i64, i64)> {
        *self.state.lock()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
