//! Running statistics for one open aggregation window.

/// Running min/max/sum/count/last over the points of one window.
///
/// `cnt == 0` marks "no data since the last reset"; an accumulation in that
/// state holds sentinel values and must not be emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub cnt: u32,
    pub lst: f64,
}

impl Aggregation {
    pub fn new() -> Self {
        Aggregation {
            min: f64::MAX,
            max: -f64::MAX,
            sum: 0.0,
            cnt: 0,
            lst: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.min = self.min.min(val);
        self.max = self.max.max(val);
        self.sum += val;
        self.cnt += 1;
        self.lst = val;
    }

    pub fn reset(&mut self) {
        *self = Aggregation::new();
    }
}

impl Default for Aggregation {
    fn default() -> Self {
        Self::new()
    }
}
