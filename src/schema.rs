//! Metric point schema shared by every ingestion transport.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;
use std::fmt::Write as _;

/// Metric kind as declared by the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mtype {
    Gauge,
    Count,
    Counter,
    Rate,
}

impl Mtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mtype::Gauge => "gauge",
            Mtype::Count => "count",
            Mtype::Counter => "counter",
            Mtype::Rate => "rate",
        }
    }
}

/// Why a point failed domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyName,
    ZeroInterval,
    ZeroOrgId,
    BadTag(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyName => write!(f, "metric name is empty"),
            ValidationError::ZeroInterval => write!(f, "metric interval is 0"),
            ValidationError::ZeroOrgId => write!(f, "metric org id is 0"),
            ValidationError::BadTag(tag) => write!(f, "invalid tag {:?}", tag),
        }
    }
}

impl std::error::Error for ValidationError {}

/// A single incoming metric data point.
///
/// `time` is in whole seconds. Producers set `id` via [`MetricData::set_id`]
/// so the same series maps to the same identity on every node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricData {
    pub id: String,
    pub org_id: u32,
    pub name: String,
    /// Seconds between points of this series.
    pub interval: u32,
    pub value: f64,
    pub unit: String,
    pub time: u32,
    pub mtype: Mtype,
    /// `key=value` pairs.
    pub tags: Vec<String>,
}

impl MetricData {
    /// Domain validation. Timestamp sanity is checked separately by the
    /// ingestion handler; a point that fails here can never become valid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.interval == 0 {
            return Err(ValidationError::ZeroInterval);
        }
        if self.org_id == 0 {
            return Err(ValidationError::ZeroOrgId);
        }
        for tag in &self.tags {
            if !valid_tag(tag) {
                return Err(ValidationError::BadTag(tag.clone()));
            }
        }
        Ok(())
    }

    /// Derive the series identity from the fields that define it.
    ///
    /// The id is `"<orgId>.<sha1>"` over name, unit, mtype, interval and the
    /// sorted tag set, so tag ordering does not change identity.
    pub fn set_id(&mut self) {
        let mut sorted_tags = self.tags.clone();
        sorted_tags.sort();

        let mut hasher = Sha1::new();
        hasher.update(self.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.unit.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.mtype.as_str().as_bytes());
        hasher.update([0u8]);
        hasher.update(self.interval.to_string().as_bytes());
        for tag in &sorted_tags {
            hasher.update([0u8]);
            hasher.update(tag.as_bytes());
        }

        let mut id = format!("{}.", self.org_id);
        for byte in hasher.finalize() {
            let _ = write!(id, "{:02x}", byte);
        }
        self.id = id;
    }
}

/// A tag is `key=value` with non-empty key and value and no `;` in either.
fn valid_tag(tag: &str) -> bool {
    match tag.split_once('=') {
        Some((key, value)) => {
            !key.is_empty() && !value.is_empty() && !tag.contains(';')
        }
        None => false,
    }
}
