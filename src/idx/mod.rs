//! Metric index contract and the in-memory implementation.
//!
//! The write path only depends on the two operations below; name-tree
//! walking, tag queries and persistence are index internals that live
//! behind this seam.

mod memory;

pub use memory::MemoryIndex;

use crate::schema::{MetricData, Mtype};
use std::fmt;

/// Storage/aggregation schema assignment for a series, decided at index time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Archive {
    pub schema_id: u16,
    pub agg_id: u16,
}

/// A series definition held by the index.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDefinition {
    pub id: String,
    pub org_id: u32,
    pub name: String,
    pub interval: u32,
    pub mtype: Mtype,
    pub partition: i32,
    pub last_update: u32,
}

/// One node of a find result; carries the definitions sharing that path.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexNode {
    pub path: String,
    pub defs: Vec<MetricDefinition>,
}

#[derive(Debug)]
pub enum IndexError {
    InvalidPattern(String),
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::InvalidPattern(p) => write!(f, "invalid pattern {:?}", p),
        }
    }
}

impl std::error::Error for IndexError {}

/// Contract the write path needs from the metric index.
pub trait MetricIndex: Send + Sync {
    /// Resolve or create the series identity for a point, tagged with its
    /// owning partition. Returns the archive descriptor assigned to it.
    fn add_or_update(&self, point: &MetricData, partition: i32) -> Archive;

    /// Find series whose name matches a glob pattern within an org.
    /// `from` > 0 restricts results to series updated at or after it.
    fn find(&self, org_id: u32, pattern: &str, from: u32)
        -> Result<Vec<IndexNode>, IndexError>;
}
