//! Wire models for the cache-delete operation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request to evict cached series matching `patterns` for one org.
///
/// `propagate` asks the receiving node to forward the request to its peers.
/// A forwarding node clears the flag first, which bounds the fan-out to
/// exactly one hop regardless of topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDeleteRequest {
    pub patterns: Vec<String>,
    pub org_id: u32,
    #[serde(default)]
    pub propagate: bool,
}

/// Per-node outcome of a cache delete. `peers` nests the responses of the
/// members a propagating node forwarded to; it is empty on a non-propagating
/// node and omitted from the wire in that case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDeleteResponse {
    pub errors: u32,
    pub deleted_series: u32,
    pub deleted_archives: u32,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub peers: HashMap<String, CacheDeleteResponse>,
}
