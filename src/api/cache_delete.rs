//! Fan-out/collect handling of cache-delete requests.
//!
//! Deletion is best effort and eventually consistent across the cluster:
//! peer failures are counted and attributed, never retried, and never roll
//! back work already done locally or on other peers.

use super::models::{CacheDeleteRequest, CacheDeleteResponse};
use crate::cache::ChunkCache;
use crate::cluster::{ClusterNode, Membership};
use crate::idx::MetricIndex;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

const DELETE_PATH: &str = "/ccache/delete";

/// Client-facing failure of a delete request. Only malformed requests fail;
/// peer trouble is aggregated into the response instead.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "bad request: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Deletes cached series locally and, when the request asks for it, on
/// every cluster peer.
pub struct CacheDeleteCoordinator {
    index: Arc<dyn MetricIndex>,
    cache: Arc<dyn ChunkCache>,
    cluster: Arc<dyn Membership>,
}

impl CacheDeleteCoordinator {
    pub fn new(
        index: Arc<dyn MetricIndex>,
        cache: Arc<dyn ChunkCache>,
        cluster: Arc<dyn Membership>,
    ) -> Self {
        CacheDeleteCoordinator {
            index,
            cache,
            cluster,
        }
    }

    /// Handle one delete request. Blocks until every peer task has
    /// reported, so the caller always gets the complete per-peer picture.
    pub async fn delete(
        &self,
        mut req: CacheDeleteRequest,
    ) -> Result<CacheDeleteResponse, ApiError> {
        if req.patterns.is_empty() {
            return Err(ApiError::BadRequest("patterns required".to_string()));
        }
        if req.org_id == 0 {
            return Err(ApiError::BadRequest("orgId required".to_string()));
        }

        let mut res = CacheDeleteResponse::default();

        if req.propagate {
            res.peers = self.propagate(&mut req).await;
        }

        for pattern in &req.patterns {
            let nodes = self
                .index
                .find(req.org_id, pattern, 0)
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            for node in nodes {
                for def in node.defs {
                    let del = self.cache.del_metric(&def.id);
                    res.deleted_series += del.series as u32;
                    res.deleted_archives += del.archives as u32;
                }
            }
        }

        Ok(res)
    }

    /// Forward `req` to every non-local peer concurrently and collect the
    /// per-peer outcomes. The propagate flag is cleared first; we never
    /// propagate more than once, so forwarding cannot loop.
    async fn propagate(
        &self,
        req: &mut CacheDeleteRequest,
    ) -> HashMap<String, CacheDeleteResponse> {
        req.propagate = false;

        let body = match serde_json::to_vec(req) {
            Ok(body) => Bytes::from(body),
            Err(e) => {
                error!("cache delete: failed to encode request for peers: {}", e);
                return HashMap::new();
            }
        };

        let mut tasks = Vec::new();
        for peer in self.cluster.member_list() {
            if peer.is_local() {
                continue;
            }
            let body = body.clone();
            tasks.push(tokio::spawn(async move {
                let name = peer.get_name();
                let res = Self::delete_remote(peer, body).await;
                (name, res)
            }));
        }

        let mut peers = HashMap::new();
        for task in tasks {
            match task.await {
                Ok((name, res)) => {
                    peers.insert(name, res);
                }
                Err(e) => error!("cache delete: peer task failed: {}", e),
            }
        }
        peers
    }

    async fn delete_remote(peer: Arc<dyn ClusterNode>, body: Bytes) -> CacheDeleteResponse {
        debug!("cache delete: calling {}{}", peer.get_name(), DELETE_PATH);

        let mut res = CacheDeleteResponse::default();
        match peer.post("cacheDeleteRemote", DELETE_PATH, body).await {
            Ok(buf) => match serde_json::from_slice(&buf) {
                Ok(decoded) => res = decoded,
                Err(e) => {
                    error!(
                        "cache delete: bad response body from {}: {}",
                        peer.get_name(),
                        e
                    );
                    res.errors += 1;
                }
            },
            Err(e) => {
                error!("cache delete: error querying {}: {}", peer.get_name(), e);
                res.errors += 1;
            }
        }
        res
    }
}
