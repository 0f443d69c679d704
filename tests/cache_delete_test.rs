//! Cache Delete Integration Tests
//!
//! Exercises the fan-out delete protocol end to end:
//! - local resolution and idempotent eviction
//! - propagation flag clearing (one-hop bound)
//! - partial-failure aggregation across peers

use bytes::Bytes;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::Arc;
use tickstore::api::models::{CacheDeleteRequest, CacheDeleteResponse};
use tickstore::api::{ApiError, CacheDeleteCoordinator};
use tickstore::cache::{ChunkCache, MemoryCache};
use tickstore::cluster::{ClusterError, ClusterNode, StaticMembership};
use tickstore::idx::{MemoryIndex, MetricIndex};
use tickstore::schema::{MetricData, Mtype};

/// Peer double that records every request body it receives.
struct MockPeer {
    name: String,
    local: bool,
    /// None = fail the call at the transport level.
    body: Option<Bytes>,
    requests: Mutex<Vec<CacheDeleteRequest>>,
}

impl MockPeer {
    fn remote(name: &str, response: &CacheDeleteResponse) -> Arc<MockPeer> {
        Arc::new(MockPeer {
            name: name.to_string(),
            local: false,
            body: Some(Bytes::from(serde_json::to_vec(response).unwrap())),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn local(name: &str) -> Arc<MockPeer> {
        Arc::new(MockPeer {
            name: name.to_string(),
            local: true,
            body: Some(Bytes::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn failing(name: &str) -> Arc<MockPeer> {
        Arc::new(MockPeer {
            name: name.to_string(),
            local: false,
            body: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn garbled(name: &str) -> Arc<MockPeer> {
        Arc::new(MockPeer {
            name: name.to_string(),
            local: false,
            body: Some(Bytes::from_static(b"not json")),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<CacheDeleteRequest> {
        self.requests.lock().clone()
    }
}

impl ClusterNode for MockPeer {
    fn is_local(&self) -> bool {
        self.local
    }

    fn get_name(&self) -> String {
        self.name.clone()
    }

    fn post(
        &self,
        _op: &str,
        _path: &str,
        body: Bytes,
    ) -> BoxFuture<'static, Result<Bytes, ClusterError>> {
        let req: CacheDeleteRequest = serde_json::from_slice(&body).unwrap();
        self.requests.lock().push(req);
        let out = match &self.body {
            Some(body) => Ok(body.clone()),
            None => Err(ClusterError::Transport("connection refused".to_string())),
        };
        Box::pin(async move { out })
    }
}

fn indexed_point(name: &str) -> MetricData {
    let mut md = MetricData {
        id: String::new(),
        org_id: 1,
        name: name.to_string(),
        interval: 10,
        value: 1.0,
        unit: "ms".to_string(),
        time: 100,
        mtype: Mtype::Gauge,
        tags: Vec::new(),
    };
    md.set_id();
    md
}

/// Index with two app series; cache holds the raw archive for both plus a
/// rollup archive for the first.
fn seeded() -> (Arc<MemoryIndex>, Arc<MemoryCache>) {
    let index = Arc::new(MemoryIndex::new());
    let cache = Arc::new(MemoryCache::new());

    let requests = indexed_point("app.requests");
    let errors = indexed_point("app.errors");
    index.add_or_update(&requests, 0);
    index.add_or_update(&errors, 0);

    cache.add(&requests.id, &requests.id);
    cache.add(&requests.id, &format!("{}_sum_600", requests.id));
    cache.add(&errors.id, &errors.id);

    (index, cache)
}

fn coordinator_with_peers(peers: Vec<Arc<MockPeer>>) -> CacheDeleteCoordinator {
    let (index, cache) = seeded();
    let members = peers
        .into_iter()
        .map(|p| p as Arc<dyn ClusterNode>)
        .collect();
    CacheDeleteCoordinator::new(index, cache, Arc::new(StaticMembership::new(members)))
}

fn delete_request(propagate: bool) -> CacheDeleteRequest {
    CacheDeleteRequest {
        patterns: vec!["app.*".to_string()],
        org_id: 1,
        propagate,
    }
}

#[tokio::test]
async fn test_local_delete_counts_series_and_archives() {
    let coordinator = coordinator_with_peers(Vec::new());
    let res = coordinator.delete(delete_request(false)).await.unwrap();

    assert_eq!(res.deleted_series, 2);
    assert_eq!(res.deleted_archives, 3);
    assert_eq!(res.errors, 0);
    assert!(res.peers.is_empty());
}

#[tokio::test]
async fn test_second_delete_finds_nothing() {
    let coordinator = coordinator_with_peers(Vec::new());
    coordinator.delete(delete_request(false)).await.unwrap();

    let res = coordinator.delete(delete_request(false)).await.unwrap();
    assert_eq!(res.deleted_series, 0);
    assert_eq!(res.deleted_archives, 0);
}

#[tokio::test]
async fn test_malformed_requests_rejected_before_any_work() {
    let peer = MockPeer::remote("node2", &CacheDeleteResponse::default());
    let coordinator = coordinator_with_peers(vec![peer.clone()]);

    let no_patterns = CacheDeleteRequest {
        patterns: Vec::new(),
        org_id: 1,
        propagate: true,
    };
    assert!(matches!(
        coordinator.delete(no_patterns).await,
        Err(ApiError::BadRequest(_))
    ));

    let no_org = CacheDeleteRequest {
        patterns: vec!["app.*".to_string()],
        org_id: 0,
        propagate: true,
    };
    assert!(matches!(
        coordinator.delete(no_org).await,
        Err(ApiError::BadRequest(_))
    ));

    // rejected synchronously: no peer was contacted
    assert!(peer.requests().is_empty());

    // and nothing was deleted locally either
    let res = coordinator.delete(delete_request(false)).await.unwrap();
    assert_eq!(res.deleted_series, 2);
}

#[tokio::test]
async fn test_propagate_forwards_once_with_flag_cleared() {
    let node2 = MockPeer::remote("node2", &CacheDeleteResponse::default());
    let node3 = MockPeer::remote("node3", &CacheDeleteResponse::default());
    let local = MockPeer::local("node1");
    let coordinator =
        coordinator_with_peers(vec![local.clone(), node2.clone(), node3.clone()]);

    let res = coordinator.delete(delete_request(true)).await.unwrap();

    // the local member is skipped, remote members see exactly one request
    assert!(local.requests().is_empty());
    for peer in [&node2, &node3] {
        let seen = peer.requests();
        assert_eq!(seen.len(), 1);
        assert!(!seen[0].propagate, "forwarded request must not propagate");
        assert_eq!(seen[0].patterns, vec!["app.*".to_string()]);
        assert_eq!(seen[0].org_id, 1);
    }
    assert_eq!(res.peers.len(), 2);
    assert!(res.peers.contains_key("node2"));
    assert!(res.peers.contains_key("node3"));
}

#[tokio::test]
async fn test_no_fanout_without_propagate() {
    let node2 = MockPeer::remote("node2", &CacheDeleteResponse::default());
    let coordinator = coordinator_with_peers(vec![node2.clone()]);

    let res = coordinator.delete(delete_request(false)).await.unwrap();
    assert!(node2.requests().is_empty());
    assert!(res.peers.is_empty());
}

#[tokio::test]
async fn test_partial_failure_is_aggregated_not_escalated() {
    let ok = CacheDeleteResponse {
        deleted_series: 2,
        deleted_archives: 3,
        ..CacheDeleteResponse::default()
    };
    let node2 = MockPeer::remote("node2", &ok);
    let node3 = MockPeer::failing("node3");
    let node4 = MockPeer::remote("node4", &ok);
    let coordinator = coordinator_with_peers(vec![node2, node3, node4]);

    let res = coordinator.delete(delete_request(true)).await.unwrap();

    assert_eq!(res.peers["node2"].errors, 0);
    assert_eq!(res.peers["node2"].deleted_series, 2);
    assert_eq!(res.peers["node3"].errors, 1);
    assert_eq!(res.peers["node3"].deleted_series, 0);
    assert_eq!(res.peers["node4"].errors, 0);

    // the local deletion still happened
    assert_eq!(res.deleted_series, 2);
    assert_eq!(res.deleted_archives, 3);
}

#[tokio::test]
async fn test_undecodable_peer_response_counts_as_error() {
    let node2 = MockPeer::garbled("node2");
    let coordinator = coordinator_with_peers(vec![node2.clone()]);

    let res = coordinator.delete(delete_request(true)).await.unwrap();
    assert_eq!(node2.requests().len(), 1);
    assert_eq!(res.peers["node2"].errors, 1);
}
