//! Cluster peer contract for fan-out RPC.
//!
//! Membership discovery and the transport live behind these traits; the
//! write path only needs to enumerate members and post to them.

use bytes::Bytes;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Failure talking to a peer. A call that times out in the transport is
/// surfaced the same way as any other transport failure.
#[derive(Debug, Clone)]
pub enum ClusterError {
    Transport(String),
}

impl fmt::Display for ClusterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterError::Transport(msg) => write!(f, "peer transport error: {}", msg),
        }
    }
}

impl std::error::Error for ClusterError {}

/// Minimal capability of one cluster member.
pub trait ClusterNode: Send + Sync {
    /// Whether this member is the node we are running on.
    fn is_local(&self) -> bool;

    fn get_name(&self) -> String;

    /// Issue a POST-style RPC against the peer. `op` names the operation
    /// for logging, `path` routes it, `body` is the encoded request; the
    /// returned bytes are the response body.
    fn post(
        &self,
        op: &str,
        path: &str,
        body: Bytes,
    ) -> BoxFuture<'static, Result<Bytes, ClusterError>>;
}

/// Read access to the current member list.
pub trait Membership: Send + Sync {
    fn member_list(&self) -> Vec<Arc<dyn ClusterNode>>;
}

/// Fixed membership, set at wiring time and swappable by whatever discovery
/// mechanism the deployment uses.
#[derive(Default)]
pub struct StaticMembership {
    nodes: RwLock<Vec<Arc<dyn ClusterNode>>>,
}

impl StaticMembership {
    pub fn new(nodes: Vec<Arc<dyn ClusterNode>>) -> Self {
        StaticMembership {
            nodes: RwLock::new(nodes),
        }
    }

    pub fn set_members(&self, nodes: Vec<Arc<dyn ClusterNode>>) {
        *self.nodes.write() = nodes;
    }
}

impl Membership for StaticMembership {
    fn member_list(&self) -> Vec<Arc<dyn ClusterNode>> {
        self.nodes.read().clone()
    }
}
