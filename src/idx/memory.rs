//! Process-local metric index.

use super::{Archive, IndexError, IndexNode, MetricDefinition, MetricIndex};
use crate::pattern::glob_match;
use crate::schema::MetricData;
use ahash::AHashMap;
use parking_lot::RwLock;

/// In-memory index: definitions grouped per org, keyed by series id.
#[derive(Default)]
pub struct MemoryIndex {
    by_org: RwLock<AHashMap<u32, AHashMap<String, MetricDefinition>>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_org.read().values().map(|defs| defs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetricIndex for MemoryIndex {
    fn add_or_update(&self, point: &MetricData, partition: i32) -> Archive {
        let mut orgs = self.by_org.write();
        let defs = orgs.entry(point.org_id).or_default();
        match defs.get_mut(&point.id) {
            Some(def) => {
                def.last_update = def.last_update.max(point.time);
                def.partition = partition;
            }
            None => {
                defs.insert(
                    point.id.clone(),
                    MetricDefinition {
                        id: point.id.clone(),
                        org_id: point.org_id,
                        name: point.name.clone(),
                        interval: point.interval,
                        mtype: point.mtype,
                        partition,
                        last_update: point.time,
                    },
                );
            }
        }
        Archive::default()
    }

    fn find(
        &self,
        org_id: u32,
        pattern: &str,
        from: u32,
    ) -> Result<Vec<IndexNode>, IndexError> {
        if pattern.is_empty() {
            return Err(IndexError::InvalidPattern(pattern.to_string()));
        }

        let orgs = self.by_org.read();
        let mut by_path: AHashMap<String, Vec<MetricDefinition>> = AHashMap::new();
        if let Some(defs) = orgs.get(&org_id) {
            for def in defs.values() {
                if from > 0 && def.last_update < from {
                    continue;
                }
                if glob_match(pattern, &def.name) {
                    by_path.entry(def.name.clone()).or_default().push(def.clone());
                }
            }
        }

        let mut nodes: Vec<IndexNode> = by_path
            .into_iter()
            .map(|(path, mut defs)| {
                defs.sort_by_key(|d| d.interval);
                IndexNode { path, defs }
            })
            .collect();
        nodes.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(nodes)
    }
}
