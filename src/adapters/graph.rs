//! Graph Adapter
//!
//! Traversal over declared foreign-key relationships. Given a seed set of
//! tables, reports every table reachable within a hop limit, with the
//! minimum hop count. Edges are followed in both directions.

use crate::catalog::SchemaCatalog;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphHit {
    pub table: String,
    pub hops: usize,
}

#[async_trait]
pub trait SchemaGraph: Send + Sync {
    /// Tables reachable from any seed within `max_hops` edges. A seed is
    /// reported only when reached from a different seed, so hops >= 1 always.
    async fn neighbors(&self, seeds: &[String], max_hops: usize) -> Result<Vec<GraphHit>>;
}

/// Graph adapter backed directly by the catalog's foreign keys.
pub struct CatalogGraph {
    catalog: Arc<SchemaCatalog>,
}

impl CatalogGraph {
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self { catalog }
    }

    /// BFS from one seed, recording distance to every other table.
    fn bfs_from(&self, seed: &str, max_hops: usize, best: &mut HashMap<String, usize>) {
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        visited.insert(seed.to_string());
        queue.push_back((seed.to_string(), 0));

        while let Some((table, hops)) = queue.pop_front() {
            if hops > 0 {
                let entry = best.entry(table.clone()).or_insert(hops);
                if hops < *entry {
                    *entry = hops;
                }
            }
            if hops == max_hops {
                continue;
            }
            for neighbor in self.catalog.fk_neighbors(&table) {
                if visited.insert(neighbor.table.to_string()) {
                    queue.push_back((neighbor.table.to_string(), hops + 1));
                }
            }
        }
    }
}

#[async_trait]
impl SchemaGraph for CatalogGraph {
    async fn neighbors(&self, seeds: &[String], max_hops: usize) -> Result<Vec<GraphHit>> {
        let seed_set: HashSet<&str> = seeds.iter().map(|s| s.as_str()).collect();
        let mut best: HashMap<String, usize> = HashMap::new();
        for seed in seeds {
            // Per-seed BFS so another seed can still be reported when it sits
            // within reach of this one.
            self.bfs_from(seed, max_hops, &mut best);
        }
        // A seed only counts when some *other* seed reached it.
        let mut hits: Vec<GraphHit> = best
            .into_iter()
            .filter(|(table, hops)| *hops >= 1 || !seed_set.contains(table.as_str()))
            .map(|(table, hops)| GraphHit { table, hops })
            .collect();
        hits.sort_by(|a, b| a.hops.cmp(&b.hops).then_with(|| a.table.cmp(&b.table)));
        Ok(hits)
    }
}
