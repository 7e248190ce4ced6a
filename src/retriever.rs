//! Hybrid Retriever
//!
//! Fuses semantic (embedding) similarity with structural (foreign-key graph)
//! proximity into one ranked, deduplicated set of tables for a question.
//! Semantic candidates seed the graph traversal; the two scored sets are then
//! merged by a pure function with configurable weights. Ordering is fully
//! deterministic: combined score descending, then fewer hops, then table name.

use crate::adapters::{SchemaEntity, SchemaGraph, VectorIndex};
use crate::catalog::{SchemaCatalog, Table};
use crate::config::RetrievalConfig;
use crate::error::{Result, ScoutError};
use itertools::Itertools;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Which retrieval path surfaced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Semantic,
    Structural,
    Both,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalCandidate {
    pub table: String,
    /// Combined relevance in [0, 1].
    pub score: f32,
    pub provenance: Provenance,
    /// Foreign-key hops from the semantic seed set, when reached structurally.
    pub hops: Option<usize>,
}

/// Ranked candidates plus the cloned table subset for context building.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub candidates: Vec<RetrievalCandidate>,
    pub subset: Vec<Table>,
}

pub struct HybridRetriever {
    catalog: Arc<SchemaCatalog>,
    vector: Arc<dyn VectorIndex>,
    graph: Arc<dyn SchemaGraph>,
    config: RetrievalConfig,
    adapter_timeout: Duration,
}

impl HybridRetriever {
    pub fn new(
        catalog: Arc<SchemaCatalog>,
        vector: Arc<dyn VectorIndex>,
        graph: Arc<dyn SchemaGraph>,
        config: RetrievalConfig,
        adapter_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            vector,
            graph,
            config,
            adapter_timeout,
        }
    }

    pub async fn retrieve(&self, question: &str, top_k: Option<usize>) -> Result<Retrieval> {
        let top_k = top_k.unwrap_or(self.config.top_k);

        // Semantic pass: over-fetch so column hits rolling up to the same
        // table don't starve the table list.
        let semantic = match crate::adapters::with_timeout(
            "vector-index",
            self.adapter_timeout,
            self.vector.search(question, top_k * 2),
        )
        .await
        {
            Ok(entities) => {
                // An external index may serve entities for tables the current
                // catalog no longer has; drop them like structural hits are.
                let mut tables = roll_up_to_tables(&entities);
                tables.retain(|name, _| self.catalog.contains_table(name));
                tables
            }
            Err(e) => {
                // Timeout or unavailability is recoverable here: retrieval
                // degrades to lexical seeding instead of aborting.
                warn!(error = %e, "vector index failed, falling back to lexical seeds");
                BTreeMap::new()
            }
        };

        let (semantic, lexical_fallback) = if semantic.is_empty() {
            let seeds = self.lexical_seeds(question);
            if seeds.is_empty() {
                return Err(ScoutError::NoRelevantSchema(question.to_string()));
            }
            debug!(seeds = seeds.len(), "using lexical fallback seeds");
            (seeds, true)
        } else {
            (semantic, false)
        };

        // Structural pass, seeded by the semantic tables.
        let seeds: Vec<String> = semantic.keys().cloned().collect();
        let hits = crate::adapters::with_timeout(
            "schema-graph",
            self.adapter_timeout,
            self.graph.neighbors(&seeds, self.config.max_hops),
        )
        .await?;
        let structural: BTreeMap<String, usize> = hits
            .into_iter()
            .filter(|hit| self.catalog.contains_table(&hit.table))
            .map(|hit| (hit.table, hit.hops))
            .collect();

        let mut candidates = if lexical_fallback {
            // Structural-only ranking: seed match strength plus graph
            // distance, no embedding contribution.
            fuse(&semantic, &structural, 1.0, 1.0)
                .into_iter()
                .map(|mut c| {
                    c.provenance = Provenance::Structural;
                    c.score = c.score.clamp(0.0, 1.0);
                    c
                })
                .collect()
        } else {
            fuse(
                &semantic,
                &structural,
                self.config.semantic_weight,
                self.config.structural_weight,
            )
        };

        candidates.truncate(top_k);
        self.ensure_join_partners(&mut candidates, &structural, top_k);

        if candidates.is_empty() {
            return Err(ScoutError::NoRelevantSchema(question.to_string()));
        }

        let subset: Vec<Table> = candidates
            .iter()
            .filter_map(|c| self.catalog.table(&c.table).ok().cloned())
            .collect();
        debug!(
            tables = ?candidates.iter().map(|c| c.table.as_str()).collect::<Vec<_>>(),
            "retrieved schema subset"
        );
        Ok(Retrieval {
            candidates,
            subset,
        })
    }

    /// Exact/substring and fuzzy match of question tokens against table and
    /// column names; used only when the vector index yields nothing.
    fn lexical_seeds(&self, question: &str) -> BTreeMap<String, f32> {
        let question_lower = question.to_lowercase();
        let tokens: Vec<&str> = question_lower
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|t| t.len() > 2)
            .collect();
        let mut seeds: BTreeMap<String, f32> = BTreeMap::new();
        for table in self.catalog.tables() {
            let name_lower = table.name.to_lowercase();
            let mut best: f64 = 0.0;
            if question_lower.contains(&name_lower) {
                best = 1.0;
            }
            for token in &tokens {
                if name_lower.contains(token) {
                    best = best.max(0.9);
                }
                best = best.max(strsim::jaro_winkler(token, &name_lower));
                for column in &table.columns {
                    let col_lower = column.name.to_lowercase();
                    if col_lower == *token {
                        best = best.max(0.95);
                    } else {
                        best = best.max(strsim::jaro_winkler(token, &col_lower) * 0.9);
                    }
                }
            }
            if best >= self.config.fuzzy_threshold {
                seeds.insert(table.name.clone(), best as f32);
            }
        }
        seeds
    }

    /// Join-completeness repair: a selected table's declared FK partner that
    /// the traversal reached on a primary-key join path must survive
    /// truncation, else the draft cannot express the join. Pulled-in partners
    /// are selected too, so the rule re-applies to them until the closure is
    /// stable. Lowest-ranked non-partner entries are evicted to stay within
    /// `top_k`.
    fn ensure_join_partners(
        &self,
        candidates: &mut Vec<RetrievalCandidate>,
        structural: &BTreeMap<String, usize>,
        top_k: usize,
    ) {
        let mut required: Vec<RetrievalCandidate> = Vec::new();
        let mut required_names: HashSet<String> =
            candidates.iter().map(|c| c.table.clone()).collect();
        let mut worklist: VecDeque<String> =
            candidates.iter().map(|c| c.table.clone()).collect();

        while let Some(table) = worklist.pop_front() {
            for neighbor in self.catalog.fk_neighbors(&table) {
                if required_names.contains(neighbor.table) {
                    continue;
                }
                let Some(&hops) = structural.get(neighbor.table) else {
                    continue;
                };
                if !self.catalog.is_pk_join(neighbor.edge) {
                    continue;
                }
                required_names.insert(neighbor.table.to_string());
                worklist.push_back(neighbor.table.to_string());
                required.push(RetrievalCandidate {
                    table: neighbor.table.to_string(),
                    score: (self.config.structural_weight / (1.0 + hops as f32)).clamp(0.0, 1.0),
                    provenance: Provenance::Structural,
                    hops: Some(hops),
                });
            }
        }
        if required.is_empty() {
            return;
        }

        let mut protected: HashSet<String> = required.iter().map(|c| c.table.clone()).collect();
        candidates.extend(required);

        // Tables that can key-join another selected table are kept too, so
        // eviction never reopens the gap it is closing.
        for candidate in candidates.iter() {
            let joinable = self.catalog.fk_neighbors(&candidate.table).iter().any(|n| {
                self.catalog.is_pk_join(n.edge)
                    && candidates
                        .iter()
                        .any(|c| c.table == n.table && c.table != candidate.table)
            });
            if joinable {
                protected.insert(candidate.table.clone());
            }
        }

        while candidates.len() > top_k {
            match candidates
                .iter()
                .rposition(|c| !protected.contains(&c.table))
            {
                Some(idx) => {
                    candidates.remove(idx);
                }
                None => break,
            }
        }
    }
}

/// Roll column hits up to their table, keeping the best semantic score.
fn roll_up_to_tables(entities: &[crate::adapters::ScoredEntity]) -> BTreeMap<String, f32> {
    let mut tables: BTreeMap<String, f32> = BTreeMap::new();
    for scored in entities {
        let table = match &scored.entity {
            SchemaEntity::Table(name) => name.clone(),
            SchemaEntity::Column { table, .. } => table.clone(),
        };
        let score = scored.score.clamp(0.0, 1.0);
        let entry = tables.entry(table).or_insert(score);
        if score > *entry {
            *entry = score;
        }
    }
    tables
}

/// Pure fusion of the two scored sets. A table in both contributes one entry
/// whose score is the weighted sum of both signals, never two entries.
fn fuse(
    semantic: &BTreeMap<String, f32>,
    structural: &BTreeMap<String, usize>,
    w_sem: f32,
    w_struct: f32,
) -> Vec<RetrievalCandidate> {
    let names: HashSet<&String> = semantic.keys().chain(structural.keys()).collect();
    let mut hop_of: HashMap<&String, usize> = HashMap::new();
    for (name, hops) in structural {
        hop_of.insert(name, *hops);
    }

    names
        .into_iter()
        .map(|name| {
            let sem = semantic.get(name).copied();
            let hops = hop_of.get(name).copied();
            let structural_score = hops.map(|h| 1.0 / (1.0 + h as f32));
            let provenance = match (sem.is_some(), structural_score.is_some()) {
                (true, true) => Provenance::Both,
                (true, false) => Provenance::Semantic,
                _ => Provenance::Structural,
            };
            let score = w_sem * sem.unwrap_or(0.0) + w_struct * structural_score.unwrap_or(0.0);
            RetrievalCandidate {
                table: name.clone(),
                score: score.clamp(0.0, 1.0),
                provenance,
                hops,
            }
        })
        .sorted_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| match (a.hops, b.hops) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                })
                .then_with(|| a.table.cmp(&b.table))
        })
        .collect()
}
