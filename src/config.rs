//! Engine configuration: retrieval weights, repair budget, adapter timeouts.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum number of tables returned per question.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Weight of the embedding-similarity score in fusion.
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,
    /// Weight of the graph-distance score in fusion.
    #[serde(default = "default_structural_weight")]
    pub structural_weight: f32,
    /// Foreign-key hop limit for graph traversal.
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,
    /// Minimum similarity for the lexical fallback to accept a name match.
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
}

fn default_top_k() -> usize {
    8
}
fn default_semantic_weight() -> f32 {
    0.7
}
fn default_structural_weight() -> f32 {
    0.3
}
fn default_max_hops() -> usize {
    2
}
fn default_fuzzy_threshold() -> f64 {
    0.85
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            semantic_weight: default_semantic_weight(),
            structural_weight: default_structural_weight(),
            max_hops: default_max_hops(),
            fuzzy_threshold: default_fuzzy_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairConfig {
    /// Hard cap on drafting attempts. The loop never exceeds it.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Accept drafts whose only findings are warnings.
    #[serde(default = "default_accept_warnings")]
    pub accept_warnings: bool,
}

fn default_max_attempts() -> usize {
    3
}
fn default_accept_warnings() -> bool {
    true
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            accept_warnings: default_accept_warnings(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub repair: RepairConfig,
    /// Per-call budget for vector, graph and drafting adapters.
    #[serde(default = "default_adapter_timeout_ms")]
    pub adapter_timeout_ms: u64,
}

fn default_adapter_timeout_ms() -> u64 {
    30_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig::default(),
            repair: RepairConfig::default(),
            adapter_timeout_ms: default_adapter_timeout_ms(),
        }
    }
}

impl EngineConfig {
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_millis(self.adapter_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.retrieval.top_k, 8);
        assert_eq!(config.retrieval.max_hops, 2);
        assert!((config.retrieval.semantic_weight - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.repair.max_attempts, 3);
        assert!(config.repair.accept_warnings);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"retrieval": {"top_k": 4}}"#).unwrap();
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.retrieval.max_hops, 2);
        assert_eq!(config.repair.max_attempts, 3);
    }
}
