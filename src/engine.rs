//! Query Engine
//!
//! Facade over the full pipeline: question → hybrid retrieval → drafting
//! with self-repair → validated SQL. One engine instance serves many
//! concurrent questions; the immutable catalog is the only shared state.
//! Reloading a catalog means building a new engine around a fresh
//! `Arc<SchemaCatalog>`, never mutating in place.

use crate::adapters::{SchemaGraph, SqlDrafter, VectorIndex};
use crate::catalog::SchemaCatalog;
use crate::config::EngineConfig;
use crate::context::build_context;
use crate::error::Result;
use crate::repair::{Generation, SelfRepairLoop};
use crate::retriever::{HybridRetriever, Retrieval};
use crate::validator::SqlValidator;
use std::sync::Arc;
use tracing::info;

pub struct QueryEngine {
    retriever: HybridRetriever,
    repair: SelfRepairLoop,
}

impl QueryEngine {
    pub fn new(
        catalog: Arc<SchemaCatalog>,
        vector: Arc<dyn VectorIndex>,
        graph: Arc<dyn SchemaGraph>,
        drafter: Arc<dyn SqlDrafter>,
        config: EngineConfig,
    ) -> Self {
        let retriever = HybridRetriever::new(
            catalog.clone(),
            vector,
            graph,
            config.retrieval.clone(),
            config.adapter_timeout(),
        );
        let repair = SelfRepairLoop::new(
            drafter,
            SqlValidator::new(catalog),
            config.repair.clone(),
            config.adapter_timeout(),
        );
        Self { retriever, repair }
    }

    /// Select the schema subset relevant to a question.
    pub async fn retrieve(&self, question: &str, top_k: Option<usize>) -> Result<Retrieval> {
        self.retriever.retrieve(question, top_k).await
    }

    /// Draft and validate SQL against an already-retrieved subset.
    pub async fn generate(&self, question: &str, retrieval: &Retrieval) -> Result<Generation> {
        let context = build_context(&retrieval.subset);
        self.repair.run(question, &context).await
    }

    /// Full pipeline for one question.
    pub async fn ask(&self, question: &str) -> Result<Generation> {
        let retrieval = self.retrieve(question, None).await?;
        info!(
            tables = retrieval.candidates.len(),
            "schema retrieved, drafting SQL"
        );
        self.generate(question, &retrieval).await
    }
}
