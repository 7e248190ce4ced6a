//! CLI entry point: answer one question against a catalog file.
//!
//! Environment: OPENAI_API_KEY (use "dummy-api-key" for offline runs),
//! OPENAI_BASE_URL, EMBEDDING_MODEL, LLM_MODEL.

use anyhow::Context;
use clap::Parser;
use sqlscout::adapters::{CatalogGraph, EmbeddingClient, InMemoryVectorIndex, LlmDrafter};
use sqlscout::{EngineConfig, GenerationStatus, QueryEngine, SchemaCatalog};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ask", about = "Generate validated SQL for a warehouse question")]
struct Args {
    /// Path to the catalog definition (JSON).
    #[arg(long)]
    catalog: String,

    /// Natural-language question.
    question: String,

    /// Override the number of tables retrieved.
    #[arg(long)]
    top_k: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let catalog = Arc::new(
        SchemaCatalog::load(&args.catalog)
            .with_context(|| format!("loading catalog from {}", args.catalog))?,
    );
    info!(tables = catalog.len(), "catalog loaded");

    let config = EngineConfig::default();
    let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_else(|_| "dummy-api-key".to_string());
    let base_url =
        std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
    let embedding_model =
        std::env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "text-embedding-3-small".to_string());
    let llm_model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

    let embedder = EmbeddingClient::new(
        api_key.clone(),
        base_url.clone(),
        embedding_model,
        config.adapter_timeout(),
    );
    let vector = Arc::new(InMemoryVectorIndex::index_catalog(&catalog, embedder).await?);
    let graph = Arc::new(CatalogGraph::new(catalog.clone()));
    let drafter = Arc::new(LlmDrafter::new(
        api_key,
        base_url,
        llm_model,
        config.adapter_timeout(),
    ));

    let engine = QueryEngine::new(catalog, vector, graph, drafter, config);

    let retrieval = engine.retrieve(&args.question, args.top_k).await?;
    println!("Retrieved tables:");
    for candidate in &retrieval.candidates {
        println!(
            "  {:<40} score {:.3}  ({:?})",
            candidate.table, candidate.score, candidate.provenance
        );
    }

    let generation = engine.generate(&args.question, &retrieval).await?;
    match generation.status {
        GenerationStatus::Accepted => {
            println!("\nSQL (accepted after {} attempt(s)):", generation.attempts);
        }
        GenerationStatus::Rejected => {
            println!(
                "\nSQL (UNVERIFIED, rejected after {} attempt(s)):",
                generation.attempts
            );
        }
    }
    println!("{}", generation.sql);
    if !generation.findings.is_empty() {
        println!("\nFindings:");
        for finding in &generation.findings {
            println!(
                "  [{:?}/{}] {}",
                finding.severity,
                finding.category.as_str(),
                finding.message
            );
        }
    }
    Ok(())
}
