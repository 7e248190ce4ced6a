//! External collaborators behind async traits: the vector index, the
//! foreign-key graph and the SQL drafting model. Every call goes through
//! [`with_timeout`] so a stalled adapter surfaces as `AdapterTimeout`, never
//! as silent empty output.

pub mod drafter;
pub mod embedding;
pub mod graph;
pub mod vector;

pub use drafter::{LlmDrafter, SqlDrafter};
pub use embedding::{Embedding, EmbeddingClient};
pub use graph::{CatalogGraph, GraphHit, SchemaGraph};
pub use vector::{InMemoryVectorIndex, SchemaEntity, ScoredEntity, VectorIndex};

use crate::error::{Result, ScoutError};
use std::future::Future;
use std::time::Duration;

/// Bound an adapter call. Dropping the returned future cancels the inner
/// call, so an abandoned question never keeps an adapter busy.
pub async fn with_timeout<T>(
    adapter: &str,
    budget: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => Err(ScoutError::AdapterTimeout {
            adapter: adapter.to_string(),
            timeout_ms: budget.as_millis() as u64,
        }),
    }
}
