//! Vector Index Adapter
//!
//! Semantic similarity search over schema metadata. The default
//! implementation keeps one embedded document per table and per column and
//! ranks them by cosine similarity against the question embedding.

use crate::adapters::embedding::{cosine_similarity, Embedding, EmbeddingClient};
use crate::catalog::{SchemaCatalog, Table};
use crate::error::Result;
use async_trait::async_trait;
use tracing::info;

/// A catalog entry surfaced by similarity search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaEntity {
    Table(String),
    Column { table: String, column: String },
}

impl SchemaEntity {
    /// The table this entity rolls up to during fusion.
    pub fn table_name(&self) -> &str {
        match self {
            SchemaEntity::Table(name) => name,
            SchemaEntity::Column { table, .. } => table,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoredEntity {
    pub entity: SchemaEntity,
    /// Similarity in [0, 1].
    pub score: f32,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn search(&self, text: &str, k: usize) -> Result<Vec<ScoredEntity>>;
}

struct IndexedDocument {
    entity: SchemaEntity,
    embedding: Embedding,
}

/// In-memory cosine index over the catalog, built once at startup.
pub struct InMemoryVectorIndex {
    documents: Vec<IndexedDocument>,
    embedder: EmbeddingClient,
}

impl InMemoryVectorIndex {
    /// Embed every table and column of the catalog.
    pub async fn index_catalog(catalog: &SchemaCatalog, embedder: EmbeddingClient) -> Result<Self> {
        let mut documents = Vec::new();
        for table in catalog.tables() {
            let embedding = embedder.embed_text(&table_to_text(table)).await?;
            documents.push(IndexedDocument {
                entity: SchemaEntity::Table(table.name.clone()),
                embedding,
            });
            for column in &table.columns {
                let text = column_to_text(table, &column.name);
                let embedding = embedder.embed_text(&text).await?;
                documents.push(IndexedDocument {
                    entity: SchemaEntity::Column {
                        table: table.name.clone(),
                        column: column.name.clone(),
                    },
                    embedding,
                });
            }
        }
        info!(documents = documents.len(), "vector index built");
        Ok(Self {
            documents,
            embedder,
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn search(&self, text: &str, k: usize) -> Result<Vec<ScoredEntity>> {
        if self.documents.is_empty() {
            return Ok(Vec::new());
        }
        let query = self.embedder.embed_text(text).await?;
        let mut results: Vec<ScoredEntity> = self
            .documents
            .iter()
            .map(|doc| ScoredEntity {
                entity: doc.entity.clone(),
                score: cosine_similarity(&query, &doc.embedding).clamp(0.0, 1.0),
            })
            .collect();
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);
        Ok(results)
    }
}

/// Searchable text for a table: name, description, column names.
fn table_to_text(table: &Table) -> String {
    let mut parts = vec![format!("Table: {}", table.name)];
    if !table.description.is_empty() {
        parts.push(format!("Description: {}", table.description));
    }
    let column_names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    parts.push(format!("Columns: {}", column_names.join(", ")));
    parts.join(". ")
}

/// Searchable text for a column: name, type, description, FK hint.
fn column_to_text(table: &Table, column_name: &str) -> String {
    let mut parts = vec![format!("Column: {}.{}", table.name, column_name)];
    if let Some(column) = table.column(column_name) {
        parts.push(format!("Type: {}", column.data_type.as_sql()));
        if !column.description.is_empty() {
            parts.push(format!("Description: {}", column.description));
        }
    }
    for fk in &table.foreign_keys {
        for (src, dst) in fk.columns.iter().zip(fk.ref_columns.iter()) {
            if src.eq_ignore_ascii_case(column_name) {
                parts.push(format!("FK to {}.{}", fk.ref_table, dst));
            }
        }
    }
    parts.join(". ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SchemaCatalog;
    use std::time::Duration;

    fn dummy_embedder() -> EmbeddingClient {
        EmbeddingClient::new(
            "dummy-api-key".to_string(),
            "http://unused".to_string(),
            "text-embedding-3-small".to_string(),
            Duration::from_secs(1),
        )
    }

    fn small_catalog() -> SchemaCatalog {
        SchemaCatalog::from_json_str(
            r#"{
                "tables": [
                    {
                        "name": "fact_orders",
                        "description": "orders placed by customers",
                        "columns": [{"name": "crn_number", "data_type": "string"}]
                    },
                    {
                        "name": "dim_riders",
                        "description": "delivery riders",
                        "columns": [{"name": "rider_id", "data_type": "string"}]
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_index_covers_tables_and_columns() {
        let index = InMemoryVectorIndex::index_catalog(&small_catalog(), dummy_embedder())
            .await
            .unwrap();
        // 2 tables + 2 columns
        assert_eq!(index.len(), 4);
    }

    #[tokio::test]
    async fn test_search_ranks_matching_table_first() {
        let index = InMemoryVectorIndex::index_catalog(&small_catalog(), dummy_embedder())
            .await
            .unwrap();
        let results = index.search("orders placed by customers", 2).await.unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].entity.table_name(), "fact_orders");
        assert!(results[0].score >= results[results.len() - 1].score);
    }
}
