//! Example-Query Corpus
//!
//! Held-out evaluation records, not runtime input. The retriever is judged
//! by whether its selected tables cover each record's `tables`; the full
//! pipeline by whether generated SQL validates cleanly against the catalog.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleQuery {
    pub question: String,
    pub expected_sql: String,
    /// Tables the query must touch; retrieval must return a superset.
    pub tables: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExampleCorpus {
    pub examples: Vec<ExampleQuery>,
}

impl ExampleCorpus {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Whether `retrieved` covers every table the example requires.
    pub fn covers(example: &ExampleQuery, retrieved: &[String]) -> bool {
        example.tables.iter().all(|required| {
            retrieved
                .iter()
                .any(|table| table.eq_ignore_ascii_case(required))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_and_coverage() {
        let corpus = ExampleCorpus::from_json_str(
            r#"{
                "examples": [
                    {
                        "question": "Find last 7 days bad orders percentage",
                        "expected_sql": "SELECT 1",
                        "tables": ["fact_tracking_sessions"],
                        "difficulty": "medium"
                    }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(corpus.examples.len(), 1);
        let example = &corpus.examples[0];
        assert!(ExampleCorpus::covers(
            example,
            &["fact_tracking_sessions".to_string(), "fact_orders".to_string()]
        ));
        assert!(!ExampleCorpus::covers(example, &["fact_orders".to_string()]));
    }
}
