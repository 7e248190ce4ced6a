//! SQL Drafting Collaborator
//!
//! Turns a question plus retrieved schema context into a candidate SQL
//! string via a chat-completions model. Validation findings from a failed
//! attempt are folded into the next prompt so the model targets the specific
//! defect instead of regenerating blindly.

use crate::error::{Result, ScoutError};
use crate::validator::ValidationFinding;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are an expert SQL generator. Given the following database schema \
context and a user query, generate a syntactically correct SQL query that answers the user's \
question. Only output the SQL query, with no explanation or preamble.";

#[async_trait]
pub trait SqlDrafter: Send + Sync {
    async fn draft(
        &self,
        question: &str,
        schema_context: &str,
        prior_findings: &[ValidationFinding],
    ) -> Result<String>;
}

pub struct LlmDrafter {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl LlmDrafter {
    pub fn new(api_key: String, base_url: String, model: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            api_key,
            base_url,
            model,
            client,
        }
    }

    fn build_user_prompt(
        question: &str,
        schema_context: &str,
        prior_findings: &[ValidationFinding],
    ) -> String {
        let mut parts = vec![format!(
            "Schema Context:\n{}\n\nUser Query: {}",
            schema_context, question
        )];
        if !prior_findings.is_empty() {
            parts.push(
                "\nYour previous SQL failed validation with the following findings:".to_string(),
            );
            for finding in prior_findings {
                parts.push(format!("- [{}] {}", finding.category.as_str(), finding.message));
            }
            parts.push(
                "Regenerate the SQL fixing these specific problems. Use only tables and columns \
                 from the schema context, and join tables on their declared key columns."
                    .to_string(),
            );
        }
        parts.push("\nSQL Query:".to_string());
        parts.join("\n")
    }

    async fn call_llm(&self, user_prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_prompt}
            ],
            "temperature": 0.0,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ScoutError::Drafting(format!("LLM call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ScoutError::Drafting(format!(
                "LLM API error ({}): {}",
                status, error_text
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ScoutError::Drafting(format!("Failed to parse LLM response: {}", e)))?;

        response_json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ScoutError::Drafting("No completion in LLM response".to_string()))
    }
}

#[async_trait]
impl SqlDrafter for LlmDrafter {
    async fn draft(
        &self,
        question: &str,
        schema_context: &str,
        prior_findings: &[ValidationFinding],
    ) -> Result<String> {
        let prompt = Self::build_user_prompt(question, schema_context, prior_findings);
        debug!(attempt_has_feedback = !prior_findings.is_empty(), "drafting SQL");
        let raw = self.call_llm(&prompt).await?;
        let sql = clean_sql_response(&raw);
        if sql.is_empty() {
            return Err(ScoutError::Drafting("LLM returned empty SQL".to_string()));
        }
        Ok(sql)
    }
}

/// Strip markdown fences, stray prefixes and JSON wrappers the model may
/// emit around the statement.
pub fn clean_sql_response(raw: &str) -> String {
    let cleaned = raw
        .trim()
        .trim_start_matches("```sql")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
        .trim_start_matches("SQL:")
        .trim();

    if cleaned.starts_with('{') && cleaned.contains("\"sql\"") {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(cleaned) {
            if let Some(sql) = value.get("sql").and_then(|v| v.as_str()) {
                return sql.trim().to_string();
            }
        }
    }
    cleaned.to_string()
}
