//! Embedding Client
//!
//! Embeds schema text and questions through an OpenAI-compatible
//! `/embeddings` endpoint.

use crate::error::{Result, ScoutError};
use std::time::Duration;
use tracing::debug;

pub type Embedding = Vec<f32>;

/// Dimension of text-embedding-3-small, the default model.
const DEFAULT_DIMENSION: usize = 1536;

pub struct EmbeddingClient {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl EmbeddingClient {
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

    /// Embed arbitrary text. With the dummy key, returns a deterministic
    /// token-hash embedding so offline runs still rank by rough overlap.
    pub async fn embed_text(&self, text: &str) -> Result<Embedding> {
        if self.api_key == "dummy-api-key" {
            return Ok(hash_embedding(text));
        }

        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        debug!(model = %self.model, "embedding request");
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| unavailable(format!("Embedding API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(unavailable(format!(
                "Embedding API error ({}): {}",
                status, error_text
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| unavailable(format!("Failed to parse embedding response: {}", e)))?;

        let data = response_json
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|arr| arr.first())
            .ok_or_else(|| unavailable("No embedding data in response".to_string()))?;

        let embedding: Embedding = data
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| unavailable("No embedding vector in response".to_string()))?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();

        Ok(embedding)
    }
}

fn unavailable(message: String) -> ScoutError {
    ScoutError::AdapterUnavailable {
        adapter: "embedding".to_string(),
        message,
    }
}

/// Deterministic bag-of-tokens embedding for dummy mode. Each token lights up
/// one bucket, so texts sharing vocabulary land near each other under cosine.
fn hash_embedding(text: &str) -> Embedding {
    let mut v = vec![0.0f32; DEFAULT_DIMENSION];
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let mut h: u64 = 1469598103934665603;
        for b in token.to_lowercase().bytes() {
            h ^= b as u64;
            h = h.wrapping_mul(1099511628211);
        }
        v[(h % DEFAULT_DIMENSION as u64) as usize] += 1.0;
    }
    v
}

/// Cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 1.0);

        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_hash_embedding_is_deterministic() {
        assert_eq!(hash_embedding("order status"), hash_embedding("order status"));
        let sim = cosine_similarity(
            &hash_embedding("orders placed by users"),
            &hash_embedding("orders table"),
        );
        assert!(sim > 0.0);
    }

    #[tokio::test]
    async fn test_dummy_mode_needs_no_network() {
        let client = EmbeddingClient::new(
            "dummy-api-key".to_string(),
            "http://unused".to_string(),
            "text-embedding-3-small".to_string(),
            Duration::from_secs(1),
        );
        let embedding = client.embed_text("tracking sessions").await.unwrap();
        assert_eq!(embedding.len(), DEFAULT_DIMENSION);
    }
}
