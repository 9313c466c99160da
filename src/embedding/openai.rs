//! OpenAI-compatible `/embeddings` client.

use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

use crate::config::OpenAiConfig;
use crate::embedding::EmbeddingProvider;

pub struct OpenAiEmbeddingProvider {
    client: reqwest::blocking::Client,
    api_base: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbeddingProvider {
    /// Build a provider from config. The API key comes from `OPENAI_API_KEY`;
    /// the HTTP client carries a bounded timeout so a hung service surfaces
    /// as a transient error instead of stalling the request.
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let api_key =
            std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.embedding_model.clone(),
            dimensions: config.dimensions,
        })
    }

    fn request(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": inputs,
            "encoding_format": "float",
            "dimensions": self.dimensions,
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .context("embedding request failed")?
            .error_for_status()
            .context("embedding request rejected")?;

        let json: Value = response.json().context("invalid embedding response")?;
        parse_embedding_response(&json)
    }
}

impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(&[text])?
            .pop()
            .context("embedding response was empty")
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.request(texts)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Parse the `data` array, restoring request order from the `index` field.
fn parse_embedding_response(json: &Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|v| v.as_array())
        .context("embedding response missing data array")?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (fallback_index, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(fallback_index);
        let values = item
            .get("embedding")
            .and_then(|v| v.as_array())
            .context("embedding item missing embedding array")?;

        let mut vector = Vec::with_capacity(values.len());
        for value in values {
            let number = value
                .as_f64()
                .context("embedding value must be numeric")?;
            vector.push(number as f32);
        }
        indexed.push((index, vector));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, vector)| vector).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_embeddings_in_index_order() {
        let json = json!({
            "data": [
                { "index": 1, "embedding": [2.0, 3.0] },
                { "index": 0, "embedding": [0.5, 1.5] }
            ]
        });
        let parsed = parse_embedding_response(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], vec![0.5, 1.5]);
        assert_eq!(parsed[1], vec![2.0, 3.0]);
    }

    #[test]
    fn rejects_malformed_response() {
        assert!(parse_embedding_response(&json!({})).is_err());
        assert!(
            parse_embedding_response(&json!({"data": [{"index": 0}]})).is_err()
        );
        assert!(
            parse_embedding_response(&json!({"data": [{"embedding": ["x"]}]})).is_err()
        );
    }
}
