//! OpenAI-compatible `/chat/completions` client.

use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

use crate::completion::CompletionProvider;
use crate::config::OpenAiConfig;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant analyzing journal entries and providing insights.";

pub struct OpenAiCompletionProvider {
    client: reqwest::blocking::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl OpenAiCompletionProvider {
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
            model: config.completion_model.clone(),
        })
    }
}

impl CompletionProvider for OpenAiCompletionProvider {
    fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "temperature": 0.7,
            "max_tokens": 1000,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .context("completion request failed")?
            .error_for_status()
            .context("completion request rejected")?;

        let json: Value = response.json().context("invalid completion response")?;
        parse_completion_response(&json)
    }
}

/// Extract the first choice's message content.
fn parse_completion_response(json: &Value) -> Result<String> {
    json.get("choices")
        .and_then(|v| v.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::to_string)
        .context("completion response missing message content")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_first_choice_content() {
        let json = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "The answer." } }
            ]
        });
        assert_eq!(parse_completion_response(&json).unwrap(), "The answer.");
    }

    #[test]
    fn rejects_empty_choices() {
        assert!(parse_completion_response(&json!({"choices": []})).is_err());
        assert!(parse_completion_response(&json!({})).is_err());
    }
}
