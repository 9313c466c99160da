//! Answer generation via an external chat-completion service.
//!
//! Same shape as [`crate::embedding`]: a synchronous trait at the seam, an
//! OpenAI-compatible HTTP implementation, a `create_provider` factory, and
//! `spawn_blocking` at async call sites.

pub mod openai;

use anyhow::Result;

/// Trait for turning an assembled prompt into an answer.
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion for the given prompt text.
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Create a completion provider from config.
pub fn create_provider(
    config: &crate::config::OpenAiConfig,
) -> Result<Box<dyn CompletionProvider>> {
    match config.provider.as_str() {
        "openai" => {
            let provider = openai::OpenAiCompletionProvider::new(config)?;
            Ok(Box::new(provider))
        }
        other => anyhow::bail!("unknown completion provider: {other}. Supported: openai"),
    }
}
