use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MemoirConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub openai: OpenAiConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OpenAiConfig {
    pub provider: String,
    pub api_base: String,
    pub embedding_model: String,
    pub completion_model: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Cosine similarity floor for semantic hits.
    pub similarity_threshold: f64,
    /// How many semantic candidates to request — roomy enough that a year
    /// filter still leaves useful material.
    pub semantic_candidates: usize,
    /// Scan cap when semantic search failed outright.
    pub scan_limit: usize,
    /// Scan cap when semantic search succeeded but left nothing usable.
    pub relaxed_scan_limit: usize,
    /// Approximate token ceiling for the assembled context.
    pub token_budget: usize,
    /// Estimated token cost of one full-length entry.
    pub tokens_per_entry: usize,
    /// Content is cut at this many characters before prompt inclusion.
    pub max_content_chars: usize,
}

impl Default for MemoirConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            openai: OpenAiConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 7878,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_memoir_dir()
            .join("journal.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            api_base: "https://api.openai.com/v1".into(),
            embedding_model: "text-embedding-3-small".into(),
            completion_model: "gpt-4o".into(),
            dimensions: 1536,
            timeout_secs: 30,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            semantic_candidates: 200,
            scan_limit: 1000,
            relaxed_scan_limit: 500,
            token_budget: 6000,
            tokens_per_entry: 300,
            max_content_chars: 1200,
        }
    }
}

impl RetrievalConfig {
    /// Maximum number of entries the budgeter will keep.
    pub fn max_entries(&self) -> usize {
        (self.token_budget / self.tokens_per_entry).max(1)
    }
}

/// Returns `~/.memoir/`
pub fn default_memoir_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".memoir")
}

/// Returns the default config file path: `~/.memoir/config.toml`
pub fn default_config_path() -> PathBuf {
    default_memoir_dir().join("config.toml")
}

impl MemoirConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MemoirConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (MEMOIR_DB, MEMOIR_LOG_LEVEL).
    ///
    /// The OpenAI API key is never part of the config file — providers read
    /// `OPENAI_API_KEY` at construction time.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MEMOIR_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("MEMOIR_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MemoirConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.openai.embedding_model, "text-embedding-3-small");
        assert_eq!(config.openai.dimensions, 1536);
        assert!(config.storage.db_path.ends_with("journal.db"));
        assert_eq!(config.retrieval.max_entries(), 20);
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"
port = 9000

[storage]
db_path = "/tmp/test.db"

[retrieval]
token_budget = 3000
tokens_per_entry = 300
"#;
        let config: MemoirConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.db_path, "/tmp/test.db");
        assert_eq!(config.retrieval.max_entries(), 10);
        // defaults still apply for unset fields
        assert_eq!(config.retrieval.similarity_threshold, 0.5);
        assert_eq!(config.openai.completion_model, "gpt-4o");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = MemoirConfig::default();
        std::env::set_var("MEMOIR_DB", "/tmp/override.db");
        std::env::set_var("MEMOIR_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.server.log_level, "trace");

        // Clean up
        std::env::remove_var("MEMOIR_DB");
        std::env::remove_var("MEMOIR_LOG_LEVEL");
    }

    #[test]
    fn max_entries_never_zero() {
        let retrieval = RetrievalConfig {
            token_budget: 100,
            tokens_per_entry: 300,
            ..RetrievalConfig::default()
        };
        assert_eq!(retrieval.max_entries(), 1);
    }
}
