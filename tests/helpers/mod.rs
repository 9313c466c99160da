#![allow(dead_code)]

use anyhow::Result;
use memoir::completion::CompletionProvider;
use memoir::config::MemoirConfig;
use memoir::db;
use memoir::embedding::EmbeddingProvider;
use memoir::journal::store;
use memoir::journal::types::NewEntry;
use rusqlite::Connection;
use std::sync::Mutex;

/// Small vector dimension for fast tests.
pub const DIM: usize = 8;

/// Open a fresh in-memory database with the schema applied.
pub fn test_db() -> Connection {
    db::load_sqlite_vec();
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    db::schema::init_schema(&conn, DIM).unwrap();
    conn
}

/// Config tuned for the test dimension; retrieval knobs at their defaults.
pub fn test_config() -> MemoirConfig {
    let mut config = MemoirConfig::default();
    config.openai.dimensions = DIM;
    config
}

/// Deterministic unit embedding with a spike at position `seed`.
/// Distinct seeds produce orthogonal vectors.
pub fn test_embedding(seed: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    v[seed % DIM] = 1.0;
    v
}

/// Insert an entry via the write path. Returns the entry ID.
pub fn insert_entry(
    conn: &mut Connection,
    date: &str,
    mit: &str,
    content: &str,
    embedding: &[f32],
) -> String {
    store::add_entry(
        conn,
        &NewEntry {
            date: date.into(),
            mit: mit.into(),
            content: content.into(),
            prompt: None,
            gratitude: Vec::new(),
            notes: None,
        },
        embedding,
    )
    .unwrap()
    .id
}

/// Embedding provider returning one fixed vector for every input.
pub struct FixedEmbedding {
    pub vector: Vec<f32>,
}

impl FixedEmbedding {
    pub fn new(seed: usize) -> Self {
        Self {
            vector: test_embedding(seed),
        }
    }
}

impl EmbeddingProvider for FixedEmbedding {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(self.vector.clone())
    }

    fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// Embedding provider that always fails, like an unreachable service.
pub struct FailingEmbedding;

impl EmbeddingProvider for FailingEmbedding {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        anyhow::bail!("embedding service unreachable")
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Completion provider that records every prompt and returns a canned answer.
pub struct RecordingCompletion {
    pub answer: String,
    pub prompts: Mutex<Vec<String>>,
}

impl RecordingCompletion {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl CompletionProvider for RecordingCompletion {
    fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answer.clone())
    }
}

/// Completion provider that always fails.
pub struct FailingCompletion;

impl CompletionProvider for FailingCompletion {
    fn complete(&self, _prompt: &str) -> Result<String> {
        anyhow::bail!("completion service unreachable")
    }
}
