//! The question-answering pipeline.
//!
//! question → year extraction ([`query`]) → tiered retrieval ([`retrieve`])
//! → token-budgeted selection ([`budget`]) → prompt assembly ([`prompt`]) →
//! completion. Either a complete answer comes back, or a categorized
//! [`AskError`] — never a partial result.

pub mod budget;
pub mod prompt;
pub mod query;
pub mod retrieve;

use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::completion::CompletionProvider;
use crate::config::MemoirConfig;
use crate::embedding::EmbeddingProvider;
use retrieve::Retrieval;

/// Error taxonomy of the pipeline. The HTTP layer maps categories to status
/// codes, so "my data is unavailable" stays distinguishable from "the
/// reasoning step failed".
#[derive(Debug, thiserror::Error)]
pub enum AskError {
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error("journal store query failed: {0:#}")]
    Store(anyhow::Error),
    #[error("answer generation failed: {0:#}")]
    Completion(anyhow::Error),
    #[error("internal task failed: {0}")]
    Task(tokio::task::JoinError),
}

/// Identifying fields of one selected entry, for display and audit.
#[derive(Debug, Serialize)]
pub struct EntryRef {
    pub id: String,
    pub date: String,
    pub mit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

/// The pipeline's response: the answer plus an auditable account of what
/// was included versus omitted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub answer: String,
    /// Total corpus size, independent of any filtering.
    pub entries_count: usize,
    /// Number of entries actually placed in the prompt.
    pub entries_analyzed: usize,
    /// Candidate counts per calendar year.
    pub year_stats: BTreeMap<i32, usize>,
    /// Selected entries' identifying fields.
    pub entries: Vec<EntryRef>,
}

impl AskResponse {
    fn empty_corpus() -> Self {
        Self {
            answer: prompt::EMPTY_CORPUS_ANSWER.to_string(),
            entries_count: 0,
            entries_analyzed: 0,
            year_stats: BTreeMap::new(),
            entries: Vec::new(),
        }
    }
}

/// Run the full pipeline for one question.
pub async fn ask(
    db: &Arc<Mutex<Connection>>,
    embedding: &Arc<dyn EmbeddingProvider>,
    completion: &Arc<dyn CompletionProvider>,
    config: &MemoirConfig,
    question: &str,
) -> Result<AskResponse, AskError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AskError::EmptyQuestion);
    }

    let year = query::extract_year(question);
    tracing::info!(question_len = question.len(), year = ?year, "ask received");

    let (candidates, corpus_total) =
        match retrieve::retrieve(db, embedding, &config.retrieval, question, year).await? {
            Retrieval::EmptyCorpus => {
                tracing::info!("corpus is empty, returning canned answer");
                return Ok(AskResponse::empty_corpus());
            }
            Retrieval::Candidates {
                candidates,
                corpus_total,
            } => (candidates, corpus_total),
        };

    let selection = budget::select_context(candidates, &config.retrieval);
    tracing::debug!(
        candidates = selection.candidate_count,
        selected = selection.selected.len(),
        token_estimate = selection.token_estimate,
        "context selected"
    );

    let prompt_text = prompt::build_prompt(question, year, corpus_total, &selection);

    let provider = Arc::clone(completion);
    let answer = tokio::task::spawn_blocking(move || provider.complete(&prompt_text))
        .await
        .map_err(AskError::Task)?
        .map_err(AskError::Completion)?;

    let entries = selection
        .selected
        .iter()
        .map(|candidate| EntryRef {
            id: candidate.entry.id.clone(),
            date: candidate.entry.date.clone(),
            mit: candidate.entry.mit.clone(),
            similarity: candidate.similarity,
        })
        .collect();

    Ok(AskResponse {
        answer,
        entries_count: corpus_total,
        entries_analyzed: selection.selected.len(),
        year_stats: selection.year_counts,
        entries,
    })
}
