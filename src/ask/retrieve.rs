//! Tiered candidate retrieval.
//!
//! Three tiers, tried in order with explicit transition conditions:
//!
//! 1. **Semantic** — embed the question, KNN over `entries_vec` with a
//!    similarity floor, then apply the year filter. A provider or vec-index
//!    failure routes to tier 2; an empty result (before or after the year
//!    filter) routes to tier 3.
//! 2. **Filtered scan** — date-descending table scan honoring the year
//!    filter, large cap. Only reached when the semantic layer failed.
//! 3. **Relaxed scan** — same scan with a moderate cap, reached when the
//!    semantic layer worked but produced nothing usable.
//!
//! Semantic-layer failures are recovered silently (logged at warn); plain
//! table failures are store failures and fatal to the request.

use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

use crate::ask::AskError;
use crate::config::RetrievalConfig;
use crate::embedding::EmbeddingProvider;
use crate::journal::types::{entry_year, JournalEntry};
use crate::journal::{cosine_threshold_to_l2, embedding_to_bytes, l2_to_cosine, scan};

/// An entry produced by some retrieval tier. `similarity` is present only
/// for semantic-tier hits.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub entry: JournalEntry,
    pub similarity: Option<f64>,
}

/// Orchestrator outcome. An empty corpus is distinct from "nothing relevant
/// found" so callers can short-circuit to a canned answer.
#[derive(Debug)]
pub enum Retrieval {
    EmptyCorpus,
    Candidates {
        candidates: Vec<Candidate>,
        corpus_total: usize,
    },
}

#[derive(Debug, Clone, Copy)]
enum Tier {
    Semantic,
    FilteredScan,
    RelaxedScan,
}

/// Produce a bounded candidate list for the question.
pub async fn retrieve(
    db: &Arc<Mutex<Connection>>,
    embedding: &Arc<dyn EmbeddingProvider>,
    config: &RetrievalConfig,
    question: &str,
    year: Option<i32>,
) -> Result<Retrieval, AskError> {
    let corpus_total = with_store(db, scan::count_entries).await?;
    if corpus_total == 0 {
        return Ok(Retrieval::EmptyCorpus);
    }

    let mut tier = Tier::Semantic;
    let candidates = loop {
        match tier {
            Tier::Semantic => {
                match semantic_candidates(db, embedding, config, question).await {
                    Ok(hits) => {
                        let total_hits = hits.len();
                        let kept: Vec<Candidate> = match year {
                            Some(y) => hits
                                .into_iter()
                                .filter(|c| entry_year(&c.entry.date) == Some(y))
                                .collect(),
                            None => hits,
                        };
                        if kept.is_empty() {
                            tracing::debug!(
                                total_hits,
                                year = ?year,
                                "semantic tier left no usable candidates, relaxing to scan"
                            );
                            tier = Tier::RelaxedScan;
                        } else {
                            break kept;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %format!("{err:#}"), "semantic search failed, falling back to date scan");
                        tier = Tier::FilteredScan;
                    }
                }
            }
            Tier::FilteredScan => break scan_candidates(db, year, config.scan_limit).await?,
            Tier::RelaxedScan => {
                break scan_candidates(db, year, config.relaxed_scan_limit).await?
            }
        }
    };

    tracing::debug!(count = candidates.len(), corpus_total, "retrieval complete");
    Ok(Retrieval::Candidates {
        candidates,
        corpus_total,
    })
}

/// Tier 1: embed the question and run a thresholded KNN query.
///
/// Any failure here — embedding service, vec index — is a semantic-layer
/// failure, recoverable by the caller.
async fn semantic_candidates(
    db: &Arc<Mutex<Connection>>,
    embedding: &Arc<dyn EmbeddingProvider>,
    config: &RetrievalConfig,
    question: &str,
) -> anyhow::Result<Vec<Candidate>> {
    let provider = Arc::clone(embedding);
    let text = question.to_string();
    let query_vector = tokio::task::spawn_blocking(move || provider.embed(&text))
        .await
        .map_err(|e| anyhow::anyhow!("embedding task failed: {e}"))??;

    let db = Arc::clone(db);
    let threshold = config.similarity_threshold;
    let limit = config.semantic_candidates;
    tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
        vector_search(&conn, &query_vector, threshold, limit)
    })
    .await
    .map_err(|e| anyhow::anyhow!("search task failed: {e}"))?
}

/// KNN over the vec0 table, keeping hits at or above the cosine threshold.
///
/// sqlite-vec reports L2 distance; vectors are unit-length, so the cosine
/// threshold converts to a distance bound and results stay distance-ordered.
pub(crate) fn vector_search(
    conn: &Connection,
    query: &[f32],
    threshold: f64,
    limit: usize,
) -> anyhow::Result<Vec<Candidate>> {
    let max_distance = cosine_threshold_to_l2(threshold);

    let mut stmt = conn.prepare(
        "SELECT id, distance FROM entries_vec \
         WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2",
    )?;
    let hits: Vec<(String, f64)> = stmt
        .query_map(params![embedding_to_bytes(query), limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    // Ordered by distance — everything past the bound is below threshold.
    let kept: Vec<(String, f64)> = hits
        .into_iter()
        .take_while(|(_, distance)| *distance <= max_distance)
        .collect();

    let ids: Vec<&str> = kept.iter().map(|(id, _)| id.as_str()).collect();
    let mut entries = scan::fetch_by_ids(conn, &ids)?;

    let mut candidates = Vec::with_capacity(kept.len());
    for (id, distance) in &kept {
        if let Some(entry) = entries.remove(id.as_str()) {
            candidates.push(Candidate {
                entry,
                similarity: Some(l2_to_cosine(*distance)),
            });
        }
    }
    Ok(candidates)
}

/// Tiers 2 and 3: date-descending scan, honoring the year filter.
async fn scan_candidates(
    db: &Arc<Mutex<Connection>>,
    year: Option<i32>,
    limit: usize,
) -> Result<Vec<Candidate>, AskError> {
    with_store(db, move |conn| {
        let (start, end) = match year {
            Some(y) => (Some(format!("{y}-01-01")), Some(format!("{y}-12-31"))),
            None => (None, None),
        };
        let entries = scan::list_by_date_range(conn, start.as_deref(), end.as_deref(), limit)?;
        Ok(entries
            .into_iter()
            .map(|entry| Candidate {
                entry,
                similarity: None,
            })
            .collect())
    })
    .await
}

/// Run a store read on the blocking pool; failures are fatal store errors.
async fn with_store<T, F>(db: &Arc<Mutex<Connection>>, f: F) -> Result<T, AskError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> anyhow::Result<T> + Send + 'static,
{
    let db = Arc::clone(db);
    tokio::task::spawn_blocking(move || {
        let conn = db
            .lock()
            .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
        f(&conn)
    })
    .await
    .map_err(AskError::Task)?
    .map_err(AskError::Store)
}
