//! Token-budgeted candidate selection.
//!
//! Two deterministic policies keyed on candidate provenance: similarity
//! ranking when every candidate came from the semantic tier, stride sampling
//! for scan-tier lists (date-ordered, so a prefix take would cluster on the
//! most recent period — the stride spreads coverage across the whole range).

use std::collections::BTreeMap;

use crate::ask::retrieve::Candidate;
use crate::config::RetrievalConfig;
use crate::journal::types::entry_year;

/// Marker appended when an entry's content was cut at the length cap.
pub const TRUNCATION_MARKER: &str = "[content truncated]";

/// The budgeter's output: the kept entries (content already truncated) plus
/// the bookkeeping the prompt and response layers surface.
#[derive(Debug)]
pub struct ContextSelection {
    /// Kept entries in final order, content truncated to the cap.
    pub selected: Vec<Candidate>,
    /// Size of the candidate list before selection.
    pub candidate_count: usize,
    /// All candidates (not just kept ones) bucketed by calendar year.
    pub year_counts: BTreeMap<i32, usize>,
    /// Rough token estimate of the kept entries' content.
    pub token_estimate: usize,
}

/// Select a subset of `candidates` that fits the configured budget.
///
/// Deterministic: the same candidate list and config always yield the same
/// selection.
pub fn select_context(candidates: Vec<Candidate>, config: &RetrievalConfig) -> ContextSelection {
    let candidate_count = candidates.len();
    let max_entries = config.max_entries();

    let mut year_counts: BTreeMap<i32, usize> = BTreeMap::new();
    for candidate in &candidates {
        if let Some(year) = entry_year(&candidate.entry.date) {
            *year_counts.entry(year).or_insert(0) += 1;
        }
    }

    let all_scored =
        !candidates.is_empty() && candidates.iter().all(|c| c.similarity.is_some());

    let mut selected: Vec<Candidate> = if all_scored {
        // Semantic provenance: maximize relevance density.
        let mut ranked = candidates;
        ranked.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(max_entries);
        ranked
    } else {
        // Scan provenance: stride-sample for coverage spread, anchored at 0.
        let stride = candidate_count.div_ceil(max_entries).max(1);
        candidates
            .into_iter()
            .step_by(stride)
            .take(max_entries)
            .collect()
    };

    let mut token_estimate = 0usize;
    for candidate in &mut selected {
        candidate.entry.content =
            truncate_content(&candidate.entry.content, config.max_content_chars);
        token_estimate += candidate.entry.content.len() / 4;
    }

    ContextSelection {
        selected,
        candidate_count,
        year_counts,
        token_estimate,
    }
}

/// Cut content at `max_chars` (on a char boundary) and append the marker.
fn truncate_content(content: &str, max_chars: usize) -> String {
    if content.len() <= max_chars {
        return content.to_string();
    }
    let end = content
        .char_indices()
        .take_while(|(i, _)| *i < max_chars)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(max_chars);
    format!("{} {TRUNCATION_MARKER}", &content[..end])
}
