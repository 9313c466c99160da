//! Final instruction text for the completion service.
//!
//! Pure templating: question, corpus bookkeeping, the serialized selected
//! entries, and a fixed instruction block.

use std::fmt::Write;

use crate::ask::budget::ContextSelection;
use crate::journal::normalize;

/// Canned answer when the store holds no entries at all. The completion
/// service is never invoked in that case.
pub const EMPTY_CORPUS_ANSWER: &str =
    "Your journal has no entries yet, so there is nothing to answer from. \
     Add a first entry and ask again.";

/// Render the full prompt for the completion service.
pub fn build_prompt(
    question: &str,
    year: Option<i32>,
    corpus_total: usize,
    selection: &ContextSelection,
) -> String {
    let mut out = String::new();

    out.push_str("You are answering a question about a personal journal.\n\n");
    let _ = writeln!(out, "Question: {question}\n");

    let _ = writeln!(
        out,
        "The journal holds {corpus_total} entries in total. {} candidate entries were \
         retrieved and the {} below fit the context budget.",
        selection.candidate_count,
        selection.selected.len(),
    );

    if !selection.year_counts.is_empty() {
        let breakdown = selection
            .year_counts
            .iter()
            .map(|(year, count)| format!("{year}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "Candidates per year: {breakdown}.");
    }

    if let Some(year) = year {
        let _ = writeln!(
            out,
            "The question targets the year {year}; only entries dated in {year} were considered."
        );
    }

    if selection.selected.is_empty() {
        out.push_str("\nNo journal entries matched the question.\n");
    } else {
        out.push_str("\nEntries:\n");
        for candidate in &selection.selected {
            let entry = &candidate.entry;
            out.push('\n');
            let _ = writeln!(out, "Date: {}", human_date(&entry.date));
            let _ = writeln!(out, "MIT: {}", entry.mit);
            let _ = writeln!(out, "Content: {}", entry.content);
            if let Some(prompt) = &entry.prompt {
                let _ = writeln!(out, "Prompt: {prompt}");
            }
            let _ = writeln!(
                out,
                "Gratitude: {}",
                normalize::gratitude_text(&entry.gratitude)
            );
            let _ = writeln!(out, "Notes: {}", normalize::notes_text(entry.notes.as_ref()));
            if let Some(similarity) = candidate.similarity {
                let _ = writeln!(out, "Relevance: {:.0}%", similarity * 100.0);
            }
            out.push_str("---\n");
        }
    }

    out.push_str(
        "\nAnswer using only the journal entries above. If they do not contain enough \
         information to answer, say so explicitly. Cite entry dates when referring to \
         specific events. When asked for counts, totals, or averages, compute them from \
         the entries shown.\n",
    );

    out
}

/// `2024-03-01` → `01 March 2024`. Unparseable dates pass through unchanged.
fn human_date(date: &str) -> String {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%d %B %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ask::retrieve::Candidate;
    use crate::journal::types::{JournalEntry, Notes};
    use std::collections::BTreeMap;

    fn selection(selected: Vec<Candidate>, candidate_count: usize) -> ContextSelection {
        let mut year_counts = BTreeMap::new();
        for candidate in &selected {
            if let Some(year) = crate::journal::types::entry_year(&candidate.entry.date) {
                *year_counts.entry(year).or_insert(0) += 1;
            }
        }
        ContextSelection {
            selected,
            candidate_count,
            year_counts,
            token_estimate: 0,
        }
    }

    fn candidate(similarity: Option<f64>) -> Candidate {
        Candidate {
            entry: JournalEntry {
                id: "e1".into(),
                date: "2024-03-01".into(),
                mit: "Ship the report".into(),
                content: "Finished the draft".into(),
                prompt: Some("morning voice note".into()),
                gratitude: vec!["coffee".into(), "sun".into()],
                notes: Some(Notes {
                    productivity: Some(8),
                    ..Notes::default()
                }),
                created_at: "2024-03-01T08:00:00Z".into(),
            },
            similarity,
        }
    }

    #[test]
    fn prompt_includes_all_entry_sections() {
        let prompt = build_prompt(
            "What did I ship?",
            None,
            42,
            &selection(vec![candidate(Some(0.87))], 5),
        );

        assert!(prompt.contains("Question: What did I ship?"));
        assert!(prompt.contains("The journal holds 42 entries in total."));
        assert!(prompt.contains("Date: 01 March 2024"));
        assert!(prompt.contains("MIT: Ship the report"));
        assert!(prompt.contains("Content: Finished the draft"));
        assert!(prompt.contains("Prompt: morning voice note"));
        assert!(prompt.contains("Gratitude: coffee, sun"));
        assert!(prompt.contains("Notes: Productivity: 8/10"));
        assert!(prompt.contains("Relevance: 87%"));
        assert!(prompt.contains("Candidates per year: 2024: 1."));
    }

    #[test]
    fn scan_entries_have_no_relevance_line() {
        let prompt = build_prompt("q", None, 10, &selection(vec![candidate(None)], 1));
        assert!(!prompt.contains("Relevance:"));
    }

    #[test]
    fn year_scoped_note_appears() {
        let prompt = build_prompt("2024?", Some(2024), 10, &selection(vec![], 0));
        assert!(prompt.contains("The question targets the year 2024"));
        assert!(prompt.contains("No journal entries matched the question."));
    }

    #[test]
    fn unparseable_date_passes_through() {
        assert_eq!(human_date("not-a-date"), "not-a-date");
        assert_eq!(human_date("2024-03-01"), "01 March 2024");
    }
}
