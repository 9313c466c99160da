//! Canonicalization of heterogeneous persisted entry fields.
//!
//! `gratitude` has been persisted in three shapes over the store's life:
//! an array of strings, a bare string, and a keyed object (numeric-looking
//! keys meaning array-like origin). Everything is resolved to an ordered
//! `Vec<String>` here, once, at the read boundary — nothing downstream sees
//! the raw shapes. Malformed data degrades to empty with a warning; it never
//! aborts entry processing.

use serde_json::Value;

use crate::journal::types::{JournalEntry, Notes};

/// Flatten a persisted gratitude value into an ordered list of items.
///
/// - array → string elements in order (non-strings are skipped)
/// - string → one-element list
/// - object with all-numeric keys → values in numeric key order
/// - object with other keys → `key: value` entries in key order
/// - null / anything else → empty
pub fn normalize_gratitude(entry_id: &str, value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                other => {
                    tracing::warn!(entry = %entry_id, ?other, "non-string gratitude item skipped");
                    None
                }
            })
            .collect(),
        Value::String(s) => {
            if s.is_empty() {
                Vec::new()
            } else {
                vec![s.clone()]
            }
        }
        Value::Object(map) => {
            let numeric_keys: Option<Vec<(u64, &Value)>> = map
                .iter()
                .map(|(k, v)| k.parse::<u64>().ok().map(|n| (n, v)))
                .collect();

            match numeric_keys {
                // Array-like origin: restore the original element order.
                Some(mut indexed) => {
                    indexed.sort_by_key(|(n, _)| *n);
                    indexed
                        .into_iter()
                        .filter_map(|(_, v)| v.as_str().map(str::to_string))
                        .collect()
                }
                None => map
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| format!("{k}: {s}")))
                    .collect(),
            }
        }
        other => {
            tracing::warn!(entry = %entry_id, ?other, "unrecognized gratitude shape, treating as empty");
            Vec::new()
        }
    }
}

/// Parse a serialized notes column. Malformed JSON degrades to absent.
pub fn parse_notes(entry_id: &str, raw: Option<&str>) -> Option<Notes> {
    let raw = raw?;
    match serde_json::from_str::<Notes>(raw) {
        Ok(notes) if notes.is_empty() => None,
        Ok(notes) => Some(notes),
        Err(err) => {
            tracing::warn!(entry = %entry_id, error = %err, "malformed notes, treating as absent");
            None
        }
    }
}

/// Render notes as `Dimension: value/10` pairs, or `none`.
pub fn notes_text(notes: Option<&Notes>) -> String {
    let rated = notes.map(Notes::rated_dimensions).unwrap_or_default();
    if rated.is_empty() {
        return "none".to_string();
    }
    rated
        .into_iter()
        .map(|(label, value)| format!("{label}: {value}/10"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render gratitude items as a comma-joined list, or `none`.
pub fn gratitude_text(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// The combined text an entry is embedded from: MIT, content, prompt, and
/// flattened gratitude, space-joined. Must stay stable — vectors are only
/// comparable while every entry was embedded from the same recipe.
pub fn embed_text(entry: &JournalEntry) -> String {
    combined_text(
        &entry.mit,
        &entry.content,
        entry.prompt.as_deref(),
        &entry.gratitude,
    )
}

/// Same recipe for a not-yet-stored entry.
pub fn combined_text(
    mit: &str,
    content: &str,
    prompt: Option<&str>,
    gratitude: &[String],
) -> String {
    let mut text = format!("{mit} {content}");
    if let Some(prompt) = prompt {
        text.push(' ');
        text.push_str(prompt);
    }
    if !gratitude.is_empty() {
        text.push(' ');
        text.push_str(&gratitude.join(" "));
    }
    text
}
