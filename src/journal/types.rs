//! Core journal type definitions.
//!
//! Defines [`JournalEntry`] (a record as it leaves the store, gratitude and
//! notes already normalized), [`NewEntry`] (the write-path payload), and
//! [`Notes`] (the fixed set of 1–10 rating dimensions).

use serde::{Deserialize, Serialize};

/// Daily ratings on a fixed set of dimensions, each 1–10 when present.
///
/// Values are validated by the authoring side; the retrieval pipeline trusts
/// the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub productivity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanliness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creativity: Option<u8>,
}

impl Notes {
    /// Label/value pairs for the dimensions that are present, in fixed order.
    pub fn rated_dimensions(&self) -> Vec<(&'static str, u8)> {
        [
            ("Productivity", self.productivity),
            ("Exercise", self.exercise),
            ("Energy", self.energy),
            ("Cleanliness", self.cleanliness),
            ("Creativity", self.creativity),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.map(|v| (label, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rated_dimensions().is_empty()
    }
}

/// A journal entry as read from the store.
///
/// `gratitude` has already been flattened from its historical persisted
/// shapes into an ordered list; `notes` is `None` when absent or malformed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// UUID v7 (time-sortable) primary key.
    pub id: String,
    /// Calendar date, `YYYY-MM-DD`. Not unique; drives filtering and ordering.
    pub date: String,
    /// "Most important task" — short, required.
    pub mit: String,
    /// Free-form body. Unbounded; truncated before prompt inclusion.
    pub content: String,
    /// How the entry was produced (e.g. the voice prompt), if recorded.
    pub prompt: Option<String>,
    /// Gratitude items, normalized to an ordered list. Empty when absent.
    pub gratitude: Vec<String>,
    /// Daily ratings, if any.
    pub notes: Option<Notes>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

/// Payload for creating a new entry. The store assigns the ID and timestamp.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEntry {
    pub date: String,
    pub mit: String,
    pub content: String,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub gratitude: Vec<String>,
    #[serde(default)]
    pub notes: Option<Notes>,
}

/// Calendar year of an entry's date, if the date has a valid year prefix.
pub fn entry_year(date: &str) -> Option<i32> {
    date.get(..4)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rated_dimensions_keeps_fixed_order() {
        let notes = Notes {
            productivity: Some(7),
            exercise: None,
            energy: Some(5),
            cleanliness: None,
            creativity: Some(9),
        };
        assert_eq!(
            notes.rated_dimensions(),
            vec![("Productivity", 7), ("Energy", 5), ("Creativity", 9)]
        );
    }

    #[test]
    fn empty_notes() {
        assert!(Notes::default().is_empty());
    }

    #[test]
    fn entry_year_parses_prefix() {
        assert_eq!(entry_year("2024-03-01"), Some(2024));
        assert_eq!(entry_year("1999-12-31"), Some(1999));
        assert_eq!(entry_year("bad"), None);
        assert_eq!(entry_year(""), None);
    }
}
