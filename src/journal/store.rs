//! Write path — validation, storage, and vector upkeep.
//!
//! [`add_entry`] inserts the entry row and its embedding vector inside one
//! transaction. [`re_embed_all`] regenerates every vector with the current
//! model, in rate-limited batches matching the embedding API's tolerance.

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::embedding::EmbeddingProvider;
use crate::journal::embedding_to_bytes;
use crate::journal::normalize;
use crate::journal::types::{JournalEntry, NewEntry};

/// Entries per embedding request during bulk re-embedding.
const RE_EMBED_BATCH: usize = 5;
/// Pause between batches so the embedding API's rate limits are respected.
const RE_EMBED_PAUSE: std::time::Duration = std::time::Duration::from_secs(1);

/// Outcome of a bulk re-embed run.
#[derive(Debug, Serialize)]
pub struct ReembedReport {
    pub total: usize,
    pub embedded: usize,
}

/// Validate and store a new entry with its embedding vector.
///
/// Both inserts run inside a transaction so the entry and its vector cannot
/// diverge.
pub fn add_entry(
    conn: &mut Connection,
    entry: &NewEntry,
    embedding: &[f32],
) -> Result<JournalEntry> {
    validate(entry)?;

    let id = uuid::Uuid::now_v7().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let gratitude_json = serde_json::to_string(&entry.gratitude)?;
    let notes_json = entry
        .notes
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO journal_entries (id, date, mit, content, prompt, gratitude, notes, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            entry.date,
            entry.mit,
            entry.content,
            entry.prompt,
            gratitude_json,
            notes_json,
            now,
        ],
    )?;
    tx.execute(
        "INSERT INTO entries_vec (id, embedding) VALUES (?1, ?2)",
        params![id, embedding_to_bytes(embedding)],
    )?;
    tx.commit()?;

    tracing::info!(id = %id, date = %entry.date, "entry stored");

    Ok(JournalEntry {
        id,
        date: entry.date.clone(),
        mit: entry.mit.clone(),
        content: entry.content.clone(),
        prompt: entry.prompt.clone(),
        gratitude: entry.gratitude.clone(),
        notes: entry.notes.clone(),
        created_at: now,
    })
}

/// Delete an entry and its vector. Returns `false` if the ID was unknown.
pub fn delete_entry(conn: &mut Connection, id: &str) -> Result<bool> {
    let tx = conn.transaction()?;
    let rows = tx.execute("DELETE FROM journal_entries WHERE id = ?1", params![id])?;
    tx.execute("DELETE FROM entries_vec WHERE id = ?1", params![id])?;
    tx.commit()?;
    Ok(rows > 0)
}

/// Whether any entry exists for the given date.
pub fn date_exists(conn: &Connection, date: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM journal_entries WHERE date = ?1",
        params![date],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Regenerate every entry's vector with the current model.
///
/// `on_batch` is invoked with the batch size after each completed batch
/// (progress reporting). Records the model identifier in `schema_meta` when
/// done so startup can detect future model changes.
pub fn re_embed_all(
    conn: &Connection,
    provider: &dyn EmbeddingProvider,
    model: &str,
    mut on_batch: impl FnMut(usize),
) -> Result<ReembedReport> {
    let entries: Vec<(String, String)> = {
        let mut stmt = conn.prepare(
            "SELECT id, date, mit, content, prompt, gratitude, notes, created_at \
             FROM journal_entries",
        )?;
        let rows = stmt
            .query_map([], super::scan::entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|entry| {
                let text = normalize::embed_text(&entry);
                (entry.id, text)
            })
            .collect()
    };

    let total = entries.len();
    let mut embedded = 0usize;

    for (batch_index, chunk) in entries.chunks(RE_EMBED_BATCH).enumerate() {
        if batch_index > 0 {
            std::thread::sleep(RE_EMBED_PAUSE);
        }

        let texts: Vec<&str> = chunk.iter().map(|(_, text)| text.as_str()).collect();
        let vectors = provider
            .embed_batch(&texts)
            .context("embedding batch failed")?;

        for ((id, _), vector) in chunk.iter().zip(vectors.iter()) {
            conn.execute("DELETE FROM entries_vec WHERE id = ?1", params![id])?;
            conn.execute(
                "INSERT INTO entries_vec (id, embedding) VALUES (?1, ?2)",
                params![id, embedding_to_bytes(vector)],
            )?;
            embedded += 1;
        }

        on_batch(chunk.len());
    }

    crate::db::schema::set_embedding_model(conn, model)?;
    tracing::info!(total, embedded, model, "re-embed complete");

    Ok(ReembedReport { total, embedded })
}

/// Check the invariants every persisted entry must satisfy.
pub fn validate(entry: &NewEntry) -> Result<()> {
    if entry.mit.trim().is_empty() {
        bail!("mit must not be empty");
    }
    if entry.content.trim().is_empty() {
        bail!("content must not be empty");
    }
    chrono::NaiveDate::parse_from_str(&entry.date, "%Y-%m-%d")
        .with_context(|| format!("invalid entry date: {:?}", entry.date))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::journal::types::Notes;

    const DIM: usize = 8;

    fn test_db() -> Connection {
        db::open_memory_database(DIM).unwrap()
    }

    fn embedding(seed: usize) -> Vec<f32> {
        let mut v = vec![0.0f32; DIM];
        v[seed % DIM] = 1.0;
        v
    }

    fn new_entry(date: &str) -> NewEntry {
        NewEntry {
            date: date.into(),
            mit: "Ship the report".into(),
            content: "Wrote the quarterly report and sent it for review".into(),
            prompt: None,
            gratitude: vec!["coffee".into(), "quiet morning".into()],
            notes: Some(Notes {
                productivity: Some(8),
                ..Notes::default()
            }),
        }
    }

    #[test]
    fn add_entry_persists_row_and_vector() {
        let mut conn = test_db();
        let stored = add_entry(&mut conn, &new_entry("2024-03-01"), &embedding(0)).unwrap();

        let date: String = conn
            .query_row(
                "SELECT date FROM journal_entries WHERE id = ?1",
                params![stored.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(date, "2024-03-01");

        let vec_id: String = conn
            .query_row(
                "SELECT id FROM entries_vec WHERE id = ?1",
                params![stored.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(vec_id, stored.id);
    }

    #[test]
    fn add_entry_round_trips_through_read_path() {
        let mut conn = test_db();
        let stored = add_entry(&mut conn, &new_entry("2024-03-01"), &embedding(0)).unwrap();

        let read = crate::journal::scan::get_entry(&conn, &stored.id)
            .unwrap()
            .unwrap();
        assert_eq!(read.gratitude, vec!["coffee", "quiet morning"]);
        assert_eq!(read.notes.unwrap().productivity, Some(8));
    }

    #[test]
    fn add_entry_rejects_missing_fields() {
        let mut conn = test_db();

        let mut entry = new_entry("2024-03-01");
        entry.mit = "  ".into();
        assert!(add_entry(&mut conn, &entry, &embedding(0)).is_err());

        let mut entry = new_entry("2024-03-01");
        entry.content.clear();
        assert!(add_entry(&mut conn, &entry, &embedding(0)).is_err());

        let entry = new_entry("not-a-date");
        assert!(add_entry(&mut conn, &entry, &embedding(0)).is_err());
    }

    #[test]
    fn delete_entry_removes_both_rows() {
        let mut conn = test_db();
        let stored = add_entry(&mut conn, &new_entry("2024-03-01"), &embedding(0)).unwrap();

        assert!(delete_entry(&mut conn, &stored.id).unwrap());

        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM entries_vec", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
        assert!(!delete_entry(&mut conn, &stored.id).unwrap());
    }

    #[test]
    fn date_exists_after_insert() {
        let mut conn = test_db();
        assert!(!date_exists(&conn, "2024-03-01").unwrap());
        add_entry(&mut conn, &new_entry("2024-03-01"), &embedding(0)).unwrap();
        assert!(date_exists(&conn, "2024-03-01").unwrap());
    }

    #[test]
    fn re_embed_all_replaces_vectors() {
        struct FixedProvider;
        impl EmbeddingProvider for FixedProvider {
            fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                let mut v = vec![0.0f32; DIM];
                v[3] = 1.0;
                Ok(v)
            }
            fn dimensions(&self) -> usize {
                DIM
            }
        }

        let mut conn = test_db();
        add_entry(&mut conn, &new_entry("2024-03-01"), &embedding(0)).unwrap();
        add_entry(&mut conn, &new_entry("2024-03-02"), &embedding(1)).unwrap();

        let mut seen = 0usize;
        let report =
            re_embed_all(&conn, &FixedProvider, "test-model", |n| seen += n).unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.embedded, 2);
        assert_eq!(seen, 2);
        assert_eq!(
            crate::db::schema::get_embedding_model(&conn).unwrap(),
            Some("test-model".to_string())
        );
    }
}
