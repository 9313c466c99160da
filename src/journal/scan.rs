//! Read path against the `journal_entries` table.
//!
//! All reads go through one row mapper so gratitude and notes leave the
//! store normalized (see [`crate::journal::normalize`]).

use anyhow::Result;
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;

use crate::journal::normalize;
use crate::journal::types::JournalEntry;

const ENTRY_COLUMNS: &str = "id, date, mit, content, prompt, gratitude, notes, created_at";

/// Map a row (selected with [`ENTRY_COLUMNS`]) into a normalized entry.
pub(crate) fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<JournalEntry> {
    let id: String = row.get(0)?;
    let gratitude_raw: Option<String> = row.get(5)?;
    let notes_raw: Option<String> = row.get(6)?;

    let gratitude = match gratitude_raw {
        Some(raw) => match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => normalize::normalize_gratitude(&id, &value),
            Err(err) => {
                tracing::warn!(entry = %id, error = %err, "unreadable gratitude column, treating as empty");
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    Ok(JournalEntry {
        date: row.get(1)?,
        mit: row.get(2)?,
        content: row.get(3)?,
        prompt: row.get(4)?,
        gratitude,
        notes: normalize::parse_notes(&id, notes_raw.as_deref()),
        created_at: row.get(7)?,
        id,
    })
}

/// Total number of entries in the store.
pub fn count_entries(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM journal_entries", [], |row| row.get(0))?;
    Ok(count as usize)
}

/// List entries with an optional inclusive date range, newest first, capped.
pub fn list_by_date_range(
    conn: &Connection,
    start: Option<&str>,
    end: Option<&str>,
    limit: usize,
) -> Result<Vec<JournalEntry>> {
    let limit = limit as i64;
    let mut sql = format!("SELECT {ENTRY_COLUMNS} FROM journal_entries");
    let mut clauses: Vec<&str> = Vec::new();
    let mut bound: Vec<&dyn rusqlite::types::ToSql> = Vec::new();

    if let Some(ref start) = start {
        clauses.push("date >= ?");
        bound.push(start);
    }
    if let Some(ref end) = end {
        clauses.push("date <= ?");
        bound.push(end);
    }
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY date DESC LIMIT ?");
    bound.push(&limit);

    let mut stmt = conn.prepare(&sql)?;
    let entries = stmt
        .query_map(bound.as_slice(), entry_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// The latest `limit` entries, newest first.
pub fn recent_entries(conn: &Connection, limit: usize) -> Result<Vec<JournalEntry>> {
    list_by_date_range(conn, None, None, limit)
}

/// Batch-fetch entries by ID. Order of the result map is unspecified;
/// callers re-order against their own ranking.
pub fn fetch_by_ids(conn: &Connection, ids: &[&str]) -> Result<HashMap<String, JournalEntry>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE id IN ({})",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let bound: Vec<&dyn rusqlite::types::ToSql> =
        ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();

    let rows = stmt
        .query_map(bound.as_slice(), entry_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut map = HashMap::new();
    for entry in rows {
        map.insert(entry.id.clone(), entry);
    }
    Ok(map)
}

/// Fetch a single entry by ID.
pub fn get_entry(conn: &Connection, id: &str) -> Result<Option<JournalEntry>> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM journal_entries WHERE id = ?1");
    match conn.query_row(&sql, params![id], entry_from_row) {
        Ok(entry) => Ok(Some(entry)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
