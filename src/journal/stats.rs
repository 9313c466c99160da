use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Corpus statistics for the CLI and API layers.
#[derive(Debug, Serialize)]
pub struct CorpusStats {
    pub total_entries: u64,
    /// Entry counts keyed by calendar year.
    pub by_year: BTreeMap<i32, u64>,
    /// Rows in the vector index — fewer than `total_entries` means some
    /// entries are missing embeddings and need a re-embed run.
    pub embedded_entries: u64,
    pub db_size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_entry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_entry: Option<String>,
}

/// Compute corpus statistics.
///
/// `db_path` is used for file size calculation; pass None for in-memory
/// databases.
pub fn corpus_stats(conn: &Connection, db_path: Option<&Path>) -> Result<CorpusStats> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM journal_entries", [], |row| row.get(0))?;
    let embedded: i64 = conn.query_row("SELECT COUNT(*) FROM entries_vec", [], |row| row.get(0))?;

    let by_year = count_by_year(conn)?;

    let (oldest, newest): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(date), MAX(date) FROM journal_entries",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let db_size_bytes = db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(CorpusStats {
        total_entries: total as u64,
        by_year,
        embedded_entries: embedded as u64,
        db_size_bytes,
        oldest_entry: oldest,
        newest_entry: newest,
    })
}

/// Entry counts grouped by the calendar year of `date`.
fn count_by_year(conn: &Connection) -> Result<BTreeMap<i32, u64>> {
    let mut stmt = conn.prepare(
        "SELECT CAST(substr(date, 1, 4) AS INTEGER) AS year, COUNT(*) \
         FROM journal_entries GROUP BY year ORDER BY year",
    )?;
    let rows: Vec<(i32, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows.into_iter().map(|(y, c)| (y, c as u64)).collect())
}
