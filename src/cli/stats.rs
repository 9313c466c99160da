use anyhow::Result;

use crate::config::MemoirConfig;
use crate::journal::stats;

/// Print corpus statistics to the terminal.
pub fn stats(config: &MemoirConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path, config.openai.dimensions)?;

    let stats = stats::corpus_stats(&conn, Some(&db_path))?;

    println!("Entries:   {}", stats.total_entries);
    println!("Embedded:  {}", stats.embedded_entries);
    if stats.embedded_entries < stats.total_entries {
        println!(
            "           {} entries are missing vectors — run `memoir re-embed`",
            stats.total_entries - stats.embedded_entries
        );
    }

    if let (Some(oldest), Some(newest)) = (&stats.oldest_entry, &stats.newest_entry) {
        println!("Range:     {oldest} — {newest}");
    }

    if !stats.by_year.is_empty() {
        println!("By year:");
        for (year, count) in &stats.by_year {
            println!("  {year}: {count}");
        }
    }

    println!("DB size:   {} bytes", stats.db_size_bytes);
    Ok(())
}
