use anyhow::Result;
use std::sync::{Arc, Mutex};

use crate::completion::CompletionProvider;
use crate::config::MemoirConfig;
use crate::embedding::EmbeddingProvider;

/// Run one question through the full pipeline from the terminal.
pub async fn ask(config: &MemoirConfig, question: &str) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path, config.openai.dimensions)?;
    let db = Arc::new(Mutex::new(conn));

    let embedding: Arc<dyn EmbeddingProvider> =
        Arc::from(crate::embedding::create_provider(&config.openai)?);
    let completion: Arc<dyn CompletionProvider> =
        Arc::from(crate::completion::create_provider(&config.openai)?);

    let response = crate::ask::ask(&db, &embedding, &completion, config, question).await?;

    println!("{}\n", response.answer);
    println!(
        "Corpus: {} entries, {} analyzed.",
        response.entries_count, response.entries_analyzed
    );

    if !response.year_stats.is_empty() {
        let breakdown = response
            .year_stats
            .iter()
            .map(|(year, count)| format!("{year}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!("Candidates per year: {breakdown}");
    }

    if !response.entries.is_empty() {
        println!("\nEntries used:");
        for entry in &response.entries {
            match entry.similarity {
                Some(similarity) => println!(
                    "  {}  {}  ({:.0}%)",
                    entry.date,
                    entry.mit,
                    similarity * 100.0
                ),
                None => println!("  {}  {}", entry.date, entry.mit),
            }
        }
    }

    Ok(())
}
