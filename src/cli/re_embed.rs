//! CLI `re-embed` command — regenerate all vectors with the current model.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

use crate::config::MemoirConfig;
use crate::embedding::EmbeddingProvider;
use crate::journal::{scan, store};

/// Re-embed every entry with the currently configured model.
pub async fn re_embed(config: &MemoirConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = crate::db::open_database(&db_path, config.openai.dimensions)
        .context("failed to open database")?;

    let total = scan::count_entries(&conn)?;
    if total == 0 {
        println!("No entries to re-embed.");
        return Ok(());
    }

    let provider: Arc<dyn EmbeddingProvider> =
        Arc::from(crate::embedding::create_provider(&config.openai)
            .context("failed to create embedding provider")?);

    println!(
        "Re-embedding {total} entries with model '{}'...",
        config.openai.embedding_model
    );

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ({eta})")
            .expect("valid template")
            .progress_chars("##-"),
    );

    let model = config.openai.embedding_model.clone();
    let pb_inner = pb.clone();
    let report = tokio::task::spawn_blocking(move || {
        store::re_embed_all(&conn, provider.as_ref(), &model, |batch| {
            pb_inner.inc(batch as u64)
        })
    })
    .await??;

    pb.finish_and_clear();
    println!(
        "Re-embedded {} of {} entries with model '{}'.",
        report.embedded, report.total, config.openai.embedding_model
    );
    Ok(())
}
