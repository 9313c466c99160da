//! CLI `import` command — load `entry_YYYY-MM-DD.md` files into the journal.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::config::MemoirConfig;
use crate::embedding::EmbeddingProvider;
use crate::journal::types::NewEntry;
use crate::journal::{normalize, store};

static FILENAME_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Date encoded in an import filename, e.g. `entry_2024-03-01.md`.
fn date_from_filename(name: &str) -> Option<String> {
    let pattern = FILENAME_PATTERN.get_or_init(|| {
        Regex::new(r"^entry_(\d{4}-\d{2}-\d{2})\.md$").expect("filename pattern is valid")
    });
    pattern
        .captures(name)
        .map(|caps| caps[1].to_string())
}

/// Import markdown entries from a directory.
///
/// The first non-empty line becomes the MIT, the whole file the content.
/// Dates already present in the store are skipped, so re-running an import
/// is safe.
pub async fn import(config: &MemoirConfig, dir: &Path) -> Result<()> {
    let mut files: Vec<(String, std::path::PathBuf)> = Vec::new();
    for dir_entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read import directory: {}", dir.display()))?
    {
        let path = dir_entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(date) = date_from_filename(name) {
            files.push((date, path));
        }
    }
    files.sort();

    if files.is_empty() {
        println!("No entry_YYYY-MM-DD.md files found in {}.", dir.display());
        return Ok(());
    }

    let db_path = config.resolved_db_path();
    let mut conn = crate::db::open_database(&db_path, config.openai.dimensions)?;
    let provider: Arc<dyn EmbeddingProvider> =
        Arc::from(crate::embedding::create_provider(&config.openai)?);

    println!("Importing {} entries...", files.len());
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} ({eta})")
            .expect("valid template")
            .progress_chars("##-"),
    );

    let mut imported = 0u64;
    let mut skipped = 0u64;

    for (date, path) in &files {
        if store::date_exists(&conn, date)? {
            skipped += 1;
            pb.inc(1);
            continue;
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mit = content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("Unspecified task")
            .to_string();

        let entry = NewEntry {
            date: date.clone(),
            mit,
            content,
            prompt: None,
            gratitude: Vec::new(),
            notes: None,
        };

        let text = normalize::combined_text(
            &entry.mit,
            &entry.content,
            entry.prompt.as_deref(),
            &entry.gratitude,
        );
        let ep = Arc::clone(&provider);
        let vector = tokio::task::spawn_blocking(move || ep.embed(&text)).await??;

        store::add_entry(&mut conn, &entry, &vector)
            .with_context(|| format!("failed to store entry for {date}"))?;
        imported += 1;
        pb.inc(1);
    }

    pb.finish_and_clear();
    println!("Imported {imported} entries, skipped {skipped} existing dates.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_date_extraction() {
        assert_eq!(
            date_from_filename("entry_2024-03-01.md"),
            Some("2024-03-01".to_string())
        );
        assert_eq!(date_from_filename("entry_2024-03-01.txt"), None);
        assert_eq!(date_from_filename("notes.md"), None);
        assert_eq!(date_from_filename("entry_24-03-01.md"), None);
    }
}
