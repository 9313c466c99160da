mod ask;
mod cli;
mod completion;
mod config;
mod db;
mod embedding;
mod journal;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "memoir", version, about = "Ask your journal questions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API server
    Serve,
    /// Ask a one-shot question from the terminal
    Ask {
        /// The natural-language question
        question: String,
    },
    /// Import entry_YYYY-MM-DD.md files from a directory
    Import {
        /// Directory containing the markdown files
        dir: std::path::PathBuf,
    },
    /// Regenerate all embedding vectors with the configured model
    ReEmbed,
    /// Show corpus statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = config::MemoirConfig::load()?;

    // Log to stderr so stdout stays clean for command output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => server::serve(config).await?,
        Command::Ask { question } => cli::ask::ask(&config, &question).await?,
        Command::Import { dir } => cli::import::import(&config, &dir).await?,
        Command::ReEmbed => cli::re_embed::re_embed(&config).await?,
        Command::Stats => cli::stats::stats(&config)?,
    }

    Ok(())
}
