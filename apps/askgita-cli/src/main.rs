mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use askgita_core::config::Config;

#[derive(Parser)]
#[command(name = "askgita", about = "Ask questions about the Bhagavad Gita, answered from its verses", version)]
struct Cli {
    /// Directory holding config.toml; relative paths in it resolve from here
    #[arg(long, global = true, default_value = ".")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat (default). `/history` shows the session, `/quit` exits
    Chat,

    /// Answer a single question and exit
    Ask {
        /// The question, e.g. "What is Karma Yoga?"
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Embed the chunk store into the corpus index
    BuildIndex {
        /// Chunk store to index instead of corpus.chunks_path
        #[arg(long)]
        chunks: Option<PathBuf>,
    },

    /// Show chunk store, index and build metadata
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load_from(&cli.config_dir)?;
    let settings = config.settings()?;
    tracing::debug!(?settings, "loaded settings");

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => commands::chat(&settings).await,
        Command::Ask { question } => commands::ask(&settings, &question.join(" ")).await,
        Command::BuildIndex { chunks } => commands::build_index(&settings, chunks.as_deref()).await,
        Command::Status => commands::status(&settings).await,
    }
}
