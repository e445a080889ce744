//! Knowhow CLI
//!
//! Main entry point for the knowhow command-line tool.
//! Answers technical-support questions over a locally indexed corpus.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AnalyzeCommand, IngestCommand, QueryCommand, StatsCommand, StatusCommand};
use knowhow_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Knowhow CLI - retrieval-augmented answering over local documents
#[derive(Parser, Debug)]
#[command(name = "knowhow")]
#[command(about = "Retrieval-augmented answering over local documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the data directory (default: .knowhow)
    #[arg(short, long, global = true, env = "KNOWHOW_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "KNOWHOW_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (ollama, openai)
    #[arg(short, long, global = true, env = "KNOWHOW_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "KNOWHOW_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question against the indexed corpus
    Query(QueryCommand),

    /// Summarize, tag and rate an arbitrary text passage
    Analyze(AnalyzeCommand),

    /// Index documents into the knowledge base
    Ingest(IngestCommand),

    /// Show the generation backend's connection status
    Status(StatusCommand),

    /// Show index statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.data_dir,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Knowhow CLI starting");
    tracing::debug!("Data dir: {:?}", config.data_dir);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let command_name = match &cli.command {
        Commands::Query(_) => "query",
        Commands::Analyze(_) => "analyze",
        Commands::Ingest(_) => "ingest",
        Commands::Status(_) => "status",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Query(cmd) => cmd.execute(&config).await,
        Commands::Analyze(cmd) => cmd.execute(&config).await,
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Status(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
