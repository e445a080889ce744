//! Ingest command handler.
//!
//! Indexes documents from files or directories into the knowledge base.

use clap::Args;
use knowhow_core::{config::AppConfig, AppResult};
use knowhow_rag::{CopilotService, IngestOptions};
use std::path::PathBuf;

/// Index documents into the knowledge base
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Files or directories to ingest
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Target chunk size in characters
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Overlap between consecutive chunks in characters
    #[arg(long)]
    pub chunk_overlap: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    /// Execute the ingest command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command");
        tracing::debug!("Ingest options: {:?}", self);

        let options = IngestOptions {
            paths: self.paths.clone(),
            chunk_size: self.chunk_size.unwrap_or(config.chunking.chunk_size),
            chunk_overlap: self.chunk_overlap.unwrap_or(config.chunking.chunk_overlap),
        };

        let service = CopilotService::open(config.clone())?;
        let report = service.ingest(&options).await?;

        if self.json {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| knowhow_core::AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!(
                "Indexed {} documents ({} chunks), {} unchanged",
                report.documents_indexed, report.chunks_indexed, report.skipped
            );

            if !report.failures.is_empty() {
                println!("\nFailures:");
                for failure in &report.failures {
                    println!("  {:?}: {}", failure.path, failure.reason);
                }
            }
        }

        service.close()
    }
}
