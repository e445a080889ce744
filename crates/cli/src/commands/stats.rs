//! Stats command handler.
//!
//! Shows document and chunk counts for the embedding index.

use clap::Args;
use knowhow_core::{config::AppConfig, AppResult};
use knowhow_rag::CopilotService;

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    /// Execute the stats command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let service = CopilotService::open(config.clone())?;
        let stats = service.stats()?;

        if self.json {
            let json = serde_json::to_string_pretty(&stats)
                .map_err(|e| knowhow_core::AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("Documents: {}", stats.documents);
            println!("Chunks: {}", stats.chunks);
        }

        service.close()
    }
}
