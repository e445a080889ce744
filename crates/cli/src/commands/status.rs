//! Status command handler.
//!
//! Reports the generation backend's connection status.

use clap::Args;
use knowhow_core::{config::AppConfig, AppResult};
use knowhow_rag::CopilotService;

/// Show the generation backend's connection status
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Bypass the memoized status and probe now
    #[arg(long)]
    pub refresh: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    /// Execute the status command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing status command");

        let service = CopilotService::open(config.clone())?;
        let status = service.status(self.refresh).await;

        if self.json {
            let json = serde_json::to_string_pretty(&status)
                .map_err(|e| knowhow_core::AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("Provider: {}", status.provider);
            println!("Status: {}", status.state.as_str());
            if let Some(model) = &status.model {
                println!("Model: {}", model);
            }
            if let Some(latency) = status.latency_ms {
                println!("Latency: {}ms", latency);
            }
            if let Some(detail) = &status.detail {
                println!("Detail: {}", detail);
            }
        }

        service.close()
    }
}
