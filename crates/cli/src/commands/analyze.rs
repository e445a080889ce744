//! Analyze command handler.
//!
//! Summarizes, tags and rates the complexity of a text passage.

use clap::Args;
use knowhow_core::{config::AppConfig, AppResult};
use knowhow_rag::CopilotService;
use std::path::PathBuf;

/// Summarize, tag and rate an arbitrary text passage
#[derive(Args, Debug)]
pub struct AnalyzeCommand {
    /// The text to analyze (alternative to --file)
    pub text: Option<String>,

    /// Read the text from a file
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AnalyzeCommand {
    /// Execute the analyze command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing analyze command");

        let text = self.get_text()?;

        let service = CopilotService::open(config.clone())?;
        let result = service.analyze(&text).await?;

        if self.json {
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| knowhow_core::AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("Summary: {}", result.summary);
            if !result.tags.is_empty() {
                println!("Tags: {}", result.tags.join(", "));
            }
            println!("Complexity: {}", result.complexity.as_str());
        }

        service.close()
    }

    /// Get the passage text from the positional argument or file.
    fn get_text(&self) -> AppResult<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(path) = &self.file {
            return std::fs::read_to_string(path).map_err(knowhow_core::AppError::Io);
        }
        Err(knowhow_core::AppError::InvalidArgument(
            "Provide text to analyze, or --file".to_string(),
        ))
    }
}
