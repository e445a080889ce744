//! Query command handler.
//!
//! Answers a question from the indexed corpus, with citations.

use clap::Args;
use knowhow_core::{config::AppConfig, AppResult};
use knowhow_rag::CopilotService;

/// Ask a question against the indexed corpus
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// The question to ask
    pub query: String,

    /// Number of chunks to retrieve as context
    #[arg(short, long, default_value_t = 3)]
    pub k: usize,

    /// Also generate follow-up questions
    #[arg(long)]
    pub follow_ups: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl QueryCommand {
    /// Execute the query command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing query command");
        tracing::debug!("Query options: {:?}", self);

        let service = CopilotService::open(config.clone())?;
        let response = service.query(&self.query, self.k, self.follow_ups).await?;

        if self.json {
            let json = serde_json::to_string_pretty(&response)
                .map_err(|e| knowhow_core::AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", response.answer.answer);

            if !response.answer.sources.is_empty() {
                println!("\nSources:");
                for source in &response.answer.sources {
                    println!(
                        "  [{}:{}] (score {:.3}) {}",
                        source.source,
                        source.chunk_index,
                        source.score,
                        excerpt(&source.content, 120)
                    );
                }
            }

            if let Some(follow_ups) = &response.follow_ups {
                if follow_ups.count() > 0 {
                    println!("\nFollow-up questions:");
                    for (i, question) in follow_ups.questions().iter().enumerate() {
                        println!("  {}. {}", i + 1, question);
                    }
                }
            }

            tracing::debug!(
                "Answered via {} in {:.0}ms",
                response.answer.provider,
                response.answer.processing_time_ms
            );
        }

        service.close()
    }
}

/// Truncate content to an excerpt on a word boundary.
fn excerpt(text: &str, max_chars: usize) -> String {
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= max_chars {
        return flattened;
    }

    let cut: String = flattened.chars().take(max_chars).collect();
    match cut.rfind(char::is_whitespace) {
        Some(pos) => format!("{}...", &cut[..pos]),
        None => format!("{}...", cut),
    }
}
