//! Retrieval-augmented answering over a local document corpus.
//!
//! Documents are chunked into overlapping windows, embedded, and stored in
//! a SQLite-backed vector index. Queries retrieve the most similar chunks
//! and an LLM synthesizes a grounded, cited answer from them.

pub mod analyze;
pub mod answer;
pub mod chunker;
pub mod embeddings;
pub mod followup;
pub mod index;
pub mod ingest;
pub mod model_output;
pub mod monitor;
pub mod parser;
pub mod retriever;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use analyze::DocumentAnalyzer;
pub use answer::AnswerEngine;
pub use chunker::ChunkPlan;
pub use followup::FollowUpGenerator;
pub use index::EmbeddingIndex;
pub use ingest::{ingest, IngestOptions};
pub use monitor::ConnectionMonitor;
pub use retriever::Retriever;
pub use service::{CopilotService, QueryResponse};
pub use types::{
    AnalysisResult, Answer, Chunk, Complexity, FollowUpSet, IndexStats, IngestFailure,
    IngestReport, RetrievalResult, SourceDocument,
};
