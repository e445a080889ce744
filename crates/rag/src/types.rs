//! RAG core type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A source document tracked by the embedding index.
///
/// Immutable once ingested; re-ingesting the same source replaces the
/// record and all of its chunks wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Source identifier (file name)
    pub source_id: String,

    /// Path the document was discovered at
    pub path: PathBuf,

    /// Content type ("markdown", "text", "notebook")
    pub content_type: String,

    /// When this document was discovered
    pub discovered_at: DateTime<Utc>,

    /// SHA-256 hex digest of the extracted text
    pub content_hash: String,

    /// Extracted text size in bytes
    pub byte_count: u64,

    /// Number of chunks created from this document
    pub chunk_count: u32,
}

/// A bounded, possibly overlapping segment of a source document; the unit
/// of indexing and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Source identifier this chunk belongs to
    pub source: String,

    /// Zero-based position within the source; sequential and contiguous
    pub chunk_index: u32,

    /// Text content (the raw window, never trimmed)
    pub text: String,

    /// Embedding vector; always present once the chunk is stored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// A retrieved chunk with its similarity score.
///
/// Carries everything a caller needs to render a citation without
/// re-querying the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Source identifier
    pub source: String,

    /// Chunk position within the source
    pub chunk_index: u32,

    /// Chunk text content
    pub content: String,

    /// Cosine similarity to the query, in [-1.0, 1.0]
    pub score: f32,
}

/// A synthesized answer with its supporting evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Generated answer text
    pub answer: String,

    /// The retrieval results the answer was grounded in. Always the
    /// actual retrieved evidence, never re-derived from generated text.
    pub sources: Vec<RetrievalResult>,

    /// Provider that generated the answer
    pub provider: String,

    /// End-to-end processing time including retrieval, in milliseconds
    pub processing_time_ms: f64,
}

/// Follow-up questions derived from a query/answer pair. Not persisted.
///
/// Holds at most [`FollowUpSet::TARGET`] distinct questions; fewer when
/// the backend output did not yield enough (callers can detect the
/// degraded case via [`FollowUpSet::count`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FollowUpSet {
    questions: Vec<String>,
}

impl FollowUpSet {
    /// The number of questions a fully-populated set carries.
    pub const TARGET: usize = 3;

    /// Build a set from parsed questions, truncating to the target size.
    pub fn from_questions(mut questions: Vec<String>) -> Self {
        questions.truncate(Self::TARGET);
        Self { questions }
    }

    /// An empty set, used when generation fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of questions actually recovered (0..=3).
    pub fn count(&self) -> usize {
        self.questions.len()
    }

    /// The questions in order.
    pub fn questions(&self) -> &[String] {
        &self.questions
    }
}

/// Estimated complexity of an analyzed passage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Beginner,
    Intermediate,
    Advanced,

    /// Fallback when the backend output could not be classified
    Unknown,
}

impl Complexity {
    /// Get the canonical string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Unknown => "unknown",
        }
    }
}

/// Structured analysis of an arbitrary text passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Short free-text summary
    pub summary: String,

    /// Topic tags, possibly empty
    pub tags: Vec<String>,

    /// Estimated complexity, `Unknown` when unclassifiable
    pub complexity: Complexity,
}

/// Aggregate counts for the embedding index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of indexed documents
    pub documents: u32,

    /// Number of indexed chunks
    pub chunks: u32,
}

/// A per-document ingestion failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestFailure {
    /// Path of the document that failed
    pub path: PathBuf,

    /// Human-readable failure reason
    pub reason: String,
}

/// Outcome of a bulk ingestion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// Documents chunked, embedded and indexed
    pub documents_indexed: u32,

    /// Chunks written to the index
    pub chunks_indexed: u32,

    /// Documents skipped because their content hash was unchanged
    pub skipped: u32,

    /// Per-document failures; the batch continues past them
    pub failures: Vec<IngestFailure>,
}
