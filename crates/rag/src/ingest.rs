//! Bulk document ingestion.
//!
//! Discovers files, extracts text, chunks, embeds and upserts one
//! document at a time. Each document is indexed atomically; a failure is
//! recorded in the report and the batch continues.

use crate::chunker::ChunkPlan;
use crate::embeddings::EmbeddingProvider;
use crate::index::EmbeddingIndex;
use crate::parser::{self, ContentType};
use crate::types::{Chunk, IngestFailure, IngestReport, SourceDocument};
use chrono::Utc;
use futures::{StreamExt, TryStreamExt};
use knowhow_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// How many chunk embeddings may be in flight at once per document.
const EMBED_CONCURRENCY: usize = 8;

/// Options for a bulk ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Files and directories to ingest
    pub paths: Vec<PathBuf>,

    /// Target chunk size in characters
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

/// Ingest documents into the embedding index.
///
/// Unchanged documents (same content hash as stored) are skipped, so
/// re-running over an unmodified corpus leaves the index untouched.
pub async fn ingest(
    index: &EmbeddingIndex,
    embedder: &Arc<dyn EmbeddingProvider>,
    options: &IngestOptions,
) -> AppResult<IngestReport> {
    // An invalid chunk configuration fails the whole batch up front
    let plan = ChunkPlan::new(options.chunk_size, options.chunk_overlap)?;

    let files = discover_files(&options.paths);
    tracing::info!(files = files.len(), "Starting ingestion");

    let mut report = IngestReport::default();

    for path in files {
        match process_document(index, embedder, &plan, &path).await {
            Ok(Some(chunk_count)) => {
                report.documents_indexed += 1;
                report.chunks_indexed += chunk_count;
            }
            Ok(None) => {
                report.skipped += 1;
            }
            Err(e) => {
                tracing::warn!("Failed to ingest {:?}: {}", path, e);
                report.failures.push(IngestFailure {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        documents = report.documents_indexed,
        chunks = report.chunks_indexed,
        skipped = report.skipped,
        failures = report.failures.len(),
        "Ingestion completed"
    );

    Ok(report)
}

/// Collect supported files from the given paths, in a stable order.
fn discover_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let entry_path = entry.path();
                if entry_path.is_file()
                    && ContentType::from_path(entry_path) != ContentType::Unsupported
                {
                    files.push(entry_path.to_path_buf());
                }
            }
        }
    }

    files
}

/// Chunk, embed and upsert a single document.
///
/// Returns the number of chunks indexed, or `None` when the document was
/// skipped because its content is unchanged.
async fn process_document(
    index: &EmbeddingIndex,
    embedder: &Arc<dyn EmbeddingProvider>,
    plan: &ChunkPlan,
    path: &Path,
) -> AppResult<Option<u32>> {
    let source_id = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| AppError::InvalidArgument(format!("Path has no file name: {:?}", path)))?;

    let text = parser::parse_file(path)?;
    let content_hash = hex_digest(&text);

    if index.content_hash(&source_id)?.as_deref() == Some(content_hash.as_str()) {
        tracing::debug!(source = %source_id, "Content unchanged, skipping");
        return Ok(None);
    }

    let mut chunks: Vec<Chunk> = plan.windows(&source_id, &text).collect();

    // One embedding per chunk, computed before storage
    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings: Vec<Vec<f32>> = futures::stream::iter(texts.into_iter().map(|t| {
        let embedder = Arc::clone(embedder);
        async move { embedder.embed(&t).await }
    }))
    .buffered(EMBED_CONCURRENCY)
    .try_collect()
    .await?;

    for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
        chunk.embedding = Some(embedding);
    }

    let document = SourceDocument {
        source_id: source_id.clone(),
        path: path.to_path_buf(),
        content_type: ContentType::from_path(path).as_str().to_string(),
        discovered_at: Utc::now(),
        content_hash,
        byte_count: text.len() as u64,
        chunk_count: chunks.len() as u32,
    };

    index.upsert(&document, &chunks)?;

    tracing::debug!(
        source = %source_id,
        chunks = chunks.len(),
        bytes = text.len(),
        "Indexed document"
    );

    Ok(Some(chunks.len() as u32))
}

/// SHA-256 hex digest of the extracted text.
fn hex_digest(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
