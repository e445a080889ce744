//! SQLite-backed embedding index.
//!
//! The only persistent state in the system. Owns all document and chunk
//! records; a per-document upsert runs in a single transaction, so
//! concurrent searches see either the fully-old or the fully-new chunk
//! set, never a mix.

use crate::types::{Chunk, IndexStats, RetrievalResult, SourceDocument};
use knowhow_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Mutex;

/// Vector index over document chunks.
///
/// Explicitly constructed via [`EmbeddingIndex::open`] and passed by
/// reference; there is no ambient global index.
pub struct EmbeddingIndex {
    conn: Mutex<Connection>,
    dimensions: usize,
}

impl EmbeddingIndex {
    /// Open (or create) the index database at the given path.
    pub fn open(db_path: &Path, dimensions: usize) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Index(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Index(format!("Failed to open index database: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                source_id TEXT PRIMARY KEY,
                path TEXT NOT NULL,
                content_type TEXT NOT NULL,
                discovered_at TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                byte_count INTEGER NOT NULL,
                chunk_count INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chunks (
                source_id TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (source_id, chunk_index),
                FOREIGN KEY (source_id) REFERENCES documents(source_id)
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source_id);
            "#,
        )
        .map_err(|e| AppError::Index(format!("Failed to create tables: {}", e)))?;

        tracing::debug!("Opened embedding index at {:?}", db_path);

        Ok(Self {
            conn: Mutex::new(conn),
            dimensions,
        })
    }

    /// Embedding dimensionality this index was opened with.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Replace all chunks for a document atomically.
    ///
    /// Every chunk must carry an embedding of the index dimensionality;
    /// chunks are never stored without vectors.
    pub fn upsert(&self, document: &SourceDocument, chunks: &[Chunk]) -> AppResult<()> {
        // Validate and encode every vector before touching the database
        let mut encoded = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let embedding = chunk.embedding.as_deref().ok_or_else(|| {
                AppError::Index(format!(
                    "Chunk {}:{} is missing an embedding",
                    chunk.source, chunk.chunk_index
                ))
            })?;
            if embedding.len() != self.dimensions {
                return Err(AppError::EmbeddingDimensionMismatch {
                    expected: self.dimensions,
                    actual: embedding.len(),
                });
            }
            encoded.push(embedding_to_bytes(embedding));
        }

        let mut conn = self.conn.lock().expect("index lock poisoned");
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Index(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            "DELETE FROM chunks WHERE source_id = ?1",
            params![document.source_id],
        )
        .map_err(|e| AppError::Index(format!("Failed to delete old chunks: {}", e)))?;

        tx.execute(
            "INSERT OR REPLACE INTO documents
             (source_id, path, content_type, discovered_at, content_hash, byte_count, chunk_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                document.source_id,
                document.path.to_string_lossy().to_string(),
                document.content_type,
                document.discovered_at.to_rfc3339(),
                document.content_hash,
                document.byte_count as i64,
                chunks.len() as i64,
            ],
        )
        .map_err(|e| AppError::Index(format!("Failed to insert document: {}", e)))?;

        for (chunk, embedding_bytes) in chunks.iter().zip(encoded) {
            tx.execute(
                "INSERT INTO chunks (source_id, chunk_index, text, embedding)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    chunk.source,
                    chunk.chunk_index as i64,
                    chunk.text,
                    embedding_bytes,
                ],
            )
            .map_err(|e| AppError::Index(format!("Failed to insert chunk: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| AppError::Index(format!("Failed to commit upsert: {}", e)))?;

        tracing::debug!(
            source = %document.source_id,
            chunks = chunks.len(),
            "Upserted document"
        );

        Ok(())
    }

    /// Search for the top-k most similar chunks to the query vector.
    ///
    /// Results are ordered by descending cosine similarity; ties break by
    /// ascending chunk_index, then ascending source identifier, so
    /// rankings are deterministic. An empty index returns no results
    /// rather than an error.
    pub fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<RetrievalResult>> {
        if k == 0 {
            return Err(AppError::InvalidArgument(
                "k must be positive".to_string(),
            ));
        }
        if query.len() != self.dimensions {
            return Err(AppError::EmbeddingDimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let conn = self.conn.lock().expect("index lock poisoned");
        let mut stmt = conn
            .prepare("SELECT source_id, chunk_index, text, embedding FROM chunks")
            .map_err(|e| AppError::Index(format!("Failed to prepare search: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let embedding_bytes: Vec<u8> = row.get(3)?;
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)? as u32,
                    row.get::<_, String>(2)?,
                    embedding_bytes,
                ))
            })
            .map_err(|e| AppError::Index(format!("Failed to query chunks: {}", e)))?;

        let mut results = Vec::new();
        for row in rows {
            let (source, chunk_index, content, embedding_bytes) =
                row.map_err(|e| AppError::Index(format!("Failed to read chunk row: {}", e)))?;
            let embedding = bytes_to_embedding(&embedding_bytes)?;
            let score = cosine_similarity(query, &embedding);
            results.push(RetrievalResult {
                source,
                chunk_index,
                content,
                score,
            });
        }

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk_index.cmp(&b.chunk_index))
                .then_with(|| a.source.cmp(&b.source))
        });
        results.truncate(k);

        tracing::debug!("Search returned {} of top-{} requested", results.len(), k);

        Ok(results)
    }

    /// Get document and chunk counts.
    pub fn stats(&self) -> AppResult<IndexStats> {
        let conn = self.conn.lock().expect("index lock poisoned");

        let documents: u32 = conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| {
                row.get::<_, i64>(0).map(|v| v as u32)
            })
            .map_err(|e| AppError::Index(format!("Failed to count documents: {}", e)))?;

        let chunks: u32 = conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| {
                row.get::<_, i64>(0).map(|v| v as u32)
            })
            .map_err(|e| AppError::Index(format!("Failed to count chunks: {}", e)))?;

        Ok(IndexStats { documents, chunks })
    }

    /// Stored content hash for a document, if it has been ingested.
    pub fn content_hash(&self, source_id: &str) -> AppResult<Option<String>> {
        let conn = self.conn.lock().expect("index lock poisoned");

        conn.query_row(
            "SELECT content_hash FROM documents WHERE source_id = ?1",
            params![source_id],
            |row| row.get(0),
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(AppError::Index(format!(
                "Failed to read content hash: {}",
                other
            ))),
        })
    }

    /// Delete all documents and chunks.
    pub fn reset(&self) -> AppResult<()> {
        let conn = self.conn.lock().expect("index lock poisoned");

        conn.execute("DELETE FROM chunks", [])
            .map_err(|e| AppError::Index(format!("Failed to delete chunks: {}", e)))?;
        conn.execute("DELETE FROM documents", [])
            .map_err(|e| AppError::Index(format!("Failed to delete documents: {}", e)))?;

        tracing::info!("Reset embedding index");
        Ok(())
    }

    /// Commit any pending state to disk.
    ///
    /// Writes already commit at transaction boundaries; this exists as an
    /// explicit teardown point for the service lifecycle.
    pub fn flush(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Convert an embedding vector to little-endian bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert stored bytes back to an embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        embedding.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(embedding)
}

/// Cosine similarity between two vectors of equal length.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::NamedTempFile;

    fn test_document(source_id: &str, hash: &str) -> SourceDocument {
        SourceDocument {
            source_id: source_id.to_string(),
            path: std::path::PathBuf::from(format!("/docs/{}", source_id)),
            content_type: "markdown".to_string(),
            discovered_at: Utc::now(),
            content_hash: hash.to_string(),
            byte_count: 100,
            chunk_count: 0,
        }
    }

    fn test_chunk(source: &str, index: u32, embedding: Vec<f32>) -> Chunk {
        Chunk {
            source: source.to_string(),
            chunk_index: index,
            text: format!("{} chunk {}", source, index),
            embedding: Some(embedding),
        }
    }

    fn open_index(dims: usize) -> (EmbeddingIndex, NamedTempFile) {
        let file = NamedTempFile::new().unwrap();
        let index = EmbeddingIndex::open(file.path(), dims).unwrap();
        (index, file)
    }

    #[test]
    fn test_upsert_and_search() {
        let (index, _file) = open_index(3);

        index
            .upsert(
                &test_document("a.md", "h1"),
                &[
                    test_chunk("a.md", 0, vec![1.0, 0.0, 0.0]),
                    test_chunk("a.md", 1, vec![0.0, 1.0, 0.0]),
                ],
            )
            .unwrap();

        let results = index.search(&[1.0, 0.0, 0.0], 5).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "a.md");
        assert_eq!(results[0].chunk_index, 0);
        assert!((results[0].score - 1.0).abs() < 1e-5);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_reingest_replaces_chunks() {
        let (index, _file) = open_index(3);

        let chunks = vec![
            test_chunk("a.md", 0, vec![1.0, 0.0, 0.0]),
            test_chunk("a.md", 1, vec![0.0, 1.0, 0.0]),
            test_chunk("a.md", 2, vec![0.0, 0.0, 1.0]),
        ];
        index.upsert(&test_document("a.md", "h1"), &chunks).unwrap();
        index.upsert(&test_document("a.md", "h1"), &chunks).unwrap();

        let stats = index.stats().unwrap();
        assert_eq!(stats.documents, 1);
        assert_eq!(stats.chunks, 3);
    }

    #[test]
    fn test_search_tie_breaks_are_deterministic() {
        let (index, _file) = open_index(2);

        // All chunks identical to the query: scores tie at 1.0
        index
            .upsert(
                &test_document("b.md", "h1"),
                &[
                    test_chunk("b.md", 0, vec![1.0, 0.0]),
                    test_chunk("b.md", 1, vec![1.0, 0.0]),
                ],
            )
            .unwrap();
        index
            .upsert(
                &test_document("a.md", "h2"),
                &[test_chunk("a.md", 0, vec![1.0, 0.0])],
            )
            .unwrap();

        let results = index.search(&[1.0, 0.0], 10).unwrap();
        assert_eq!(results.len(), 3);
        // Smaller chunk_index first; equal chunk_index orders by source
        assert_eq!((results[0].source.as_str(), results[0].chunk_index), ("a.md", 0));
        assert_eq!((results[1].source.as_str(), results[1].chunk_index), ("b.md", 0));
        assert_eq!((results[2].source.as_str(), results[2].chunk_index), ("b.md", 1));
    }

    #[test]
    fn test_search_empty_index_returns_no_results() {
        let (index, _file) = open_index(3);
        let results = index.search(&[1.0, 0.0, 0.0], 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_search_zero_k_is_invalid() {
        let (index, _file) = open_index(3);
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 0),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_search_wrong_dimensionality_is_fatal() {
        let (index, _file) = open_index(3);
        assert!(matches!(
            index.search(&[1.0, 0.0], 5),
            Err(AppError::EmbeddingDimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_upsert_rejects_wrong_chunk_dimensionality() {
        let (index, _file) = open_index(3);
        let result = index.upsert(
            &test_document("a.md", "h1"),
            &[test_chunk("a.md", 0, vec![1.0, 0.0])],
        );
        assert!(matches!(
            result,
            Err(AppError::EmbeddingDimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_upsert_rejects_missing_embedding() {
        let (index, _file) = open_index(3);
        let chunk = Chunk {
            source: "a.md".to_string(),
            chunk_index: 0,
            text: "no vector".to_string(),
            embedding: None,
        };
        assert!(matches!(
            index.upsert(&test_document("a.md", "h1"), &[chunk]),
            Err(AppError::Index(_))
        ));
    }

    #[test]
    fn test_content_hash_lookup() {
        let (index, _file) = open_index(3);
        assert_eq!(index.content_hash("a.md").unwrap(), None);

        index
            .upsert(
                &test_document("a.md", "deadbeef"),
                &[test_chunk("a.md", 0, vec![1.0, 0.0, 0.0])],
            )
            .unwrap();

        assert_eq!(
            index.content_hash("a.md").unwrap().as_deref(),
            Some("deadbeef")
        );
    }

    #[test]
    fn test_reset_clears_everything() {
        let (index, _file) = open_index(3);
        index
            .upsert(
                &test_document("a.md", "h1"),
                &[test_chunk("a.md", 0, vec![1.0, 0.0, 0.0])],
            )
            .unwrap();

        index.reset().unwrap();

        let stats = index.stats().unwrap();
        assert_eq!(stats.documents, 0);
        assert_eq!(stats.chunks, 0);
    }

    #[test]
    fn test_embedding_byte_round_trip() {
        let original = vec![0.25f32, -1.5, 3.75];
        let bytes = embedding_to_bytes(&original);
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), original);
        assert!(bytes_to_embedding(&bytes[..5]).is_err());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-5);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-5);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-5);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
