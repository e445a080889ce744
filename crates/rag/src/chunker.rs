//! Document chunking with configurable size and overlap.
//!
//! Splits text into fixed-size overlapping character windows. Window `i`
//! begins at char `i * (chunk_size - chunk_overlap)`; trailing partial
//! windows are kept. Windows are emitted untrimmed so that concatenating
//! a document's chunks minus the overlap regions reconstructs the
//! original text.

use crate::types::Chunk;
use knowhow_core::{AppError, AppResult};

/// Validated chunking parameters.
#[derive(Debug, Clone, Copy)]
pub struct ChunkPlan {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl ChunkPlan {
    /// Create a chunk plan.
    ///
    /// # Errors
    /// Fails with `InvalidChunkConfig` if `chunk_overlap >= chunk_size`
    /// or either value is zero.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::InvalidChunkConfig(
                "chunk_size must be positive".to_string(),
            ));
        }
        if chunk_overlap == 0 {
            return Err(AppError::InvalidChunkConfig(
                "chunk_overlap must be positive".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::InvalidChunkConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Target chunk size in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap between consecutive chunks in characters.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into a lazy, finite sequence of chunks in source order.
    ///
    /// Documents shorter than `chunk_size` yield exactly one chunk
    /// spanning the whole document; empty text yields none.
    pub fn windows<'a>(&self, source: &str, text: &'a str) -> ChunkWindows<'a> {
        ChunkWindows {
            source: source.to_string(),
            text,
            chunk_size: self.chunk_size,
            step: self.chunk_size - self.chunk_overlap,
            start_byte: 0,
            next_index: 0,
            done: text.is_empty(),
        }
    }
}

/// Lazy iterator over a document's chunk windows. Non-restartable.
pub struct ChunkWindows<'a> {
    source: String,
    text: &'a str,
    chunk_size: usize,
    step: usize,
    start_byte: usize,
    next_index: u32,
    done: bool,
}

impl ChunkWindows<'_> {
    /// Byte offset `n` chars past `from`, clamped to end of text.
    fn advance_chars(&self, from: usize, n: usize) -> usize {
        self.text[from..]
            .char_indices()
            .nth(n)
            .map(|(offset, _)| from + offset)
            .unwrap_or(self.text.len())
    }
}

impl Iterator for ChunkWindows<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done {
            return None;
        }

        let end_byte = self.advance_chars(self.start_byte, self.chunk_size);

        let chunk = Chunk {
            source: self.source.clone(),
            chunk_index: self.next_index,
            text: self.text[self.start_byte..end_byte].to_string(),
            embedding: None,
        };

        // Once a window reaches end of text, the document is exhausted;
        // a window that merely re-covers the tail is never emitted.
        if end_byte == self.text.len() {
            self.done = true;
        } else {
            self.start_byte = self.advance_chars(self.start_byte, self.step);
            self.next_index += 1;
        }

        Some(chunk)
    }
}
