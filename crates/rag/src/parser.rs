//! Source file parsing and text extraction.
//!
//! The corpus is markdown and plain text with the occasional Jupyter
//! notebook; everything else is skipped during ingestion.

use knowhow_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    PlainText,
    Notebook,
    Unsupported,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("txt") => Self::PlainText,
            Some("ipynb") => Self::Notebook,
            _ => Self::Unsupported,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::PlainText => "text",
            Self::Notebook => "notebook",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Parse a source file and extract clean text.
pub fn parse_file(path: &Path) -> AppResult<String> {
    let content_type = ContentType::from_path(path);

    if content_type == ContentType::Unsupported {
        return Err(AppError::InvalidArgument(format!(
            "Unsupported file type: {:?}",
            path
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Io(std::io::Error::new(e.kind(), format!("{:?}: {}", path, e))))?;

    if raw.contains('\0') {
        tracing::warn!("Skipping likely binary file: {:?}", path);
        return Err(AppError::InvalidArgument(format!(
            "Binary content in {:?}",
            path
        )));
    }

    let cleaned = match content_type {
        ContentType::Markdown => clean_markdown(&raw),
        ContentType::PlainText => normalize_text(&raw),
        ContentType::Notebook => extract_notebook(&raw)?,
        ContentType::Unsupported => unreachable!(),
    };

    Ok(cleaned)
}

/// Clean markdown scaffolding, keeping the prose and code content.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        // Skip horizontal rules and code fence delimiters
        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

/// Collapse runs of blank lines and trailing whitespace in plain text.
fn normalize_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last_blank = false;

    for line in text.lines() {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            if !last_blank {
                result.push('\n');
            }
            last_blank = true;
        } else {
            result.push_str(trimmed);
            result.push('\n');
            last_blank = false;
        }
    }

    result.trim().to_string()
}

/// Extract markdown and code cell sources from a Jupyter notebook.
fn extract_notebook(raw: &str) -> AppResult<String> {
    #[derive(serde::Deserialize)]
    struct Notebook {
        #[serde(default)]
        cells: Vec<Cell>,
    }

    #[derive(serde::Deserialize)]
    struct Cell {
        cell_type: String,
        #[serde(default)]
        source: Vec<String>,
    }

    let notebook: Notebook = serde_json::from_str(raw)
        .map_err(|e| AppError::Serialization(format!("Invalid notebook JSON: {}", e)))?;

    let mut parts = Vec::new();
    for cell in notebook.cells {
        if cell.cell_type == "markdown" || cell.cell_type == "code" {
            let text = cell.source.concat();
            if !text.trim().is_empty() {
                parts.push(text);
            }
        }
    }

    Ok(normalize_text(&parts.join("\n")))
}
