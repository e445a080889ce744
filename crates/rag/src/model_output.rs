//! Lenient parsing of model output into structured fields.
//!
//! Generated text is free-form even when the prompt asks for structure,
//! so every best-effort string heuristic in the system lives here, in one
//! auditable place. Parsers in this module never fail: they return typed
//! results with explicit fallback markers instead.

use crate::types::Complexity;

/// Parse a numbered or bulleted question list.
///
/// Strips numbering, bullets and surrounding quotes, discards blank lines
/// and case-insensitive duplicates, and preserves the original order.
pub fn parse_question_list(raw: &str) -> Vec<String> {
    let mut seen = Vec::new();
    let mut questions = Vec::new();

    for line in raw.lines() {
        let cleaned = strip_list_decoration(line);
        if cleaned.is_empty() {
            continue;
        }

        let key = cleaned.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        questions.push(cleaned);
    }

    questions
}

/// Remove list numbering, bullets and wrapping quotes from a line.
fn strip_list_decoration(line: &str) -> String {
    let mut s = line.trim();

    // Leading enumeration: "1.", "2)", "10:"
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &s[digits..];
        if let Some(stripped) = rest
            .strip_prefix('.')
            .or_else(|| rest.strip_prefix(')'))
            .or_else(|| rest.strip_prefix(':'))
        {
            s = stripped.trim_start();
        }
    }

    // Leading bullets
    s = s.trim_start_matches(['-', '*', '•']).trim_start();

    // Wrapping quotes
    let s = s.trim_matches('"').trim_matches('\'').trim();

    s.to_string()
}

/// Structured fields recovered from an analysis response.
#[derive(Debug, Clone)]
pub struct ParsedAnalysis {
    pub summary: String,
    pub tags: Vec<String>,
    pub complexity: Complexity,
}

/// Attempt a strict parse of a labeled analysis response.
///
/// Expects `SUMMARY:` / `TAGS:` / `COMPLEXITY:` labels (case-insensitive,
/// any order; the summary may span lines until the next label). Returns
/// `None` when no summary label is found, signaling the caller to fall
/// back to treating the whole output as the summary.
pub fn parse_analysis(raw: &str) -> Option<ParsedAnalysis> {
    let mut summary_lines: Vec<String> = Vec::new();
    let mut tags = Vec::new();
    let mut complexity = Complexity::Unknown;
    let mut in_summary = false;
    let mut found_summary = false;

    for line in raw.lines() {
        if let Some(rest) = label_value(line, "summary") {
            found_summary = true;
            in_summary = true;
            if !rest.is_empty() {
                summary_lines.push(rest);
            }
        } else if let Some(rest) = label_value(line, "tags") {
            in_summary = false;
            tags = rest
                .split(',')
                .map(|t| t.trim().trim_matches('"').to_string())
                .filter(|t| !t.is_empty())
                .collect();
        } else if let Some(rest) = label_value(line, "complexity") {
            in_summary = false;
            complexity = parse_complexity(&rest);
        } else if in_summary {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                summary_lines.push(trimmed.to_string());
            }
        }
    }

    if !found_summary {
        return None;
    }

    Some(ParsedAnalysis {
        summary: summary_lines.join(" "),
        tags,
        complexity,
    })
}

/// Match `LABEL:` at the start of a line, case-insensitive, returning the
/// remainder of the line.
fn label_value(line: &str, label: &str) -> Option<String> {
    let trimmed = line.trim().trim_start_matches(['*', '#']).trim_start();
    let prefix = trimmed.get(..label.len())?;
    if !prefix.eq_ignore_ascii_case(label) {
        return None;
    }
    let rest = trimmed[label.len()..].trim_start();
    rest.strip_prefix(':').map(|v| v.trim().to_string())
}

/// Classify a complexity string, falling back to `Unknown`.
pub fn parse_complexity(s: &str) -> Complexity {
    let lower = s.to_lowercase();
    if lower.contains("beginner") {
        Complexity::Beginner
    } else if lower.contains("intermediate") {
        Complexity::Intermediate
    } else if lower.contains("advanced") {
        Complexity::Advanced
    } else {
        Complexity::Unknown
    }
}
