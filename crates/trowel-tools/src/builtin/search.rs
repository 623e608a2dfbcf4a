// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use tracing::debug;

use crate::builtin::fs::read_text;
use crate::error::ToolError;

/// One occurrence of the search pattern together with its context window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    /// 1-based
    pub line_number: usize,
    pub matched_line: String,
    pub context_before: Vec<String>,
    pub context_after: Vec<String>,
}

/// Case-insensitive substring search in a single file.
pub async fn search(path: &str, pattern: &str, context_lines: usize) -> Result<String, ToolError> {
    if pattern.is_empty() {
        return Err(ToolError::invalid("pattern", "must not be empty"));
    }
    debug!(path = %path, pattern = %pattern, context_lines, "search_in_file");

    let content = read_text(path).await?;
    let matches = find_matches(&content, pattern, context_lines);
    Ok(render(path, pattern, &matches))
}

pub(crate) fn find_matches(content: &str, pattern: &str, context_lines: usize) -> Vec<SearchMatch> {
    let needle = pattern.to_lowercase();
    let lines: Vec<&str> = content.lines().collect();
    let owned = |s: &[&str]| s.iter().map(|l| l.to_string()).collect::<Vec<_>>();

    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.to_lowercase().contains(&needle))
        .map(|(i, line)| {
            let before = i.saturating_sub(context_lines);
            let after = (i + 1 + context_lines).min(lines.len());
            SearchMatch {
                line_number: i + 1,
                matched_line: line.to_string(),
                context_before: owned(&lines[before..i]),
                context_after: owned(&lines[i + 1..after]),
            }
        })
        .collect()
}

fn render(path: &str, pattern: &str, matches: &[SearchMatch]) -> String {
    if matches.is_empty() {
        return format!("No matches found for \"{pattern}\" in {path}.");
    }

    let plural = if matches.len() == 1 { "match" } else { "matches" };
    let mut out = format!("Found {} {plural} for \"{pattern}\" in {path}:\n", matches.len());

    for (idx, m) in matches.iter().enumerate() {
        out.push_str(&format!("\n--- Match {} (line {}) ---\n", idx + 1, m.line_number));
        let first = m.line_number - m.context_before.len();
        for (i, line) in m.context_before.iter().enumerate() {
            out.push_str(&format!("    {} | {}\n", first + i, line));
        }
        out.push_str(&format!(">>> {} | {}\n", m.line_number, m.matched_line));
        for (i, line) in m.context_after.iter().enumerate() {
            out.push_str(&format!("    {} | {}\n", m.line_number + 1 + i, line));
        }
    }
    out.truncate(out.trim_end().len());
    out
}
