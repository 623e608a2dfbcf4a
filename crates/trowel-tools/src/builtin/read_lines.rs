// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use tracing::debug;

use crate::builtin::fs::read_text;
use crate::error::ToolError;

/// Return lines `start_line..=end_line` (1-indexed) of `path`, each prefixed
/// with its line number.
///
/// `start_line` below 1 is treated as 1, an `end_line` before `start_line`
/// selects the single line `start_line`, and `end_line` is clamped to the last
/// line.  A start past the end of the file yields an explanatory message with
/// the real line count instead of an error.
pub async fn read_lines(path: &str, start_line: i64, end_line: i64) -> Result<String, ToolError> {
    debug!(path = %path, start_line, end_line, "get_file_lines");
    let content = read_text(path).await?;
    Ok(select_lines(path, &content, start_line, end_line))
}

fn select_lines(path: &str, content: &str, start_line: i64, end_line: i64) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let total = lines.len();

    let start = start_line.max(1) as usize;
    let end = if end_line < start as i64 { start } else { end_line as usize };

    if start > total {
        return format!(
            "File {path} has only {total} lines. Requested start line {start} is beyond the end of the file."
        );
    }
    let end = end.min(total);

    lines[start - 1..end]
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{} | {}", start + i, line))
        .collect::<Vec<_>>()
        .join("\n")
}
