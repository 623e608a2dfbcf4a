// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Unified-diff ("v4a") application.
//!
//! Hunks are located by the content of their context and removal lines, never
//! by the line numbers in `@@` headers, so a diff still applies after the file
//! has drifted.  Header line numbers only break ties between several equally
//! good locations.
use similar::{ChangeTag, TextDiff};
use tracing::debug;

use crate::builtin::fs::{read_text_for_edit, write_text};
use crate::error::ToolError;

// ── Hunk data structures ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    /// Unchanged line, must exist in the file and is kept verbatim.
    Context(String),
    /// Line to remove from the file.
    Remove(String),
    /// Line to insert into the file.
    Add(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffHunk {
    /// 1-based old-file line the hunk starts at, from `@@ -N,...`
    /// (`N + 1` for an empty `-N,0` range).
    pub start_line: Option<usize>,
    /// v4a-style `@@ <line>` anchor: the hunk is searched from this line on.
    pub anchor: Option<String>,
    pub lines: Vec<HunkLine>,
}

impl DiffHunk {
    /// Lines that must already be present in the file (Context + Remove), in order.
    fn search_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|l| match l {
                HunkLine::Context(s) | HunkLine::Remove(s) => Some(s.as_str()),
                HunkLine::Add(_) => None,
            })
            .collect()
    }

    /// Number of lines this hunk occupies once applied (Context + Add).
    fn applied_len(&self) -> usize {
        self.lines.iter().filter(|l| !matches!(l, HunkLine::Remove(_))).count()
    }

    /// Change in file length caused by this hunk.
    fn line_delta(&self) -> i64 {
        self.applied_len() as i64 - self.search_lines().len() as i64
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Strip a leading ` ```diff ` / ` ``` ` markdown fence if present.
fn strip_markdown_fence(diff: &str) -> &str {
    let t = diff.trim_start();
    if t.starts_with("```") {
        if let Some(nl) = t.find('\n') {
            let body = &t[nl + 1..];
            if let Some(close) = body.rfind("\n```") {
                return &body[..close + 1];
            }
            return body;
        }
    }
    diff
}

/// Parse the hunks of `diff`.
///
/// Accepts standard `@@ -N,M +N,M @@` headers, bare `@@` / `@@ @@`
/// separators, v4a `@@ <anchor line>` headers, `*** Begin Patch` envelopes
/// and `---`/`+++` file headers.  A diff without any header is one hunk.
pub fn parse_hunks(diff: &str) -> Result<Vec<DiffHunk>, ToolError> {
    let body = strip_markdown_fence(diff);
    let raw: Vec<&str> = body
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();
    let end = raw.iter().rposition(|l| !l.is_empty()).map_or(0, |i| i + 1);
    let raw = &raw[..end];

    let mut hunks: Vec<DiffHunk> = Vec::new();
    let mut current: Option<DiffHunk> = None;
    let mut idx = 0;

    while idx < raw.len() {
        let line = raw[idx];
        idx += 1;

        // File header pair, only outside a hunk body
        if line.starts_with("--- ")
            && raw.get(idx).is_some_and(|next| next.starts_with("+++ "))
            && (current.is_none() || raw.get(idx + 1).is_some_and(|after| after.starts_with("@@")))
        {
            idx += 1;
            continue;
        }
        // *** Begin Patch / *** Update File: / *** End Patch
        if line.starts_with("***") {
            continue;
        }
        // "\ No newline at end of file"
        if line.starts_with("\\ ") {
            continue;
        }
        if line.starts_with("@@") {
            if let Some(h) = current.take().filter(|h| !h.lines.is_empty()) {
                hunks.push(h);
            }
            let (start_line, anchor) = parse_header(line);
            current = Some(DiffHunk { start_line, anchor, lines: Vec::new() });
            continue;
        }

        let hunk_line = if let Some(rest) = line.strip_prefix(' ') {
            HunkLine::Context(rest.to_string())
        } else if let Some(rest) = line.strip_prefix('-') {
            HunkLine::Remove(rest.to_string())
        } else if let Some(rest) = line.strip_prefix('+') {
            HunkLine::Add(rest.to_string())
        } else if line.is_empty() {
            // A blank diff line with no prefix is an empty context line
            HunkLine::Context(String::new())
        } else {
            return Err(ToolError::diff(format!(
                "line {idx} of the diff is not a hunk line: {line:?}. \
                 Every line must start with ' ' (context), '-' (remove), '+' (add) or '@@'."
            )));
        };
        current.get_or_insert_with(DiffHunk::default).lines.push(hunk_line);
    }

    if let Some(h) = current.filter(|h| !h.lines.is_empty()) {
        hunks.push(h);
    }

    if hunks.is_empty() {
        return Err(ToolError::diff(
            "no hunks found in diff. Use ' ', '-' and '+' prefixed lines, optionally after an @@ header.",
        ));
    }
    Ok(hunks)
}

/// Split an `@@` header into its old-file start line and v4a anchor.
///
/// `@@ -5,7 +5,6 @@ fn x()` → `(Some(5), None)`,
/// `@@ -2,0 +3 @@` → `(Some(3), None)` (empty old range: insert after line 2),
/// `@@ @@` → `(None, None)`,
/// `@@ impl Foo {` → `(None, Some("impl Foo {"))`.
fn parse_header(header: &str) -> (Option<usize>, Option<String>) {
    let inner = header.trim_start_matches('@').trim();
    let ranges = inner.split("@@").next().unwrap_or("").trim();
    let is_range = |p: &str| {
        p.strip_prefix(['-', '+'])
            .is_some_and(|r| !r.is_empty() && r.split(',').all(|n| n.parse::<usize>().is_ok()))
    };

    if ranges.is_empty() {
        return (None, None);
    }
    if ranges.split_whitespace().all(is_range) {
        let start = ranges.split_whitespace().find_map(|p| {
            let mut parts = p.strip_prefix('-')?.split(',');
            let line = parts.next()?.parse::<usize>().ok()?;
            // `-N,0` names the line *after which* the new lines go
            match parts.next().and_then(|c| c.parse::<usize>().ok()) {
                Some(0) => Some(line + 1),
                _ => Some(line),
            }
        });
        return (start, None);
    }
    (None, Some(ranges.to_string()))
}

// ── Matching helpers ──────────────────────────────────────────────────────────

/// Similarity ratio in [0,1] using character-level diff (2×matches / total).
fn similarity_ratio(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let diff = TextDiff::from_chars(a, b);
    let matching: usize = diff
        .iter_all_changes()
        .filter(|c| c.tag() == ChangeTag::Equal)
        .map(|c| c.value().len())
        .sum();
    (matching * 2) as f64 / total as f64
}

/// The window of `file_lines` most similar to `search_lines` (similarity
/// above 30 %), as `(ratio, 1-based line, lines)`.  Only used for error hints.
fn nearest_block(file_lines: &[String], search_lines: &[&str]) -> Option<(f64, usize, Vec<String>)> {
    let n = search_lines.len().max(1);
    if file_lines.len() < n {
        return None;
    }
    let search_joined = search_lines.join("\n");
    file_lines
        .windows(n)
        .enumerate()
        .map(|(i, win)| (similarity_ratio(&search_joined, &win.join("\n")), i + 1, win.to_vec()))
        .filter(|(r, _, _)| *r > 0.3)
        .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
}

/// When several windows match, pick the one closest to `target` (0-based).
fn pick_closest(matches: &[usize], target: usize) -> usize {
    matches
        .iter()
        .copied()
        .min_by_key(|&p| (p as isize - target as isize).unsigned_abs())
        .unwrap_or(matches[0])
}

fn block_matches(file_lines: &[String], at: usize, search_lines: &[&str]) -> bool {
    file_lines.len() >= at + search_lines.len()
        && file_lines[at..at + search_lines.len()]
            .iter()
            .map(String::as_str)
            .eq(search_lines.iter().copied())
}

fn not_found_message(file_lines: &[String], search_lines: &[&str]) -> String {
    let mut msg = String::from("context not found. Expected these lines verbatim:\n");
    for l in search_lines {
        msg.push_str(&format!("  |{l}|\n"));
    }
    if let Some((ratio, line_no, block)) = nearest_block(file_lines, search_lines) {
        msg.push_str(&format!("Nearest match at line {line_no} ({:.0}%):\n", ratio * 100.0));
        for l in &block {
            msg.push_str(&format!("  |{l}|\n"));
        }
    }
    msg.push_str("Re-read the file, fix the context lines, and retry.");
    msg
}

/// Find the 0-based index where `hunk` applies in `file_lines`.
///
/// `cursor` is where the previously applied hunk starts; hunks apply top to
/// bottom, so a block found only above it is a conflict.  A hunk may use the
/// previous hunk's output as its context.  `shift` is the net
/// line delta of earlier hunks, used to translate the header line number.
fn locate(file_lines: &[String], hunk: &DiffHunk, cursor: usize, shift: i64) -> Result<usize, String> {
    let mut from = cursor;
    if let Some(anchor) = &hunk.anchor {
        let wanted = anchor.trim();
        match file_lines[cursor..].iter().position(|l| l.trim() == wanted) {
            Some(p) => from = cursor + p,
            None => return Err(format!("anchor line \"{wanted}\" not found after line {cursor}.")),
        }
    }
    let hint = hunk
        .start_line
        .map(|h| (h as i64 + shift - 1).max(0) as usize);

    let search = hunk.search_lines();

    // Pure insertion: nothing to match against
    if search.is_empty() {
        let pos = if hunk.anchor.is_some() {
            from + 1
        } else {
            hint.unwrap_or(file_lines.len()).max(from)
        };
        return Ok(pos.min(file_lines.len()));
    }

    let last_start = (file_lines.len() + 1).saturating_sub(search.len());
    let hits: Vec<usize> = (from..last_start)
        .filter(|&i| block_matches(file_lines, i, &search))
        .collect();

    match hits.as_slice() {
        [pos] => Ok(*pos),
        [] => {
            let earlier = (0..from.min(last_start)).find(|&i| block_matches(file_lines, i, &search));
            match earlier {
                Some(i) if i < cursor => Err(format!(
                    "context only matches at line {}, above the previous hunk (which starts at line {}). \
                     Hunks must be ordered top to bottom.",
                    i + 1,
                    cursor + 1
                )),
                Some(i) => Err(format!(
                    "context only matches at line {}, before the anchor line.",
                    i + 1
                )),
                None => Err(not_found_message(file_lines, &search)),
            }
        }
        many => match hint {
            Some(target) => Ok(pick_closest(many, target)),
            None => {
                let lines: Vec<String> = many.iter().map(|p| (p + 1).to_string()).collect();
                Err(format!(
                    "context matches {} locations (lines {}). Add more context lines or an \
                     @@ -N,M +N,M @@ header so the hunk matches exactly one place.",
                    many.len(),
                    lines.join(", ")
                ))
            }
        },
    }
}

// ── Hunk application ─────────────────────────────────────────────────────────

/// Apply `hunk` at `pos` (0-based index where its search lines begin).
fn apply_hunk(file_lines: &[String], hunk: &DiffHunk, pos: usize) -> Vec<String> {
    let mut result = file_lines[..pos].to_vec();
    let mut file_idx = pos;

    for hl in &hunk.lines {
        match hl {
            HunkLine::Context(_) => {
                result.push(file_lines[file_idx].clone());
                file_idx += 1;
            }
            HunkLine::Remove(_) => file_idx += 1,
            HunkLine::Add(s) => result.push(s.clone()),
        }
    }

    result.extend_from_slice(&file_lines[file_idx..]);
    result
}

/// Apply `diff` to `original` and return the patched content.
///
/// Either every hunk applies or an error is returned; there is no partial
/// result.  CRLF line endings and the presence of a trailing newline are
/// preserved.
pub fn apply_diff(original: &str, diff: &str) -> Result<String, ToolError> {
    let hunks = parse_hunks(diff)?;

    let newline = if original.contains("\r\n") { "\r\n" } else { "\n" };
    let had_trailing_newline = original.ends_with('\n');
    let mut file_lines: Vec<String> = original.lines().map(str::to_string).collect();

    let mut cursor = 0;
    let mut shift = 0i64;
    for (idx, hunk) in hunks.iter().enumerate() {
        let pos = locate(&file_lines, hunk, cursor, shift).map_err(|e| {
            if hunks.len() > 1 {
                ToolError::diff(format!("hunk {}: {e}", idx + 1))
            } else {
                ToolError::diff(e)
            }
        })?;
        debug!(hunk = idx + 1, line = pos + 1, "hunk located");
        file_lines = apply_hunk(&file_lines, hunk, pos);
        cursor = pos;
        shift += hunk.line_delta();
    }

    let mut patched = file_lines.join(newline);
    if had_trailing_newline && !file_lines.is_empty() {
        patched.push_str(newline);
    }
    Ok(patched)
}

/// Apply `diff` to the file at `path`, write the result back and return it.
/// The file is only written when every hunk applied.
pub async fn apply_diff_to_file(path: &str, diff: &str) -> Result<String, ToolError> {
    debug!(path = %path, "apply_diff_to_file");
    let original = read_text_for_edit(path).await?;
    let patched = apply_diff(&original, diff)?;
    write_text(path, &patched).await?;
    Ok(patched)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
