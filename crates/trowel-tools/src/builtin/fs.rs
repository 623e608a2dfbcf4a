// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Whole-file and directory operations: listing, reading, creating.
use std::io::ErrorKind;

use tracing::debug;

use crate::error::ToolError;

async fn read_bytes(path: &str) -> Result<Vec<u8>, ToolError> {
    match tokio::fs::metadata(path).await {
        Ok(m) if m.is_file() => {}
        Ok(_) => return Err(ToolError::NotFound(format!("{path} is not a regular file."))),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ToolError::NotFound(format!("File {path} does not exist.")))
        }
        Err(e) => return Err(ToolError::io(format!("cannot access {path}"), e)),
    }
    tokio::fs::read(path)
        .await
        .map_err(|e| ToolError::io(format!("read error for {path}"), e))
}

/// Read a regular file as UTF-8 text (invalid sequences are replaced).
/// Only for read-only tools: the result must never be written back.
pub(crate) async fn read_text(path: &str) -> Result<String, ToolError> {
    let bytes = read_bytes(path).await?;
    Ok(match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Read a file that is about to be rewritten.  Fails on invalid UTF-8 so
/// bytes outside the edited span survive the write-back unchanged.
pub(crate) async fn read_text_for_edit(path: &str) -> Result<String, ToolError> {
    let bytes = read_bytes(path).await?;
    String::from_utf8(bytes).map_err(|e| {
        ToolError::invalid(
            "path",
            format!(
                "{path} is not valid UTF-8 (invalid byte at offset {}) and cannot be edited \
                 without corrupting it. Use run_shell_command to edit it instead.",
                e.utf8_error().valid_up_to()
            ),
        )
    })
}

pub(crate) async fn write_text(path: &str, content: &str) -> Result<(), ToolError> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| ToolError::io(format!("write error for {path}"), e))
}

/// Newline-separated names of the entries in `path`, directories suffixed
/// with `/`.  A missing directory is reported in the result text rather than
/// as an error so the agent learns about `create_directory`.
pub async fn list_folder(path: &str) -> Result<String, ToolError> {
    debug!(path = %path, "get_folder_content");

    match tokio::fs::metadata(path).await {
        Ok(m) if m.is_dir() => {}
        Ok(_) => return Err(ToolError::invalid("path", format!("{path} is not a directory"))),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok(format!(
                "Error: Directory {path} does not exist. Use create_directory to create it."
            ))
        }
        Err(e) => return Err(ToolError::io(format!("cannot access {path}"), e)),
    }

    let mut rd = tokio::fs::read_dir(path)
        .await
        .map_err(|e| ToolError::io(format!("cannot list {path}"), e))?;
    let mut entries = Vec::new();
    while let Some(entry) = rd
        .next_entry()
        .await
        .map_err(|e| ToolError::io(format!("cannot list {path}"), e))?
    {
        let name = entry.file_name().to_string_lossy().to_string();
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        entries.push(if is_dir { format!("{name}/") } else { name });
    }
    entries.sort();

    if entries.is_empty() {
        return Ok("(empty directory)".to_string());
    }
    Ok(entries.join("\n"))
}

/// Full text of a file, capped at `limit` bytes.
pub async fn read_file(path: &str, limit: usize) -> Result<String, ToolError> {
    debug!(path = %path, "get_file_content");
    let text = read_text(path).await?;
    if text.len() <= limit {
        return Ok(text);
    }
    let mut cut = limit;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    Ok(format!(
        "{}\n...[file truncated at {} of {} bytes; use get_file_lines or search_in_file for the rest]",
        &text[..cut],
        cut,
        text.len()
    ))
}

/// Create `path` and any missing parents.
pub async fn create_directory(path: &str) -> Result<String, ToolError> {
    debug!(path = %path, "create_directory");
    match tokio::fs::metadata(path).await {
        Ok(m) if m.is_dir() => return Ok(format!("Directory {path} already exists.")),
        Ok(_) => {
            return Err(ToolError::invalid("path", format!("{path} exists and is not a directory")))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(ToolError::io(format!("cannot access {path}"), e)),
    }
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| ToolError::io(format!("cannot create directory {path}"), e))?;
    Ok(format!("Successfully created directory {path}"))
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn path_str(p: &Path) -> String {
        p.to_string_lossy().to_string()
    }

    // ── list_folder ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn lists_entries_sorted_with_dir_suffix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.txt"), "x").unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();

        let out = list_folder(&path_str(dir.path())).await.unwrap();
        assert_eq!(out, "a.txt\nb.txt\nsub/");
    }

    #[tokio::test]
    async fn missing_folder_mentions_create_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = path_str(&dir.path().join("nonexistent"));
        let out = list_folder(&missing).await.unwrap();
        assert!(out.contains("Error:"));
        assert!(out.contains("does not exist"));
        assert!(out.contains("create_directory"));
    }

    #[tokio::test]
    async fn empty_folder_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let out = list_folder(&path_str(dir.path())).await.unwrap();
        assert_eq!(out, "(empty directory)");
    }

    // ── read_file ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn reads_full_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, "alpha\nbeta\n").unwrap();
        assert_eq!(read_file(&path_str(&file), 1000).await.unwrap(), "alpha\nbeta\n");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = read_file("/tmp/trowel_no_such_file_xyz.txt", 1000).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_file(&path_str(dir.path()), 1000).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn oversized_file_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("big.txt");
        std::fs::write(&file, "x".repeat(100)).unwrap();
        let out = read_file(&path_str(&file), 10).await.unwrap();
        assert!(out.starts_with("xxxxxxxxxx\n"));
        assert!(out.contains("truncated at 10 of 100 bytes"));
    }

    #[tokio::test]
    async fn latin1_file_is_read_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("latin1.txt");
        std::fs::write(&file, b"caf\xe9\n").unwrap();
        let out = read_file(&path_str(&file), 1000).await.unwrap();
        assert_eq!(out, "caf\u{fffd}\n");
    }

    #[tokio::test]
    async fn latin1_file_is_refused_for_editing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("latin1.txt");
        std::fs::write(&file, b"caf\xe9\n").unwrap();
        let err = read_text_for_edit(&path_str(&file)).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument { .. }));
        assert!(err.to_string().contains("offset 3"), "{err}");
    }

    #[tokio::test]
    async fn inaccessible_path_is_io_error_not_missing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();
        // A regular file used as a directory component fails with ENOTDIR
        let below = format!("{}/child", path_str(&file));

        assert!(matches!(read_text(&below).await.unwrap_err(), ToolError::Io { .. }));
        assert!(matches!(list_folder(&below).await.unwrap_err(), ToolError::Io { .. }));
        assert!(matches!(create_directory(&below).await.unwrap_err(), ToolError::Io { .. }));
    }

    // ── create_directory ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("parent/child/grandchild");
        let out = create_directory(&path_str(&target)).await.unwrap();
        assert!(target.is_dir());
        assert!(out.contains("Successfully created"));
    }

    #[tokio::test]
    async fn existing_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let out = create_directory(&path_str(dir.path())).await.unwrap();
        assert!(out.contains("already exists"));
    }

    #[tokio::test]
    async fn existing_file_blocks_directory_creation() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, "").unwrap();
        let err = create_directory(&path_str(&file)).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument { .. }));
    }
}
