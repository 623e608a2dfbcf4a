// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::builtin::fs::read_text;
use crate::error::ToolError;

/// Metadata about a text file, cheap enough to fetch before deciding how to
/// read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: String,
    pub line_count: usize,
    pub size_bytes: u64,
    /// `None` when the file name has no extension.
    pub extension: Option<String>,
}

impl fmt::Display for FileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "File: {}\nLines: {}\nSize: {} bytes\nExtension: {}",
            self.path,
            self.line_count,
            self.size_bytes,
            self.extension.as_deref().unwrap_or("(none)")
        )
    }
}

pub async fn file_info(path: &str) -> Result<FileInfo, ToolError> {
    debug!(path = %path, "get_file_info");
    let content = read_text(path).await?;
    let size_bytes = tokio::fs::metadata(path)
        .await
        .map(|m| m.len())
        .unwrap_or(content.len() as u64);
    let extension = Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .filter(|e| !e.is_empty());

    Ok(FileInfo {
        path: path.to_string(),
        line_count: content.lines().count(),
        size_bytes,
        extension,
    })
}
