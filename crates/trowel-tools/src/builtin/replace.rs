// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use tracing::debug;

use crate::builtin::fs::{read_text_for_edit, write_text};
use crate::error::ToolError;

/// Replace the single occurrence of `old_string` in `path` with `new_string`
/// and return the new file content.
///
/// Zero or multiple occurrences fail without touching the file.
pub async fn replace(path: &str, old_string: &str, new_string: &str) -> Result<String, ToolError> {
    if old_string.is_empty() {
        return Err(ToolError::invalid("old_string", "must not be empty"));
    }
    debug!(path = %path, old_len = old_string.len(), new_len = new_string.len(), "replace_in_file");

    let content = read_text_for_edit(path).await?;
    let updated = replace_unique(path, &content, old_string, new_string)?;
    write_text(path, &updated).await?;
    Ok(updated)
}

fn replace_unique(
    path: &str,
    content: &str,
    old_string: &str,
    new_string: &str,
) -> Result<String, ToolError> {
    match content.matches(old_string).count() {
        0 => Err(ToolError::NotFound(format!(
            "The string \"{old_string}\" was not found in {path}. \
             Re-read the file and copy the text exactly, including whitespace."
        ))),
        1 => Ok(content.replacen(old_string, new_string, 1)),
        count => Err(ToolError::AmbiguousMatch { path: path.to_string(), count }),
    }
}
