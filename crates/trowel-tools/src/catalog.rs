// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::Serialize;
use serde_json::{json, Map, Value};

use trowel_config::ToolsConfig;

use crate::args::{optional_int, require_int, require_str};
use crate::builtin::{diff, file_info, fs, read_lines, replace, search, shell};
use crate::error::ToolError;
use crate::tool::{ParameterKind, ParameterSpec};

/// The closed set of operations an agent may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GetFolderContent,
    GetFileContent,
    GetFileInfo,
    GetFileLines,
    SearchInFile,
    ReplaceInFile,
    ApplyDiffToFile,
    CreateDirectory,
    RunShellCommand,
}

const fn string(name: &'static str, description: &'static str) -> ParameterSpec {
    ParameterSpec { name, description, kind: ParameterKind::String, required: true }
}

const fn integer(name: &'static str, description: &'static str) -> ParameterSpec {
    ParameterSpec { name, description, kind: ParameterKind::Integer, required: true }
}

const PATH_ONLY: &[ParameterSpec] = &[string("path", "Absolute or relative path")];

const FILE_LINES: &[ParameterSpec] = &[
    string("path", "Absolute or relative path to the file"),
    integer("start_line", "First line to return (1-indexed)"),
    integer("end_line", "Last line to return, inclusive"),
];

const SEARCH: &[ParameterSpec] = &[
    string("path", "Absolute or relative path to the file"),
    string("pattern", "Text to look for (case-insensitive)"),
    ParameterSpec {
        name: "context_lines",
        description: "Lines of context around each match (default 3)",
        kind: ParameterKind::Integer,
        required: false,
    },
];

const REPLACE: &[ParameterSpec] = &[
    string("path", "Absolute or relative path to the file"),
    string("old_string", "Exact text to replace; must occur exactly once"),
    string("new_string", "Replacement text"),
];

const APPLY_DIFF: &[ParameterSpec] = &[
    string("path", "Absolute or relative path to the file"),
    string("diff", "Unified diff with @@ hunks; context lines must match the file"),
];

const SHELL: &[ParameterSpec] = &[
    string("working_directory", "Existing directory to run the command in"),
    string("command", "Shell command line"),
];

impl ToolKind {
    pub const ALL: [ToolKind; 9] = [
        ToolKind::GetFolderContent,
        ToolKind::GetFileContent,
        ToolKind::GetFileInfo,
        ToolKind::GetFileLines,
        ToolKind::SearchInFile,
        ToolKind::ReplaceInFile,
        ToolKind::ApplyDiffToFile,
        ToolKind::CreateDirectory,
        ToolKind::RunShellCommand,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::GetFolderContent => "get_folder_content",
            ToolKind::GetFileContent => "get_file_content",
            ToolKind::GetFileInfo => "get_file_info",
            ToolKind::GetFileLines => "get_file_lines",
            ToolKind::SearchInFile => "search_in_file",
            ToolKind::ReplaceInFile => "replace_in_file",
            ToolKind::ApplyDiffToFile => "apply_diff_to_file",
            ToolKind::CreateDirectory => "create_directory",
            ToolKind::RunShellCommand => "run_shell_command",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::GetFolderContent => {
                "List the entries of a directory, sorted by name. Directories end with '/'."
            }
            ToolKind::GetFileContent => "Read the full text content of a file.",
            ToolKind::GetFileInfo => "Show the line count, size and extension of a file.",
            ToolKind::GetFileLines => {
                "Read a 1-indexed, inclusive range of lines from a file, each prefixed with its line number."
            }
            ToolKind::SearchInFile => {
                "Case-insensitive substring search in a file. Shows each matching line with surrounding context."
            }
            ToolKind::ReplaceInFile => {
                "Replace text in a file. old_string must appear exactly once; \
                 include enough surrounding lines to make it unique."
            }
            ToolKind::ApplyDiffToFile => {
                "Apply a unified diff to a file. Hunks are located by their context and \
                 removed lines, not by line numbers. The file is left unchanged if any hunk fails."
            }
            ToolKind::CreateDirectory => "Create a directory and any missing parents.",
            ToolKind::RunShellCommand => {
                "Run a shell command in a working directory and return its combined stdout and stderr."
            }
        }
    }

    pub fn parameters(self) -> &'static [ParameterSpec] {
        match self {
            ToolKind::GetFolderContent
            | ToolKind::GetFileContent
            | ToolKind::GetFileInfo
            | ToolKind::CreateDirectory => PATH_ONLY,
            ToolKind::GetFileLines => FILE_LINES,
            ToolKind::SearchInFile => SEARCH,
            ToolKind::ReplaceInFile => REPLACE,
            ToolKind::ApplyDiffToFile => APPLY_DIFF,
            ToolKind::RunShellCommand => SHELL,
        }
    }

    /// JSON Schema object describing the parameters
    pub fn parameters_schema(self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for p in self.parameters() {
            properties.insert(
                p.name.to_string(),
                json!({ "type": p.kind.json_type(), "description": p.description }),
            );
            if p.required {
                required.push(Value::String(p.name.to_string()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Decode `args` and run the operation.
    pub async fn invoke(self, cfg: &ToolsConfig, args: &Value) -> Result<String, ToolError> {
        match self {
            ToolKind::GetFolderContent => fs::list_folder(require_str(args, "path")?).await,
            ToolKind::GetFileContent => {
                fs::read_file(require_str(args, "path")?, cfg.read_limit_bytes).await
            }
            ToolKind::GetFileInfo => {
                Ok(file_info::file_info(require_str(args, "path")?).await?.to_string())
            }
            ToolKind::GetFileLines => {
                let path = require_str(args, "path")?;
                let start = require_int(args, "start_line")?;
                let end = require_int(args, "end_line")?;
                read_lines::read_lines(path, start, end).await
            }
            ToolKind::SearchInFile => {
                let path = require_str(args, "path")?;
                let pattern = require_str(args, "pattern")?;
                let context = match optional_int(args, "context_lines")? {
                    None => cfg.search_context_lines,
                    Some(n) => usize::try_from(n)
                        .map_err(|_| ToolError::invalid("context_lines", "must not be negative"))?,
                };
                search::search(path, pattern, context).await
            }
            ToolKind::ReplaceInFile => {
                let path = require_str(args, "path")?;
                let old = require_str(args, "old_string")?;
                let new = require_str(args, "new_string")?;
                replace::replace(path, old, new).await
            }
            ToolKind::ApplyDiffToFile => {
                let path = require_str(args, "path")?;
                let diff_text = require_str(args, "diff")?;
                diff::apply_diff_to_file(path, diff_text).await
            }
            ToolKind::CreateDirectory => fs::create_directory(require_str(args, "path")?).await,
            ToolKind::RunShellCommand => {
                let wd = require_str(args, "working_directory")?;
                let command = require_str(args, "command")?;
                shell::run(&cfg.shell, wd, command).await
            }
        }
    }

    pub fn schema(self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }

    /// Schemas of every tool, sorted by name.
    pub fn schemas() -> Vec<ToolSchema> {
        let mut out: Vec<ToolSchema> = Self::ALL.into_iter().map(Self::schema).collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }
}

/// Describes one tool for the agent's model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_name() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("delete_everything"), None);
    }

    #[test]
    fn schemas_are_sorted_and_complete() {
        let schemas = ToolKind::schemas();
        assert_eq!(schemas.len(), 9);
        let names: Vec<&str> = schemas.iter().map(|s| s.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn search_schema_marks_context_lines_optional() {
        let schema = ToolKind::SearchInFile.parameters_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["context_lines"]["type"], "integer");
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("path")));
        assert!(required.contains(&json!("pattern")));
        assert!(!required.contains(&json!("context_lines")));
    }

    #[test]
    fn shell_schema_requires_both_parameters() {
        let schema = ToolKind::RunShellCommand.parameters_schema();
        assert_eq!(schema["required"], json!(["working_directory", "command"]));
    }

    #[tokio::test]
    async fn missing_argument_is_reported() {
        let err = ToolKind::GetFileLines
            .invoke(&ToolsConfig::default(), &json!({"path": "/tmp/x", "start_line": 1}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingArgument(ref n) if n == "end_line"));
    }

    #[tokio::test]
    async fn quoted_line_numbers_are_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, "a\nb\nc\n").unwrap();
        let args = json!({
            "path": file.to_string_lossy(),
            "start_line": "2",
            "end_line": 2,
        });
        let out = ToolKind::GetFileLines.invoke(&ToolsConfig::default(), &args).await.unwrap();
        assert_eq!(out, "2 | b");
    }

    #[tokio::test]
    async fn negative_context_lines_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, "a\n").unwrap();
        let args = json!({"path": file.to_string_lossy(), "pattern": "a", "context_lines": -1});
        let err = ToolKind::SearchInFile.invoke(&ToolsConfig::default(), &args).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn search_uses_configured_default_context() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, "1\n2\n3\nneedle\n5\n6\n7\n").unwrap();
        let cfg = ToolsConfig { search_context_lines: 1, ..ToolsConfig::default() };
        let args = json!({"path": file.to_string_lossy(), "pattern": "needle"});
        let out = ToolKind::SearchInFile.invoke(&cfg, &args).await.unwrap();
        assert!(out.contains("    3 | 3"));
        assert!(out.contains("    5 | 5"));
        assert!(!out.contains("    2 | 2"));
    }

    #[tokio::test]
    async fn undeclared_arguments_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new");
        let args = json!({"path": path.to_string_lossy(), "mode": "0755"});
        let out = ToolKind::CreateDirectory.invoke(&ToolsConfig::default(), &args).await.unwrap();
        assert!(out.starts_with("Successfully created directory"));
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn file_info_is_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.md");
        std::fs::write(&file, "x\ny\n").unwrap();
        let args = json!({"path": file.to_string_lossy()});
        let out = ToolKind::GetFileInfo.invoke(&ToolsConfig::default(), &args).await.unwrap();
        assert!(out.contains("Lines: 2"));
        assert!(out.contains("Extension: md"));
    }
}
