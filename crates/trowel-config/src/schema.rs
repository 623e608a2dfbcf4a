// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Number of consecutive identical tool calls tolerated before the loop
    /// guard aborts the session.  The call after this many repeats fails.
    pub max_identical_calls: u32,
    /// Context lines shown around each match by `search_in_file` when the
    /// caller does not pass `context_lines`.
    pub search_context_lines: usize,
    /// Byte ceiling for `get_file_content` output.
    pub read_limit_bytes: usize,
    #[serde(default)]
    pub shell: ShellConfig,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            max_identical_calls: 3,
            search_context_lines: 3,
            read_limit_bytes: 200_000,
            shell: ShellConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Interpreter invoked as `<program> -c <command>`.
    pub program: String,
    /// Optional wall-clock limit for `run_shell_command`.
    ///
    /// Unset by default: a command that never exits blocks the session.
    pub timeout_secs: Option<u64>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: "bash".into(),
            timeout_secs: None,
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
