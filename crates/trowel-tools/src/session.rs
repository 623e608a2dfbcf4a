// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::fmt;

use tracing::{debug, warn};

use trowel_config::ToolsConfig;

use crate::catalog::ToolKind;
use crate::error::InfiniteLoopDetected;
use crate::guard::LoopGuard;
use crate::tool::{ToolCall, ToolOutput};

/// Diagnostic returned to the agent in place of a failed tool's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolErrorReport {
    pub message: String,
    pub tool_name: String,
    pub provided_argument_names: Vec<String>,
    /// `(name, required)` for each declared parameter
    pub expected_parameters: Vec<(String, bool)>,
}

impl ToolErrorReport {
    pub fn new(message: impl Into<String>, kind: ToolKind, call: &ToolCall) -> Self {
        Self {
            message: message.into(),
            tool_name: kind.name().to_string(),
            provided_argument_names: call.argument_names(),
            expected_parameters: kind
                .parameters()
                .iter()
                .map(|p| (p.name.to_string(), p.required))
                .collect(),
        }
    }

    pub fn unknown_tool(call: &ToolCall) -> Self {
        let known: Vec<&str> = ToolKind::ALL.iter().map(|k| k.name()).collect();
        Self {
            message: format!(
                "Unknown tool '{}'. Available tools: {}",
                call.name,
                known.join(", ")
            ),
            tool_name: call.name.clone(),
            provided_argument_names: call.argument_names(),
            expected_parameters: Vec::new(),
        }
    }
}

impl fmt::Display for ToolErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let provided = if self.provided_argument_names.is_empty() {
            "(none provided)".to_string()
        } else {
            self.provided_argument_names.join(", ")
        };
        let expected = if self.expected_parameters.is_empty() {
            "(unknown)".to_string()
        } else {
            self.expected_parameters
                .iter()
                .map(|(name, required)| {
                    format!("{name} ({})", if *required { "required" } else { "optional" })
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "Error: {}\n\nTool: {}\nParameters you provided: {}\nParameters this tool expects: {}\n\n\
             Please check the tool definition and provide the correct parameters.",
            self.message, self.tool_name, provided, expected
        )
    }
}

/// One agent's sequence of tool calls.
///
/// Runs every call through the loop guard, dispatches it, and turns tool
/// failures into [`ToolErrorReport`] text.  Only [`InfiniteLoopDetected`]
/// escapes as an error.
#[derive(Debug)]
pub struct ToolSession {
    config: ToolsConfig,
    guard: LoopGuard,
}

impl ToolSession {
    pub fn new(config: ToolsConfig) -> Self {
        let guard = LoopGuard::new(config.max_identical_calls);
        Self { config, guard }
    }

    /// Forget the loop guard's history, e.g. at the start of a new task.
    pub fn reset(&mut self) {
        self.guard.reset();
    }

    pub async fn invoke(&mut self, call: &ToolCall) -> Result<ToolOutput, InfiniteLoopDetected> {
        self.guard.check(&call.name, &call.args)?;

        let Some(kind) = ToolKind::from_name(&call.name) else {
            warn!(tool = %call.name, "unknown tool");
            let report = ToolErrorReport::unknown_tool(call);
            return Ok(ToolOutput::err(&call.id, report.to_string()));
        };

        debug!(tool = %call.name, id = %call.id, "invoking tool");
        match kind.invoke(&self.config, &call.args).await {
            Ok(content) => Ok(ToolOutput::ok(&call.id, content)),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool failed");
                let report = ToolErrorReport::new(e.to_string(), kind, call);
                Ok(ToolOutput::err(&call.id, report.to_string()))
            }
        }
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
