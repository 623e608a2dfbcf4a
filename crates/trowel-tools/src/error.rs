// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

/// Recoverable failure of a single tool invocation.
///
/// The session converts every variant into a textual report so the agent can
/// correct its next call.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    NotFound(String),

    #[error("The string to replace appears {count} times in {path}. It must be unique: include more surrounding context in old_string and retry.")]
    AmbiguousMatch { path: String, count: usize },

    #[error("Failed to apply diff: {0}")]
    DiffApplication(String),

    #[error("missing required parameter '{0}'")]
    MissingArgument(String),

    #[error("invalid value for parameter '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command timed out after {0}s")]
    Timeout(u64),
}

impl ToolError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument { name: name.to_string(), reason: reason.into() }
    }

    pub(crate) fn diff(msg: impl Into<String>) -> Self {
        Self::DiffApplication(msg.into())
    }
}

/// The agent repeated the exact same call too many times in a row.
///
/// Returned as the `Err` of [`crate::ToolSession::invoke`]; never converted
/// into tool output.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Tool {tool_name} has been called {count} times consecutively with identical arguments. This looks like an infinite loop.")]
pub struct InfiniteLoopDetected {
    pub tool_name: String,
    pub count: u32,
}
