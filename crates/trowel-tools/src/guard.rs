// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::fmt;

use serde_json::Value;
use tracing::error;

use crate::error::InfiniteLoopDetected;

/// Canonical identity of a tool invocation: name plus serialized arguments.
///
/// `serde_json` objects keep their keys sorted, so two calls with the same
/// arguments produce the same fingerprint regardless of key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallFingerprint {
    pub tool_name: String,
    pub serialized_arguments: String,
}

impl ToolCallFingerprint {
    pub fn new(tool_name: &str, args: &Value) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            serialized_arguments: serde_json::to_string(args).unwrap_or_else(|_| "null".into()),
        }
    }
}

impl fmt::Display for ToolCallFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tool_name, self.serialized_arguments)
    }
}

/// Detects an agent stuck repeating the exact same call.
///
/// Only the most recent fingerprint is remembered.  Each guard belongs to one
/// session; never share it between sessions.
#[derive(Debug)]
pub struct LoopGuard {
    max_identical_calls: u32,
    last: Option<ToolCallFingerprint>,
    consecutive: u32,
}

impl LoopGuard {
    pub fn new(max_identical_calls: u32) -> Self {
        Self { max_identical_calls, last: None, consecutive: 0 }
    }

    /// Record an incoming call.  Fails once the same call has been seen more
    /// than `max_identical_calls` times in a row.
    pub fn check(&mut self, tool_name: &str, args: &Value) -> Result<(), InfiniteLoopDetected> {
        let fingerprint = ToolCallFingerprint::new(tool_name, args);

        if self.last.as_ref() == Some(&fingerprint) {
            self.consecutive += 1;
        } else {
            self.last = Some(fingerprint);
            self.consecutive = 1;
        }

        if self.consecutive > self.max_identical_calls {
            error!(tool = %tool_name, count = self.consecutive, "identical tool call loop detected");
            return Err(InfiniteLoopDetected {
                tool_name: tool_name.to_string(),
                count: self.consecutive,
            });
        }
        Ok(())
    }

    /// How many times in a row the most recent call has been seen.
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn last_fingerprint(&self) -> Option<&ToolCallFingerprint> {
        self.last.as_ref()
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.consecutive = 0;
    }
}

impl Default for LoopGuard {
    fn default() -> Self {
        Self::new(3)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
