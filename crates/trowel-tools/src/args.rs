// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Typed access to the named arguments of a tool call.
use serde_json::Value;

use crate::error::ToolError;

pub(crate) fn require_str<'a>(args: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Err(ToolError::MissingArgument(name.to_string())),
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ToolError::invalid(name, format!("expected a string, got {other}"))),
    }
}

pub(crate) fn optional_int(args: &Value, name: &str) -> Result<Option<i64>, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ToolError::invalid(name, format!("expected an integer, got {n}"))),
        // Integers sometimes arrive quoted
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ToolError::invalid(name, format!("expected an integer, got \"{s}\""))),
        Some(other) => Err(ToolError::invalid(name, format!("expected an integer, got {other}"))),
    }
}

pub(crate) fn require_int(args: &Value, name: &str) -> Result<i64, ToolError> {
    optional_int(args, name)?.ok_or_else(|| ToolError::MissingArgument(name.to_string()))
}
