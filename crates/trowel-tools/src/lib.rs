// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod args;
mod catalog;
mod error;
mod guard;
mod session;
mod tool;

pub mod builtin;

pub use builtin::diff::{apply_diff, DiffHunk, HunkLine};
pub use builtin::file_info::FileInfo;
pub use builtin::search::SearchMatch;
pub use catalog::{ToolKind, ToolSchema};
pub use error::{InfiniteLoopDetected, ToolError};
pub use guard::{LoopGuard, ToolCallFingerprint};
pub use session::{ToolErrorReport, ToolSession};
pub use tool::{ParameterSpec, ToolCall, ToolOutput};
