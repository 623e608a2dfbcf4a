// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
pub mod diff;
pub mod file_info;
pub mod fs;
pub mod read_lines;
pub mod replace;
pub mod search;
pub mod shell;
