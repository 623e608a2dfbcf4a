// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "trowel",
    about = "File and shell tools for coding agents",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (merged over auto-discovered layers)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the available tools and their parameters
    Tools {
        /// Print the tool schemas as JSON
        #[arg(long)]
        json: bool,
    },
    /// Invoke a single tool and print its result.
    ///
    /// Failures are printed as the same report an agent would receive and
    /// make the command exit with status 1.
    Call {
        /// Tool name, e.g. "get_file_lines"
        tool: String,
        /// Arguments as a JSON object
        #[arg(long, short = 'a', value_name = "JSON", default_value = "{}")]
        args: String,
    },
    /// Run tool calls read from stdin, one JSON object per line.
    ///
    /// Each line looks like {"id": "1", "name": "<tool>", "args": {...}}.
    /// Every result is written to stdout as one JSON line.  The session
    /// stops with a nonzero status when an identical call repeats too often.
    Session,
    /// Print the effective configuration and exit
    ShowConfig,
    /// Generate shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "trowel", &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn call_parses_tool_and_args() {
        let cli = Cli::parse_from(["trowel", "-v", "call", "get_file_info", "--args", r#"{"path":"x"}"#]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Call { tool, args } => {
                assert_eq!(tool, "get_file_info");
                assert_eq!(args, r#"{"path":"x"}"#);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["trowel", "session", "--config", "/tmp/t.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/t.toml")));
        assert!(matches!(cli.command, Commands::Session));
    }
}
