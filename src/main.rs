// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use clap::Parser;
use cli::{Cli, Commands};
use trowel_tools::{ToolCall, ToolKind, ToolSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match &cli.command {
        Commands::Completions { shell } => {
            cli::print_completions(*shell);
            Ok(())
        }
        Commands::Tools { json } => list_tools(*json),
        Commands::ShowConfig => {
            let config = trowel_config::load(cli.config.as_deref())?;
            println!("{}", serde_yaml::to_string(&config).unwrap_or_default());
            Ok(())
        }
        Commands::Call { tool, args } => {
            let config = trowel_config::load(cli.config.as_deref())?;
            call_once(config.tools, tool, args).await
        }
        Commands::Session => {
            let config = trowel_config::load(cli.config.as_deref())?;
            run_session(ToolSession::new(config.tools)).await
        }
    }
}

/// Print the tool catalogue, as a table or as JSON schemas.
fn list_tools(as_json: bool) -> anyhow::Result<()> {
    let schemas = ToolKind::schemas();
    if as_json {
        println!("{}", serde_json::to_string_pretty(&schemas)?);
        return Ok(());
    }

    println!("Available tools ({} total)\n", schemas.len());
    for schema in &schemas {
        let Some(kind) = ToolKind::from_name(&schema.name) else { continue };
        println!("  {}", kind.name());
        println!("    {}", kind.description());
        for p in kind.parameters() {
            let req = if p.required { "required" } else { "optional" };
            println!("    - {} ({}, {}): {}", p.name, p.kind.json_type(), req, p.description);
        }
        println!();
    }
    Ok(())
}

async fn call_once(config: trowel_config::ToolsConfig, tool: &str, args: &str) -> anyhow::Result<()> {
    let args: Value = serde_json::from_str(args)
        .with_context(|| format!("parsing --args as JSON: {args}"))?;
    let call = ToolCall { id: "cli".into(), name: tool.to_string(), args };

    let mut session = ToolSession::new(config);
    let output = session.invoke(&call).await?;
    if output.is_error {
        eprintln!("{}", output.content);
        std::process::exit(1);
    }
    println!("{}", output.content);
    Ok(())
}

/// One line of `trowel session` input.
#[derive(Debug, Deserialize)]
struct SessionRequest {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Value,
}

/// One line of `trowel session` output.
#[derive(Debug, Serialize)]
struct SessionResponse {
    id: String,
    is_error: bool,
    content: String,
}

async fn run_session(mut session: ToolSession) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<SessionRequest>(&line) {
            Ok(req) => {
                let call = ToolCall {
                    id: req.id.unwrap_or_else(|| line_no.to_string()),
                    name: req.name,
                    args: req.args,
                };
                debug!(line = line_no, tool = %call.name, "session request");
                // Loop detection ends the session; everything else is reported inline.
                let out = session.invoke(&call).await?;
                SessionResponse { id: out.call_id, is_error: out.is_error, content: out.content }
            }
            Err(e) => {
                warn!(line = line_no, error = %e, "malformed session request");
                SessionResponse {
                    id: line_no.to_string(),
                    is_error: true,
                    content: format!(
                        "Error: line {line_no} is not a valid tool call: {e}\n\n\
                         Expected {{\"id\": \"..\", \"name\": \"<tool>\", \"args\": {{..}}}}"
                    ),
                }
            }
        };
        println!("{}", serde_json::to_string(&response)?);
    }
    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
