// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::io::ErrorKind;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use trowel_config::ShellConfig;

use crate::error::ToolError;

/// Run `command` in `working_directory` and return its combined output.
///
/// A nonzero exit status is not an error: it is reported in the returned
/// text so the agent can react to it.  Errors are reserved for a missing
/// working directory, a failed spawn and an expired (opt-in) timeout.
pub async fn run(
    cfg: &ShellConfig,
    working_directory: &str,
    command: &str,
) -> Result<String, ToolError> {
    match tokio::fs::metadata(working_directory).await {
        Ok(m) if m.is_dir() => {}
        Ok(_) => {
            return Err(ToolError::NotFound(format!(
                "Working directory {working_directory} is not a directory."
            )))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ToolError::NotFound(format!(
                "Working directory {working_directory} does not exist."
            )))
        }
        Err(e) => {
            return Err(ToolError::io(format!("cannot access working directory {working_directory}"), e))
        }
    }

    debug!(cmd = %command, workdir = %working_directory, "run_shell_command");

    // Redirect stderr onto stdout inside the shell so both streams share one
    // pipe and keep the order the command wrote them in.
    let script = format!("exec 2>&1\n{command}");

    let mut cmd = Command::new(&cfg.program);
    cmd.arg("-c")
        .arg(&script)
        .current_dir(working_directory)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // New session: the child cannot reach the caller's controlling terminal.
    #[cfg(unix)]
    unsafe {
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }

    let output = match cfg.timeout_secs {
        Some(secs) => tokio::time::timeout(std::time::Duration::from_secs(secs), cmd.output())
            .await
            .map_err(|_| ToolError::Timeout(secs))?,
        None => cmd.output().await,
    }
    .map_err(|e| ToolError::io(format!("failed to spawn {}", cfg.program), e))?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    // Only reached when the shell itself writes before `exec 2>&1` runs.
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    let combined = combined.strip_suffix('\n').unwrap_or(&combined);

    let code = output.status.code().unwrap_or(-1);
    debug!(code, bytes = combined.len(), "shell command finished");

    if output.status.success() {
        Ok(combined.to_string())
    } else {
        Ok(format!("Command failed with exit code {code}.\nOutput:\n{combined}"))
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
