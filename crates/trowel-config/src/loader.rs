// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::Config;

/// Ordered list of config file locations searched from lowest to highest priority.
/// Later files override earlier ones.
fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/trowel/config.toml")];

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config/trowel/config.toml"));
    }
    if let Some(cfg) = dirs::config_dir() {
        paths.push(cfg.join("trowel/config.toml"));
    }

    // Workspace-local
    paths.push(PathBuf::from(".trowel/config.toml"));
    paths.push(PathBuf::from("trowel.toml"));

    paths
}

fn read_layer(path: &Path) -> anyhow::Result<toml::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Load configuration by merging all discovered TOML files.
/// `extra` is an explicit path (the `--config` flag) and must exist when given.
pub fn load(extra: Option<&Path>) -> anyhow::Result<Config> {
    let mut merged = toml::Value::Table(toml::map::Map::new());

    for path in config_search_paths() {
        if path.is_file() {
            debug!(path = %path.display(), "loading config layer");
            merge_toml(&mut merged, read_layer(&path)?);
        }
    }

    if let Some(p) = extra {
        debug!(path = %p.display(), "loading explicit config");
        merge_toml(&mut merged, read_layer(p)?);
    }

    merged.try_into().context("invalid configuration")
}

/// Deep-merge `src` into `dst`; src wins on scalar conflicts.
fn merge_toml(dst: &mut toml::Value, src: toml::Value) {
    match (dst, src) {
        (toml::Value::Table(d), toml::Value::Table(s)) => {
            for (k, v) in s {
                match d.get_mut(&k) {
                    Some(existing) => merge_toml(existing, v),
                    None => {
                        d.insert(k, v);
                    }
                }
            }
        }
        (dst, src) => *dst = src,
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn val(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn merge_scalar_src_wins() {
        let mut dst = val(r#"x = 1"#);
        merge_toml(&mut dst, val(r#"x = 2"#));
        assert_eq!(dst["x"].as_integer(), Some(2));
    }

    #[test]
    fn merge_nested_tables() {
        let mut dst = val(r#"[tools]
max_identical_calls = 3
search_context_lines = 3"#);
        let src = val(r#"[tools]
search_context_lines = 5"#);
        merge_toml(&mut dst, src);
        assert_eq!(dst["tools"]["max_identical_calls"].as_integer(), Some(3));
        assert_eq!(dst["tools"]["search_context_lines"].as_integer(), Some(5));
    }

    #[test]
    fn missing_explicit_path_is_error() {
        let result = load(Some(Path::new("/tmp/trowel_nonexistent_config_xyz.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, r#"[tools]
max_identical_calls = 7

[tools.shell]
timeout_secs = 15"#).unwrap();
        let cfg = load(Some(f.path())).unwrap();
        assert_eq!(cfg.tools.max_identical_calls, 7);
        assert_eq!(cfg.tools.shell.timeout_secs, Some(15));
        assert_eq!(cfg.tools.shell.program, "bash");
    }

    #[test]
    fn malformed_file_reports_path() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[tools\nbroken").unwrap();
        let err = load(Some(f.path())).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }
}
