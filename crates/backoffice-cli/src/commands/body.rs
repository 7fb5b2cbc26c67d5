//! JSON body arguments.

use std::io::{self, Read};

use anyhow::{Context, Result};
use serde_json::Value;

/// Read a JSON body given inline, as `@path`, or as `-` for stdin.
pub fn read_json(source: &str) -> Result<Value> {
    if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        return serde_json::from_str(&buf).context("Invalid JSON from stdin");
    }

    if let Some(path) = source.strip_prefix('@') {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read JSON file {}", path))?;
        return serde_json::from_str(&content).context("Invalid JSON in file");
    }

    serde_json::from_str(source).context("Invalid JSON body")
}

/// Parse a `key=value` query argument.
pub fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}
