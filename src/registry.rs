// src/registry.rs
//! Newline-delimited registries: channel ids for harvesting, raw feed URLs for
//! the mixed feed. Both are re-read on every use, never cached.

use anyhow::{Context, Result};
use std::path::Path;

/// Read a registry file into its non-empty lines.
pub async fn load_lines(path: &Path) -> Result<Vec<String>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading registry {}", path.display()))?;
    Ok(parse_lines(&content))
}

/// Trim each line, skip blanks and `#` comments, keep first-seen order.
pub fn parse_lines(content: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter(|l| seen.insert(l.to_string()))
        .map(str::to_string)
        .collect()
}
