use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Parse whitespace- or newline-delimited floating point samples, ignoring
/// blank lines and `#` comments.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let content = line.split('#').next().unwrap_or("").trim();
        for token in content.split(|c: char| c.is_whitespace() || c == ',') {
            if token.is_empty() {
                continue;
            }
            let val: f64 = token
                .parse()
                .with_context(|| format!("line {} is not f64: {}", idx + 1, token))?;
            out.push(val);
        }
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

/// Read a floating point series from disk.
pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// Read a floating point series from any reader (e.g. stdin).
pub fn read_f64_series_from(mut reader: impl Read) -> Result<Vec<f64>> {
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .context("failed to read samples")?;
    parse_f64_series(&buf)
}

/// Parse newline-delimited beat indices.
pub fn parse_beat_indices(text: &str) -> Result<Vec<usize>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val: usize = trimmed
            .parse()
            .with_context(|| format!("line {} is not an integer index: {}", idx + 1, trimmed))?;
        out.push(val);
    }
    Ok(out)
}

pub fn read_beat_indices(path: &Path) -> Result<Vec<usize>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_beat_indices(&text)
}
