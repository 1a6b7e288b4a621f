use anyhow::{anyhow, bail, Context, Result};
use csv::{ReaderBuilder, Trim};
use std::path::Path;
use std::str::FromStr;

/// Column of a delimited file, by header name or zero-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvColumn {
    Name(String),
    Index(usize),
}

impl FromStr for CsvColumn {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().parse::<usize>() {
            Ok(idx) => CsvColumn::Index(idx),
            Err(_) => CsvColumn::Name(s.trim().to_string()),
        })
    }
}

/// Load one numeric column from a delimited file with a header row.
pub fn read_column(path: &Path, column: &CsvColumn, delimiter: u8) -> Result<Vec<f64>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let idx = match column {
        CsvColumn::Index(idx) => *idx,
        CsvColumn::Name(name) => reader
            .headers()
            .with_context(|| format!("failed to read header of {}", path.display()))?
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("column '{}' not found in {}", name, path.display()))?,
    };

    let mut out = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("bad record {} in {}", row + 2, path.display()))?;
        let field = record
            .get(idx)
            .ok_or_else(|| anyhow!("row {} has no column {}", row + 2, idx))?;
        let val: f64 = field
            .parse()
            .with_context(|| format!("row {} column {} is not f64: {}", row + 2, idx, field))?;
        out.push(val);
    }
    if out.is_empty() {
        bail!("no numeric samples found in {}", path.display());
    }
    Ok(out)
}
