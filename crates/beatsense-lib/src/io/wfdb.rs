use crate::signal::Waveform;
use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use std::{
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
};

/// Sampling rate assumed when a WFDB header omits it.
pub const WFDB_DEFAULT_FS: f64 = 250.0;

/// Load one lead of a local WFDB record (header plus data file) in physical
/// units, keeping at most `sampto` samples.
pub fn load_wfdb_lead(
    header_path: &Path,
    lead: usize,
    sampto: Option<usize>,
) -> Result<Waveform> {
    if !header_path.is_file() {
        bail!("WFDB header {} does not exist", header_path.display());
    }
    for data_file in signal_files(header_path)? {
        if !data_file.is_file() {
            bail!(
                "WFDB data file {} referenced by {} does not exist",
                data_file.display(),
                header_path.display()
            );
        }
    }
    // The parser panics on data it cannot decode.
    let (header, signals) = panic::catch_unwind(AssertUnwindSafe(|| {
        wfdb_rust::parse_wfdb(header_path)
    }))
    .map_err(|_| anyhow!("failed to decode WFDB record {}", header_path.display()))?;
    if lead >= signals.len() || lead >= header.signal_specs.len() {
        bail!(
            "WFDB record contains {} signals, but lead {} was requested",
            signals.len(),
            lead
        );
    }
    let spec = &header.signal_specs[lead];
    let gain = spec.adc_gain.unwrap_or(1.0) as f64;
    let baseline = spec.baseline.or(spec.adc_zero).unwrap_or(0) as f64;
    let fs = header
        .record
        .sampling_frequency
        .map(|f| f as f64)
        .unwrap_or(WFDB_DEFAULT_FS);
    let raw: Vec<f64> = signals[lead].iter().map(|&sample| sample as f64).collect();
    let data = to_physical(&raw, gain, baseline, sampto);
    debug!(
        "loaded WFDB lead {} from {}: {} samples at {} Hz",
        lead,
        header_path.display(),
        data.len(),
        fs
    );
    Ok(Waveform { fs, data })
}

/// Data files named by the signal lines of a header, resolved against its directory.
fn signal_files(header_path: &Path) -> Result<Vec<PathBuf>> {
    let text = std::fs::read_to_string(header_path)
        .with_context(|| format!("failed to read WFDB header {}", header_path.display()))?;
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));
    let nsig: usize = lines
        .next()
        .and_then(|record| record.split_whitespace().nth(1))
        .and_then(|field| field.parse().ok())
        .ok_or_else(|| anyhow!("malformed WFDB record line in {}", header_path.display()))?;
    let dir = header_path.parent().unwrap_or_else(|| Path::new(""));
    let mut files: Vec<PathBuf> = Vec::with_capacity(nsig);
    for _ in 0..nsig {
        let name = lines
            .next()
            .and_then(|signal| signal.split_whitespace().next())
            .ok_or_else(|| anyhow!("missing WFDB signal line in {}", header_path.display()))?;
        let file = dir.join(name);
        if !files.contains(&file) {
            files.push(file);
        }
    }
    Ok(files)
}

/// Convert ADC counts to physical units.
pub fn to_physical(raw: &[f64], gain: f64, baseline: f64, sampto: Option<usize>) -> Vec<f64> {
    let gain = if gain == 0.0 { 1.0 } else { gain };
    let end = sampto.map_or(raw.len(), |limit| limit.min(raw.len()));
    raw[..end].iter().map(|&adc| (adc - baseline) / gain).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_adc_counts() {
        let raw = [1024.0, 1224.0, 824.0];
        assert_eq!(to_physical(&raw, 200.0, 1024.0, None), vec![0.0, 1.0, -1.0]);
    }

    #[test]
    fn sampto_truncates() {
        let raw = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(to_physical(&raw, 1.0, 0.0, Some(2)), vec![1.0, 2.0]);
        assert_eq!(to_physical(&raw, 1.0, 0.0, Some(10)).len(), 4);
        // Zero gain in a header falls back to unity.
        assert_eq!(to_physical(&raw, 0.0, 1.0, Some(1)), vec![0.0]);
    }

    #[test]
    fn missing_header_is_an_error() {
        assert!(load_wfdb_lead(Path::new("/nonexistent/100.hea"), 0, None).is_err());
    }

    #[test]
    fn header_without_data_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("100.hea");
        std::fs::write(
            &header,
            "# MIT-BIH style\n100 1 250 1000\n100.dat 16 200 11 1024 0 0 0 MLII\n",
        )
        .unwrap();
        let err = load_wfdb_lead(&header, 0, None).unwrap_err();
        assert!(err.to_string().contains("100.dat"), "{err}");
    }

    #[test]
    fn malformed_record_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("bad.hea");
        std::fs::write(&header, "bad\n").unwrap();
        assert!(load_wfdb_lead(&header, 0, None).is_err());
    }

    #[test]
    fn signal_files_are_deduplicated_and_relative() {
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("212.hea");
        std::fs::write(
            &header,
            "212 2 360 650000\n212.dat 212 200 11 1024 0 0 0 MLII\n212.dat 212 200 11 1024 0 0 0 V1\n",
        )
        .unwrap();
        assert_eq!(signal_files(&header).unwrap(), vec![dir.path().join("212.dat")]);
    }
}
