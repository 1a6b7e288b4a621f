use crate::{
    classify::{classify_with, RhythmClass},
    config::AnalysisConfig,
    detectors::ecg::detect_beats,
    error::Result,
    filters::bandpass_samples,
    metrics::rate::heart_rate_from_rr,
    signal::{validate_fs, BeatIndexSet, RRSeries, Waveform},
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal summary of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub classification: RhythmClass,
    /// Mean heart rate in BPM, rounded to two decimals; 0 when undetermined.
    pub heart_rate: f64,
    pub num_beats: usize,
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2} BPM)", self.classification, self.heart_rate)
    }
}

/// Intermediate products of a run alongside its [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub fs: f64,
    pub sample_count: usize,
    pub detector: String,
    pub beats: BeatIndexSet,
    /// Filtered amplitude at each beat.
    pub beat_amplitudes: Vec<f64>,
    pub rr: RRSeries,
    /// Unrounded mean heart rate (BPM).
    pub heart_rate: f64,
    pub result: AnalysisResult,
}

/// Run filter, beat detector, rate estimator and classifier over raw samples.
pub fn analyze(samples: &[f64], fs: f64, cfg: &AnalysisConfig) -> Result<AnalysisResult> {
    analyze_detailed(samples, fs, cfg).map(|report| report.result)
}

/// [`analyze_detailed`] over a loaded [`Waveform`].
pub fn analyze_waveform_detailed(
    waveform: &Waveform,
    cfg: &AnalysisConfig,
) -> Result<AnalysisReport> {
    analyze_detailed(&waveform.data, waveform.fs, cfg)
}

/// Like [`analyze`], keeping the beat positions and RR intervals.
pub fn analyze_detailed(
    samples: &[f64],
    fs: f64,
    cfg: &AnalysisConfig,
) -> Result<AnalysisReport> {
    validate_fs(fs)?;
    cfg.validate()?;

    let filtered = bandpass_samples(samples, fs, &cfg.filter)?;
    let beats = detect_beats(&filtered, &cfg.detector);
    let rr = RRSeries::from_beats(&beats, fs);
    let heart_rate = heart_rate_from_rr(&rr)?;
    let classification = classify_with(heart_rate, &cfg.classifier);
    debug!(
        "analyzed {} samples at {fs} Hz: {} beats, {heart_rate:.2} BPM, {classification}",
        samples.len(),
        beats.len()
    );

    let result = AnalysisResult {
        classification,
        heart_rate: round_to_hundredths(heart_rate),
        num_beats: beats.len(),
    };
    Ok(AnalysisReport {
        fs,
        sample_count: samples.len(),
        detector: cfg.detector.name().to_string(),
        beat_amplitudes: filtered.amplitudes_at(&beats),
        beats,
        rr,
        heart_rate,
        result,
    })
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
