use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Lower edge of the cardiac band (Hz); removes baseline wander.
pub const DEFAULT_LOW_CUTOFF_HZ: f64 = 0.5;
/// Upper edge of the cardiac band (Hz); removes muscle and mains noise.
pub const DEFAULT_HIGH_CUTOFF_HZ: f64 = 40.0;
/// Fraction of the global maximum a sample must exceed to count as a beat candidate.
pub const DEFAULT_THRESHOLD_FRACTION: f64 = 0.6;
/// Refractory window after an accepted beat (seconds).
pub const DEFAULT_REFRACTORY_S: f64 = 0.1;
/// Fraction of the mean absolute amplitude a local maximum must exceed.
pub const DEFAULT_MEAN_FRACTION: f64 = 0.8;
/// Minimum spacing between retained local maxima (seconds).
pub const DEFAULT_MIN_SEPARATION_S: f64 = 0.6;
/// Peaks at or below this amplitude are treated as a flat line.
pub const DEFAULT_AMPLITUDE_FLOOR: f64 = 1e-9;
/// Rates strictly below this are bradycardic (BPM).
pub const BRADYCARDIA_BELOW_BPM: f64 = 60.0;
/// Rates strictly above this are tachycardic (BPM).
pub const TACHYCARDIA_ABOVE_BPM: f64 = 100.0;

/// Full configuration of one analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub filter: BandpassConfig,
    pub detector: DetectorConfig,
    pub classifier: ClassifierThresholds,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        self.detector.validate()?;
        self.classifier.validate()
    }
}

/// Band edges of the zero-phase Butterworth band-pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandpassConfig {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl Default for BandpassConfig {
    fn default() -> Self {
        Self {
            low_hz: DEFAULT_LOW_CUTOFF_HZ,
            high_hz: DEFAULT_HIGH_CUTOFF_HZ,
        }
    }
}

impl BandpassConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.low_hz.is_finite() && self.high_hz.is_finite()) || self.low_hz >= self.high_hz {
            return Err(AnalysisError::InvalidParameter(format!(
                "band edges must satisfy low < high, got {} Hz and {} Hz",
                self.low_hz, self.high_hz
            )));
        }
        Ok(())
    }
}

/// Beat detection strategy and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum DetectorConfig {
    /// Global threshold with refractory suppression.
    Threshold(ThresholdConfig),
    /// Local maxima with amplitude gate and minimum separation.
    LocalMaxima(LocalMaximaConfig),
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig::Threshold(ThresholdConfig::default())
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        match self {
            DetectorConfig::Threshold(cfg) => cfg.validate(),
            DetectorConfig::LocalMaxima(cfg) => cfg.validate(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DetectorConfig::Threshold(_) => "threshold",
            DetectorConfig::LocalMaxima(_) => "local-maxima",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Fraction of the global maximum, in (0, 1].
    pub fraction: f64,
    /// Refractory window (seconds).
    pub refractory_s: f64,
    pub amplitude_floor: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            fraction: DEFAULT_THRESHOLD_FRACTION,
            refractory_s: DEFAULT_REFRACTORY_S,
            amplitude_floor: DEFAULT_AMPLITUDE_FLOOR,
        }
    }
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<()> {
        check_fraction("threshold fraction", self.fraction)?;
        check_non_negative("refractory window", self.refractory_s)?;
        check_non_negative("amplitude floor", self.amplitude_floor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalMaximaConfig {
    /// Fraction of the mean absolute amplitude, in (0, 1].
    pub mean_fraction: f64,
    /// Minimum spacing between retained maxima (seconds).
    pub min_separation_s: f64,
    pub amplitude_floor: f64,
}

impl Default for LocalMaximaConfig {
    fn default() -> Self {
        Self {
            mean_fraction: DEFAULT_MEAN_FRACTION,
            min_separation_s: DEFAULT_MIN_SEPARATION_S,
            amplitude_floor: DEFAULT_AMPLITUDE_FLOOR,
        }
    }
}

impl LocalMaximaConfig {
    pub fn validate(&self) -> Result<()> {
        check_fraction("mean fraction", self.mean_fraction)?;
        check_non_negative("minimum separation", self.min_separation_s)?;
        check_non_negative("amplitude floor", self.amplitude_floor)
    }
}

/// Rate boundaries of the rhythm classifier. Both bounds belong to the normal range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    pub bradycardia_below_bpm: f64,
    pub tachycardia_above_bpm: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            bradycardia_below_bpm: BRADYCARDIA_BELOW_BPM,
            tachycardia_above_bpm: TACHYCARDIA_ABOVE_BPM,
        }
    }
}

impl ClassifierThresholds {
    pub fn validate(&self) -> Result<()> {
        check_non_negative("bradycardia bound", self.bradycardia_below_bpm)?;
        if self.tachycardia_above_bpm < self.bradycardia_below_bpm
            || !self.tachycardia_above_bpm.is_finite()
        {
            return Err(AnalysisError::InvalidParameter(format!(
                "tachycardia bound {} must not be below bradycardia bound {}",
                self.tachycardia_above_bpm, self.bradycardia_below_bpm
            )));
        }
        Ok(())
    }
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidParameter(format!(
            "{name} must be in (0, 1], got {value}"
        )))
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidParameter(format!(
            "{name} must be a non-negative number, got {value}"
        )))
    }
}
