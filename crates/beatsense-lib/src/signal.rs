use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Raw single-channel recording with a uniform sampling rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl Waveform {
    pub fn new(data: Vec<f64>, fs: f64) -> Self {
        Self { fs, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Rejects a non-positive or non-finite sampling rate.
    pub fn validate(&self) -> Result<()> {
        validate_fs(self.fs)
    }
}

pub(crate) fn validate_fs(fs: f64) -> Result<()> {
    if fs.is_finite() && fs > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidParameter(format!(
            "sampling rate must be a positive number of Hz, got {fs}"
        )))
    }
}

/// Output of the zero-phase band-pass stage.
///
/// Same length and sampling rate as the [`Waveform`] it was computed from; only
/// the band-pass filter constructs one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredWaveform {
    pub fs: f64,
    pub data: Vec<f64>,
}

impl FilteredWaveform {
    pub(crate) fn new(data: Vec<f64>, fs: f64) -> Self {
        Self { fs, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn max(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::max)
    }

    pub fn min(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::min)
    }

    /// Amplitudes at the given beat positions.
    pub fn amplitudes_at(&self, beats: &BeatIndexSet) -> Vec<f64> {
        beats
            .indices
            .iter()
            .filter_map(|&i| self.data.get(i).copied())
            .collect()
    }
}

/// Detected beats (R-peaks) as strictly increasing sample indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatIndexSet {
    pub indices: Vec<usize>,
}

impl BeatIndexSet {
    pub fn from_indices(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Checks ordering, bounds and the minimum spacing between beats.
    pub fn is_well_formed(&self, sample_count: usize, min_distance: usize) -> bool {
        let in_bounds = self.indices.iter().all(|&i| i < sample_count);
        let spaced = self
            .indices
            .windows(2)
            .all(|w| w[1] > w[0] && w[1] - w[0] >= min_distance.max(1));
        in_bounds && spaced
    }
}

/// RR intervals (seconds)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RRSeries {
    pub rr: Vec<f64>,
}

impl RRSeries {
    pub fn from_beats(beats: &BeatIndexSet, fs: f64) -> Self {
        let rr = beats
            .indices
            .windows(2)
            .map(|w| (w[1] as f64 - w[0] as f64) / fs)
            .collect();
        Self { rr }
    }

    pub fn len(&self) -> usize {
        self.rr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rr.is_empty()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.rr.is_empty() {
            None
        } else {
            Some(self.rr.iter().sum::<f64>() / self.rr.len() as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_sampling_rate() {
        assert!(Waveform::new(vec![0.0; 4], 0.0).validate().is_err());
        assert!(Waveform::new(vec![0.0; 4], -250.0).validate().is_err());
        assert!(Waveform::new(vec![0.0; 4], f64::NAN).validate().is_err());
        assert!(Waveform::new(vec![0.0; 4], 250.0).validate().is_ok());
    }

    #[test]
    fn rr_intervals_are_in_seconds() {
        let beats = BeatIndexSet::from_indices(vec![0, 250, 500, 875]);
        let rr = RRSeries::from_beats(&beats, 250.0);
        assert_eq!(rr.rr, vec![1.0, 1.0, 1.5]);
        assert!((rr.mean().unwrap() - 3.5 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn well_formed_beats_respect_spacing() {
        let beats = BeatIndexSet::from_indices(vec![10, 40, 90]);
        assert!(beats.is_well_formed(100, 30));
        assert!(!beats.is_well_formed(100, 31));
        assert!(!beats.is_well_formed(90, 1));
        assert!(!BeatIndexSet::from_indices(vec![5, 5]).is_well_formed(10, 1));
    }
}
