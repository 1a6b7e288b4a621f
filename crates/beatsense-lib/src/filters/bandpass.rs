use crate::{
    config::BandpassConfig,
    error::{AnalysisError, Result},
    signal::{validate_fs, FilteredWaveform, Waveform},
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Taps in the numerator and denominator of the first-order band-pass section.
pub const SECTION_TAPS: usize = 3;
/// Samples of odd-reflection padding added to each end before the two passes.
pub const EDGE_PADDING: usize = 3 * SECTION_TAPS;
/// Shortest input the zero-phase filter accepts.
pub const MIN_FILTER_SAMPLES: usize = EDGE_PADDING + 1;

/// Transfer function `b(z) / a(z)` of a second-order IIR section, normalized so `a[0] == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadCoefficients {
    pub b: [f64; SECTION_TAPS],
    pub a: [f64; SECTION_TAPS],
}

impl BiquadCoefficients {
    /// Design a first-order Butterworth band-pass from normalized cutoffs
    /// (fractions of the Nyquist frequency, each strictly inside (0, 1)).
    ///
    /// The analog prototype `1 / (s + 1)` is shifted to the band with
    /// `s -> (s^2 + w0^2) / (bw * s)` and mapped to the z-plane with a
    /// pre-warped bilinear transform.
    pub fn butterworth_bandpass(low: f64, high: f64) -> Result<Self> {
        for (name, wn) in [("low", low), ("high", high)] {
            if !(wn > 0.0 && wn < 1.0) {
                return Err(AnalysisError::InvalidParameter(format!(
                    "normalized {name} cutoff must be in (0, 1), got {wn}"
                )));
            }
        }
        if low >= high {
            return Err(AnalysisError::InvalidParameter(format!(
                "normalized low cutoff {low} must be below high cutoff {high}"
            )));
        }

        // Bilinear transform at a design rate of 2 (Nyquist == 1).
        let k = 4.0;
        let warped_low = k * (PI * low / 2.0).tan();
        let warped_high = k * (PI * high / 2.0).tan();
        let bw = warped_high - warped_low;
        let w0_sq = warped_low * warped_high;

        let a0 = k * k + bw * k + w0_sq;
        let gain = bw * k / a0;
        Ok(Self {
            b: [gain, 0.0, -gain],
            a: [
                1.0,
                2.0 * (w0_sq - k * k) / a0,
                (k * k - bw * k + w0_sq) / a0,
            ],
        })
    }

    /// Coefficients for a band given in Hz at sampling rate `fs`.
    pub fn for_band(fs: f64, band: &BandpassConfig) -> Result<Self> {
        validate_fs(fs)?;
        let nyquist = 0.5 * fs;
        Self::butterworth_bandpass(band.low_hz / nyquist, band.high_hz / nyquist)
    }

    /// Initial state of the transposed direct-form II filter that reproduces
    /// the steady-state response to a unit step.
    fn step_state(&self) -> [f64; 2] {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        let r0 = b1 - a1 * b0;
        let r1 = b2 - a2 * b0;
        let z0 = (r0 + r1) / (1.0 + a1 + a2);
        [z0, r1 - a2 * z0]
    }

    fn run(&self, data: &mut [f64], state: [f64; 2]) {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        let [mut z0, mut z1] = state;
        for sample in data.iter_mut() {
            let x = *sample;
            let y = b0 * x + z0;
            z0 = b1 * x - a1 * y + z1;
            z1 = b2 * x - a2 * y;
            *sample = y;
        }
    }

    /// Forward-backward application with odd-reflection edge padding.
    /// Introduces no phase shift; the output has the input's length.
    pub fn filtfilt(&self, data: &[f64]) -> Result<Vec<f64>> {
        if data.len() < MIN_FILTER_SAMPLES {
            return Err(AnalysisError::InsufficientData {
                required: MIN_FILTER_SAMPLES,
                actual: data.len(),
            });
        }
        let mut ext = odd_extend(data, EDGE_PADDING);
        let zi = self.step_state();

        let first = ext[0];
        self.run(&mut ext, [zi[0] * first, zi[1] * first]);
        ext.reverse();
        let first = ext[0];
        self.run(&mut ext, [zi[0] * first, zi[1] * first]);
        ext.reverse();

        Ok(ext[EDGE_PADDING..EDGE_PADDING + data.len()].to_vec())
    }
}

fn odd_extend(data: &[f64], pad: usize) -> Vec<f64> {
    let n = data.len();
    let first = data[0];
    let last = data[n - 1];
    let mut out = Vec::with_capacity(n + 2 * pad);
    out.extend((1..=pad).rev().map(|i| 2.0 * first - data[i]));
    out.extend_from_slice(data);
    out.extend((1..=pad).map(|i| 2.0 * last - data[n - 1 - i]));
    out
}

/// Zero-phase band-pass of a raw waveform.
pub fn bandpass(waveform: &Waveform, band: &BandpassConfig) -> Result<FilteredWaveform> {
    bandpass_samples(&waveform.data, waveform.fs, band)
}

/// Zero-phase band-pass of raw samples recorded at `fs` Hz.
pub fn bandpass_samples(
    samples: &[f64],
    fs: f64,
    band: &BandpassConfig,
) -> Result<FilteredWaveform> {
    validate_fs(fs)?;
    band.validate()?;
    let coeffs = BiquadCoefficients::for_band(fs, band)?;
    debug!(
        "band-pass {}-{} Hz at fs={} Hz: b={:?} a={:?}",
        band.low_hz, band.high_hz, fs, coeffs.b, coeffs.a
    );
    let data = coeffs.filtfilt(samples)?;
    Ok(FilteredWaveform::new(data, fs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{a} vs {b} (tol {tol})");
    }

    #[test]
    fn design_matches_reference_coefficients() {
        // 1-10 Hz band at 30 Hz.
        let c = BiquadCoefficients::butterworth_bandpass(1.0 / 15.0, 10.0 / 15.0).unwrap();
        assert_close(c.b[0], 0.57919222, 1e-6);
        assert_close(c.b[1], 0.0, 1e-12);
        assert_close(c.b[2], -0.57919222, 1e-6);
        assert_close(c.a[1], -0.58238257, 1e-6);
        assert_close(c.a[2], -0.15838444, 1e-6);
    }

    #[test]
    fn rejects_cutoffs_outside_unit_interval() {
        // 40 Hz upper edge needs fs > 80 Hz.
        let err = BiquadCoefficients::for_band(80.0, &BandpassConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter(_)));
        assert!(BiquadCoefficients::butterworth_bandpass(0.0, 0.5).is_err());
        assert!(BiquadCoefficients::butterworth_bandpass(0.2, 1.0).is_err());
        assert!(BiquadCoefficients::for_band(81.0, &BandpassConfig::default()).is_ok());
    }

    #[test]
    fn zero_sampling_rate_is_invalid_parameter() {
        let ts = Waveform::new(vec![0.0; 100], 0.0);
        let err = bandpass(&ts, &BandpassConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter(_)));
    }

    #[test]
    fn short_input_is_insufficient_data() {
        let ts = Waveform::new(vec![1.0; MIN_FILTER_SAMPLES - 1], 250.0);
        let err = bandpass(&ts, &BandpassConfig::default()).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientData {
                required: MIN_FILTER_SAMPLES,
                actual: MIN_FILTER_SAMPLES - 1
            }
        );
        let empty = Waveform::new(Vec::new(), 250.0);
        assert!(matches!(
            bandpass(&empty, &BandpassConfig::default()),
            Err(AnalysisError::InsufficientData { actual: 0, .. })
        ));
        let ok = Waveform::new(vec![1.0; MIN_FILTER_SAMPLES], 250.0);
        assert!(bandpass(&ok, &BandpassConfig::default()).is_ok());
    }

    #[test]
    fn constant_input_is_removed() {
        for level in [0.0, 3.0, -1.25] {
            let ts = Waveform::new(vec![level; 200], 250.0);
            let out = bandpass(&ts, &BandpassConfig::default()).unwrap();
            assert_eq!(out.len(), 200);
            assert!(out.data.iter().all(|v| v.abs() < 1e-12), "level {level}");
        }
    }

    #[test]
    fn impulse_peak_stays_in_place() {
        let mut data = vec![0.0; 1000];
        data[500] = 1.0;
        let out = bandpass(&Waveform::new(data, 250.0), &BandpassConfig::default()).unwrap();
        let argmax = out
            .data
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(argmax, 500);
        // Forward-backward response is symmetric around the impulse.
        assert_close(out.data[490], out.data[510], 1e-6);
    }

    #[test]
    fn refiltering_changes_the_signal() {
        let data: Vec<f64> = (0..500)
            .map(|i| {
                let spike = if i % 200 == 0 { 2.0 } else { 0.0 };
                (2.0 * PI * 5.0 * i as f64 / 250.0).sin() + spike
            })
            .collect();
        let band = BandpassConfig::default();
        let once = bandpass(&Waveform::new(data, 250.0), &band).unwrap();
        let twice = bandpass(&Waveform::new(once.data.clone(), 250.0), &band).unwrap();
        let diff: f64 = once
            .data
            .iter()
            .zip(&twice.data)
            .map(|(a, b)| (a - b).abs())
            .sum();
        assert!(diff > 1e-6);
    }
}
