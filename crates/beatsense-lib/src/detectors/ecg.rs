use crate::{
    config::{DetectorConfig, LocalMaximaConfig, ThresholdConfig},
    signal::{BeatIndexSet, FilteredWaveform},
};
use log::debug;

/// Produces R-peak locations from a band-passed ECG.
///
/// Implementations are deterministic and hold no state between calls.
pub trait BeatDetector {
    fn name(&self) -> &'static str;
    fn detect(&self, filtered: &FilteredWaveform) -> BeatIndexSet;
}

/// Global threshold at a fraction of the waveform maximum, followed by
/// refractory suppression: a supra-threshold sample starts a new beat only
/// when it lies more than `refractory_s` after the previous supra-threshold
/// sample, so each run above threshold yields one beat at its first sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdDetector {
    pub cfg: ThresholdConfig,
}

impl ThresholdDetector {
    pub fn new(cfg: ThresholdConfig) -> Self {
        Self { cfg }
    }
}

impl BeatDetector for ThresholdDetector {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn detect(&self, filtered: &FilteredWaveform) -> BeatIndexSet {
        let (peak, trough) = match (filtered.max(), filtered.min()) {
            (Some(peak), Some(trough)) => (peak, trough),
            _ => return BeatIndexSet::default(),
        };
        if peak <= self.cfg.amplitude_floor || peak - trough <= self.cfg.amplitude_floor {
            return BeatIndexSet::default();
        }
        let threshold = self.cfg.fraction * peak;
        let refractory = self.cfg.refractory_s * filtered.fs;

        let mut beats: Vec<usize> = Vec::new();
        let mut candidates = 0usize;
        let mut prev_candidate: Option<usize> = None;
        for (i, &sample) in filtered.data.iter().enumerate() {
            if sample <= threshold {
                continue;
            }
            candidates += 1;
            let clear = prev_candidate.map_or(true, |prev| (i - prev) as f64 > refractory);
            if clear {
                beats.push(i);
            }
            prev_candidate = Some(i);
        }
        debug!(
            "threshold detector: threshold={threshold:.6} candidates={candidates} beats={}",
            beats.len()
        );
        BeatIndexSet::from_indices(beats)
    }
}

/// Local maxima above a fraction of the mean absolute amplitude, retained
/// tallest-first so that no two retained maxima are closer than
/// `min_separation_s`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalMaximaDetector {
    pub cfg: LocalMaximaConfig,
}

impl LocalMaximaDetector {
    pub fn new(cfg: LocalMaximaConfig) -> Self {
        Self { cfg }
    }
}

impl BeatDetector for LocalMaximaDetector {
    fn name(&self) -> &'static str {
        "local-maxima"
    }

    fn detect(&self, filtered: &FilteredWaveform) -> BeatIndexSet {
        let data = &filtered.data;
        if data.len() < 3 {
            return BeatIndexSet::default();
        }
        let mean_abs = data.iter().map(|x| x.abs()).sum::<f64>() / data.len() as f64;
        let height = (self.cfg.mean_fraction * mean_abs).max(self.cfg.amplitude_floor);

        let mut candidates: Vec<usize> = local_maxima(data)
            .into_iter()
            .filter(|&i| data[i] > height)
            .collect();
        let found = candidates.len();

        let distance = ((self.cfg.min_separation_s * filtered.fs).ceil() as usize).max(1);
        // Tallest first; ties go to the earlier sample.
        candidates.sort_by(|&a, &b| data[b].total_cmp(&data[a]).then(a.cmp(&b)));
        let mut kept: Vec<usize> = Vec::new();
        for idx in candidates {
            let pos = kept.partition_point(|&k| k < idx);
            let left_ok = pos == 0 || idx - kept[pos - 1] >= distance;
            let right_ok = pos == kept.len() || kept[pos] - idx >= distance;
            if left_ok && right_ok {
                kept.insert(pos, idx);
            }
        }
        debug!(
            "local-maxima detector: height={height:.6} distance={distance} candidates={found} beats={}",
            kept.len()
        );
        BeatIndexSet::from_indices(kept)
    }
}

/// Indices of strict local maxima. A flat-topped peak reports its first sample.
fn local_maxima(data: &[f64]) -> Vec<usize> {
    let mut out = Vec::new();
    let n = data.len();
    let mut i = 1;
    while i + 1 < n {
        if data[i] > data[i - 1] {
            let mut ahead = i + 1;
            while ahead < n && data[ahead] == data[i] {
                ahead += 1;
            }
            if ahead < n && data[ahead] < data[i] {
                out.push(i);
            }
            i = ahead;
        } else {
            i += 1;
        }
    }
    out
}

impl BeatDetector for DetectorConfig {
    fn name(&self) -> &'static str {
        DetectorConfig::name(self)
    }

    fn detect(&self, filtered: &FilteredWaveform) -> BeatIndexSet {
        match *self {
            DetectorConfig::Threshold(cfg) => ThresholdDetector::new(cfg).detect(filtered),
            DetectorConfig::LocalMaxima(cfg) => LocalMaximaDetector::new(cfg).detect(filtered),
        }
    }
}

/// Detect beats with the strategy selected in `cfg`.
pub fn detect_beats(filtered: &FilteredWaveform, cfg: &DetectorConfig) -> BeatIndexSet {
    cfg.detect(filtered)
}
