use crate::{
    error::{AnalysisError, Result},
    signal::{validate_fs, BeatIndexSet, RRSeries},
};
use log::{debug, error};

/// Heart rate reported when fewer than two beats were found.
pub const UNDETERMINED_RATE: f64 = 0.0;

/// Mean heart rate (BPM) from detected beats.
///
/// RR intervals are averaged first and the mean is inverted; this is not the
/// same as averaging per-interval rates when intervals vary.
pub fn heart_rate(beats: &BeatIndexSet, fs: f64) -> Result<f64> {
    validate_fs(fs)?;
    if beats.len() < 2 {
        return Ok(UNDETERMINED_RATE);
    }
    let rr = RRSeries::from_beats(beats, fs);
    heart_rate_from_rr(&rr)
}

/// Mean heart rate (BPM) from RR intervals in seconds.
pub fn heart_rate_from_rr(rr: &RRSeries) -> Result<f64> {
    let mean_rr = match rr.mean() {
        Some(mean) => mean,
        None => return Ok(UNDETERMINED_RATE),
    };
    if !(mean_rr.is_finite() && mean_rr > 0.0) {
        let msg = format!(
            "mean RR interval is {mean_rr} s over {} intervals",
            rr.len()
        );
        error!("{msg}");
        return Err(AnalysisError::InvalidState(msg));
    }
    let bpm = 60.0 / mean_rr;
    debug!("mean RR {mean_rr:.4} s over {} intervals -> {bpm:.2} BPM", rr.len());
    Ok(bpm)
}
