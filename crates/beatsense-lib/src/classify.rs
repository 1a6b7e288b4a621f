use crate::config::ClassifierThresholds;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse rhythm category derived from the mean heart rate alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhythmClass {
    #[serde(rename = "Undetermined")]
    Undetermined,
    #[serde(rename = "Bradycardia")]
    Bradycardia,
    #[serde(rename = "Tachycardia")]
    Tachycardia,
    #[serde(rename = "Normal Sinus Rhythm")]
    NormalSinusRhythm,
}

impl RhythmClass {
    pub fn label(&self) -> &'static str {
        match self {
            RhythmClass::Undetermined => "Undetermined",
            RhythmClass::Bradycardia => "Bradycardia",
            RhythmClass::Tachycardia => "Tachycardia",
            RhythmClass::NormalSinusRhythm => "Normal Sinus Rhythm",
        }
    }
}

impl fmt::Display for RhythmClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify with the default 60/100 BPM boundaries.
pub fn classify(heart_rate: f64) -> RhythmClass {
    classify_with(heart_rate, &ClassifierThresholds::default())
}

/// Both boundaries are inclusive to the normal range. Zero, negative and
/// non-finite rates are undetermined.
pub fn classify_with(heart_rate: f64, thresholds: &ClassifierThresholds) -> RhythmClass {
    if !heart_rate.is_finite() || heart_rate <= 0.0 {
        RhythmClass::Undetermined
    } else if heart_rate < thresholds.bradycardia_below_bpm {
        RhythmClass::Bradycardia
    } else if heart_rate > thresholds.tachycardia_above_bpm {
        RhythmClass::Tachycardia
    } else {
        RhythmClass::NormalSinusRhythm
    }
}
