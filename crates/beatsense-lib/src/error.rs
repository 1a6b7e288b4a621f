use thiserror::Error;

/// Failures surfaced by the analysis pipeline.
///
/// A failure means no result is produced for the input. An "Undetermined"
/// classification is not an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// A parameter is outside its valid domain (sampling rate, cutoffs, fractions).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// Too few samples for the requested stage.
    #[error("insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    /// An internal arithmetic invariant was violated.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
