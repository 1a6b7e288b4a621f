pub mod classify;
pub mod config;
pub mod detectors;
pub mod error;
pub mod filters;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod signal;

pub use classify::*;
pub use config::*;
pub use detectors::*;
pub use error::{AnalysisError, Result};
pub use filters::*;
pub use metrics::*;
pub use pipeline::*;
pub use signal::*;
