use std::fmt;

use df_structure::IndexRange;

use crate::OutputConstraint;
use crate::OutputHandler;

#[derive(Debug)]
pub enum PredictError {
    /// A prediction range is descending or outside the sequence.
    InvalidRange(IndexRange),
    /// The engine cannot satisfy the requested output constraint.
    Unsupported(&'static str),
    /// A reported optimum could not be traced back through the recursion.
    TraceFailure(String),
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictError::InvalidRange(r) => {
                write!(f, "Prediction range {} is not sane", r)
            }
            PredictError::Unsupported(what) => {
                write!(f, "Not supported: {}", what)
            }
            PredictError::TraceFailure(what) => {
                write!(f, "Trace back failed: {}", what)
            }
        }
    }
}

impl std::error::Error for PredictError {}


/// An interaction prediction engine over a pair of index ranges.
///
/// Implementations allocate all DP state inside `predict` and report
/// through the output handler: up to `ocon.report_max` interactions with
/// total energy below min(max_e, mfe + delta_e), deduplicated, honoring
/// the overlap policy, or a single empty interaction when nothing
/// qualifies.
pub trait Predictor {
    fn predict(
        &mut self,
        r1: &IndexRange,
        r2: &IndexRange,
        ocon: &OutputConstraint,
        out: &mut dyn OutputHandler,
    ) -> Result<(), PredictError>;
}

/// Shared range precondition: prediction ranges must be ascending after
/// clamping the open end.
pub(crate) fn check_range(r: &IndexRange, len: usize) -> Result<(), PredictError> {
    let to = r.to.min(len - 1);
    if r.from > to {
        return Err(PredictError::InvalidRange(*r));
    }
    Ok(())
}
