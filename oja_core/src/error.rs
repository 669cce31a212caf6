use std::fmt;

pub type Result<T> = std::result::Result<T, MlError>;

/// Rejected inputs to the learner, the sampler or the variance reduction.
///
/// The learner raises these before its weights are touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MlError {
    /// A value the math can't work with, such as a covariance that isn't
    /// positive definite or an empty set of rows.
    InvalidInput(&'static str),

    /// A vector or matrix whose length disagrees with the learner's `ndim`.
    ShapeMismatch {
        /// Which input was off: `"initial weights"`, `"batch"` or a covariance axis.
        what: &'static str,
        got: usize,
        expected: usize,
    },
}

impl fmt::Display for MlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            MlError::ShapeMismatch { what, got, expected } => {
                write!(f, "shape mismatch for {what}: got {got}, expected {expected}")
            }
        }
    }
}

impl std::error::Error for MlError {}
