use std::{fmt, io};

use oja_core::MlError;

/// The result type used across the experiment and persistence layers.
pub type Result<T> = std::result::Result<T, ExperimentError>;

/// All errors that can abort a repetition, an aggregation or a whole sweep.
#[derive(Debug)]
pub enum ExperimentError {
    /// A dimension or shape check failed in the learner or the sampler.
    Validation(MlError),
    /// Invalid sweep configuration, caught before any simulation runs.
    InvalidConfig(String),
    /// Reading or writing a file failed.
    Io(io::Error),
    /// A persisted file or a config file is not well formed.
    Format(String),
}

impl fmt::Display for ExperimentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "validation error: {e}"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
        }
    }
}

impl std::error::Error for ExperimentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlError> for ExperimentError {
    fn from(e: MlError) -> Self {
        Self::Validation(e)
    }
}

impl From<io::Error> for ExperimentError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
