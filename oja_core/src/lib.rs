//! Oja's rule and the pieces needed to feed it: a multivariate normal sample
//! source and a per-dimension variance reduction.

mod error;
mod learner;
mod sampling;
mod stats;

pub use error::{MlError, Result};
pub use learner::{OjaLearner, WeightVector};
pub use sampling::{MultivariateNormal, SampleSource};
pub use stats::column_variance;
