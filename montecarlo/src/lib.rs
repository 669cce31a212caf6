pub mod aggregator;
pub mod configs;
pub mod descriptor;
pub mod error;
pub mod reference;
pub mod runner;
pub mod store;
mod sweep;

use std::path::PathBuf;

pub use aggregator::MonteCarlo;
pub use configs::SweepConfig;
pub use descriptor::{ExperimentDescriptor, ExperimentSetup, GaussianSetup};
pub use error::{ExperimentError, Result};
pub use reference::reference_variance;
pub use store::{ResultStore, VarianceTable};
pub use sweep::Sweep;

/// Runs the full sweep described by `config` and persists one variance
/// table per correlation.
///
/// # Errors
/// The first error of any repetition, aggregation or write. Tables already
/// written for earlier correlations are kept.
pub fn run(config: SweepConfig) -> Result<Vec<PathBuf>> {
    log::info!(
        "running {} correlation(s) x {} learning rate(s), {} repetitions each",
        config.correlations.len(),
        config.schedule.len(),
        config.repetitions
    );

    Sweep::new(config)?.run()
}
