use std::{path::PathBuf, sync::Arc, time::Instant};

use log::{debug, info};
use ndarray::Array1;
use oja_core::MultivariateNormal;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    aggregator::MonteCarlo,
    configs::SweepConfig,
    descriptor::ExperimentSetup,
    error::Result,
    reference::reference_variance,
    store::{ResultStore, VarianceTable},
};

/// Drives the whole experiment: correlations one after the other, learning
/// rates one after the other, repetitions in parallel.
pub struct Sweep {
    config: SweepConfig,
    monte_carlo: MonteCarlo,
    store: ResultStore,
    seeds: StdRng,
}

impl Sweep {
    /// Creates a new `Sweep`.
    ///
    /// # Errors
    /// `ExperimentError::InvalidConfig` if the config doesn't validate or the
    /// worker pool can't be built.
    pub fn new(config: SweepConfig) -> Result<Self> {
        config.validate()?;

        if log::log_enabled!(log::Level::Debug) {
            match serde_json::to_string(&config) {
                Ok(json) => debug!("resolved config {json}"),
                Err(e) => debug!("resolved config not printable: {e}"),
            }
        }

        let monte_carlo = match config.threads {
            Some(threads) => MonteCarlo::with_threads(config.repetitions, threads)?,
            None => MonteCarlo::new(config.repetitions),
        };

        let seeds = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            store: ResultStore::new(&config.output_dir),
            config,
            monte_carlo,
            seeds,
        })
    }

    /// Estimates the variance for every learning rate of the schedule with
    /// inputs of correlation `rho`. Nothing is written.
    pub fn run_correlation(&mut self, rho: f64) -> Result<VarianceTable> {
        let config = &self.config;
        let source = MultivariateNormal::equicorrelated(config.ndim, rho)?;
        let initial = Array1::from(config.initial_weights.clone());
        let setup = Arc::new(ExperimentSetup::new(initial, config.ndim, source, config.batch_size));

        info!(rho = rho, alphas = config.schedule.len(); "sweeping correlation");

        let mut table = VarianceTable::new(rho);
        for entry in config.schedule.iter() {
            let start = Instant::now();
            let variance =
                self.monte_carlo
                    .estimate(&setup, entry.alpha, entry.batches, &mut self.seeds)?;

            debug!(
                alpha = entry.alpha,
                batches = entry.batches,
                repetitions = self.monte_carlo.repetitions(),
                elapsed_ms = start.elapsed().as_millis() as u64;
                "variance {variance}, reference {}",
                reference_variance(entry.alpha, rho)
            );

            table.push(entry.alpha, variance)?;
        }

        Ok(table)
    }

    /// Runs every correlation and writes one file for each, once its last
    /// learning rate is done.
    ///
    /// # Returns
    /// The written paths, in the order of `config.correlations`.
    pub fn run(&mut self) -> Result<Vec<PathBuf>> {
        let correlations = self.config.correlations.clone();
        let mut written = Vec::with_capacity(correlations.len());

        for rho in correlations {
            let table = self.run_correlation(rho)?;
            let path = self.store.save(&table)?;

            info!("wrote {}", path.display());
            written.push(path);
        }

        Ok(written)
    }
}
