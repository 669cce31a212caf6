use std::{num::NonZeroUsize, sync::Arc};

use log::warn;
use ndarray::{Array1, Array2, Axis};
use oja_core::{MlError, SampleSource, WeightVector, column_variance};
use rand::Rng;
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};

use crate::{
    descriptor::{ExperimentDescriptor, ExperimentSetup},
    error::{ExperimentError, Result},
    runner,
};

/// Estimates the spread of the converged weights for one learning rate by
/// running many independent repetitions in parallel.
pub struct MonteCarlo {
    repetitions: NonZeroUsize,
    pool: Option<ThreadPool>,
}

impl MonteCarlo {
    /// Creates a new `MonteCarlo` aggregator running on rayon's global pool.
    ///
    /// # Arguments
    /// * `repetitions` - How many independent runs back each estimate.
    pub fn new(repetitions: NonZeroUsize) -> Self {
        Self {
            repetitions,
            pool: None,
        }
    }

    /// Creates a new `MonteCarlo` aggregator with a dedicated pool of `threads` workers.
    ///
    /// # Errors
    /// `ExperimentError::InvalidConfig` if the pool can't be built.
    pub fn with_threads(repetitions: NonZeroUsize, threads: NonZeroUsize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.get())
            .thread_name(|i| format!("repetition-{i}"))
            .build()
            .map_err(|e| ExperimentError::InvalidConfig(format!("worker pool: {e}")))?;

        Ok(Self {
            repetitions,
            pool: Some(pool),
        })
    }

    pub fn repetitions(&self) -> usize {
        self.repetitions.get()
    }

    /// Per-dimension population variance of the final weights over all repetitions.
    ///
    /// # Arguments
    /// * `setup` - The configuration shared by every repetition.
    /// * `alpha` - The learning rate.
    /// * `batches` - Batches per repetition.
    /// * `seeds` - Draws one seed per repetition, in repetition order.
    ///
    /// # Errors
    /// The first error of any repetition; a single failure discards the rest.
    pub fn estimate<S, R>(
        &self,
        setup: &Arc<ExperimentSetup<S>>,
        alpha: f64,
        batches: usize,
        seeds: &mut R,
    ) -> Result<Array1<f64>>
    where
        S: SampleSource + Send + Sync,
        R: Rng,
    {
        let descriptors: Vec<_> = (0..self.repetitions.get())
            .map(|_| ExperimentDescriptor::new(Arc::clone(setup), alpha, batches, seeds.random()))
            .collect();

        let finals = self.run_all(&descriptors)?;
        let finals = stack(&finals)?;

        if finals.iter().any(|w| !w.is_finite()) {
            warn!(alpha = alpha, batches = batches; "some repetitions diverged");
        }

        Ok(column_variance(finals.view())?)
    }

    /// Runs every descriptor and returns the final weights in the same order.
    pub fn run_all<S>(&self, descriptors: &[ExperimentDescriptor<S>]) -> Result<Vec<WeightVector>>
    where
        S: SampleSource + Send + Sync,
    {
        let map = || -> Result<Vec<WeightVector>> {
            descriptors.par_iter().map(runner::run).collect()
        };

        match &self.pool {
            Some(pool) => pool.install(map),
            None => map(),
        }
    }
}

/// Stacks the final weights as the rows of a `repetitions x ndim` matrix.
fn stack(finals: &[WeightVector]) -> Result<Array2<f64>> {
    let views: Vec<_> = finals.iter().map(|w| w.view()).collect();

    ndarray::stack(Axis(0), &views)
        .map_err(|_| MlError::InvalidInput("final weights have different lengths").into())
}
