use std::sync::Arc;

use ndarray::{Array1, ArrayView1};
use oja_core::{MultivariateNormal, SampleSource};

/// The part of an experiment shared by every repetition and learning rate of
/// one correlation sweep.
#[derive(Debug)]
pub struct ExperimentSetup<S: SampleSource = MultivariateNormal> {
    initial_weights: Array1<f64>,
    ndim: usize,
    source: S,
    batch_size: usize,
}

impl<S: SampleSource> ExperimentSetup<S> {
    /// Creates a new `ExperimentSetup`.
    ///
    /// # Arguments
    /// * `initial_weights` - Where every repetition starts from.
    /// * `ndim` - The expected dimensionality of weights and samples.
    /// * `source` - The distribution batches are drawn from.
    /// * `batch_size` - How many samples each batch holds.
    ///
    /// Dimensions are not checked here, the learner checks them when a
    /// repetition starts.
    pub fn new(initial_weights: Array1<f64>, ndim: usize, source: S, batch_size: usize) -> Self {
        Self {
            initial_weights,
            ndim,
            source,
            batch_size,
        }
    }

    pub fn initial_weights(&self) -> ArrayView1<'_, f64> {
        self.initial_weights.view()
    }

    pub fn ndim(&self) -> usize {
        self.ndim
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

/// The setup every sweep uses.
pub type GaussianSetup = ExperimentSetup<MultivariateNormal>;

/// Fully determines one independent repetition.
///
/// Descriptors are immutable and own nothing mutable, so any number of them
/// can run at once.
#[derive(Debug)]
pub struct ExperimentDescriptor<S: SampleSource = MultivariateNormal> {
    setup: Arc<ExperimentSetup<S>>,
    alpha: f64,
    batches: usize,
    seed: u64,
}

impl<S: SampleSource> Clone for ExperimentDescriptor<S> {
    fn clone(&self) -> Self {
        Self {
            setup: Arc::clone(&self.setup),
            alpha: self.alpha,
            batches: self.batches,
            seed: self.seed,
        }
    }
}

impl<S: SampleSource> ExperimentDescriptor<S> {
    /// Creates a new `ExperimentDescriptor`.
    ///
    /// # Arguments
    /// * `setup` - The shared part of the experiment.
    /// * `alpha` - The learning rate.
    /// * `batches` - How many batches to draw and fit, in sequence.
    /// * `seed` - Seeds the generator this repetition samples with.
    pub fn new(setup: Arc<ExperimentSetup<S>>, alpha: f64, batches: usize, seed: u64) -> Self {
        Self {
            setup,
            alpha,
            batches,
            seed,
        }
    }

    pub fn setup(&self) -> &ExperimentSetup<S> {
        &self.setup
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}
