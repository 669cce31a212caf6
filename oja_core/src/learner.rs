use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::error::{MlError, Result};

/// The learnable state, a vector of `ndim` reals.
pub type WeightVector = Array1<f64>;

/// A single neuron trained with Oja's rule.
///
/// The weights drift towards the dominant eigenvector of the covariance of
/// the samples it is fed. There is no explicit normalization step, the decay
/// term `-y²w` keeps the norm close to one in expectation only. Large
/// learning rates can make the weights diverge and nothing here detects it.
#[derive(Debug, Clone)]
pub struct OjaLearner {
    weights: WeightVector,
    ndim: usize,
}

impl OjaLearner {
    /// Creates a new `OjaLearner`.
    ///
    /// # Arguments
    /// * `initial_weights` - The starting point of the weight vector.
    /// * `ndim` - The dimensionality of the samples this learner will see.
    ///
    /// # Errors
    /// `MlError::ShapeMismatch` if `initial_weights` does not have `ndim` entries.
    pub fn new(initial_weights: ArrayView1<f64>, ndim: usize) -> Result<Self> {
        if initial_weights.len() != ndim {
            return Err(MlError::ShapeMismatch {
                what: "initial weights",
                got: initial_weights.len(),
                expected: ndim,
            });
        }

        Ok(Self {
            weights: initial_weights.to_owned(),
            ndim,
        })
    }

    /// Returns the dimensionality of this learner.
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Returns a view of the current weights.
    pub fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    /// Consumes the learner and hands its weights to the caller.
    pub fn into_weights(self) -> WeightVector {
        self.weights
    }

    /// Folds every row of `batch` through the update rule, in order.
    ///
    /// # Arguments
    /// * `batch` - An `N x ndim` matrix, one sample per row.
    /// * `alpha` - The learning rate.
    ///
    /// # Errors
    /// `MlError::ShapeMismatch` if the batch does not have `ndim` columns. The
    /// weights are left untouched in that case.
    pub fn fit(&mut self, batch: ArrayView2<f64>, alpha: f64) -> Result<()> {
        if batch.ncols() != self.ndim {
            return Err(MlError::ShapeMismatch {
                what: "batch",
                got: batch.ncols(),
                expected: self.ndim,
            });
        }

        for x in batch.rows() {
            self.step(x, alpha);
        }

        Ok(())
    }

    /// Applies `w <- w + alpha * y * (x - y * w)` with `y = w . x`.
    ///
    /// Each component only reads its own previous value plus `y`, so the
    /// update can be written in place.
    fn step(&mut self, x: ArrayView1<f64>, alpha: f64) {
        let y = self.weights.dot(&x);
        let gain = alpha * y;

        self.weights
            .zip_mut_with(&x, |w, &xi| *w += gain * (xi - y * *w));
    }
}
