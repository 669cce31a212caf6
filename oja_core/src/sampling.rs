use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{MlError, Result};

/// A source of `ndim`-dimensional samples.
///
/// The random generator is handed in by the caller so a fixed seed yields a
/// fixed sequence of batches.
pub trait SampleSource {
    /// The width of every sample.
    fn ndim(&self) -> usize;

    /// Draws `n` independent samples.
    ///
    /// # Returns
    /// An `n x ndim` matrix, one sample per row.
    fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array2<f64>;
}

/// A multivariate normal distribution `N(mean, cov)`.
#[derive(Debug, Clone)]
pub struct MultivariateNormal {
    mean: Array1<f64>,
    cov: Array2<f64>,
    // Lower triangular factor of `cov`.
    chol: Array2<f64>,
}

impl MultivariateNormal {
    /// Creates a new `MultivariateNormal`.
    ///
    /// # Arguments
    /// * `mean` - The mean vector.
    /// * `cov` - A symmetric positive definite covariance matrix.
    ///
    /// # Errors
    /// `MlError::ShapeMismatch` if `cov` is not square or does not match the
    /// mean's length, `MlError::InvalidInput` if it is not symmetric positive
    /// definite.
    pub fn new(mean: ArrayView1<f64>, cov: ArrayView2<f64>) -> Result<Self> {
        let ndim = mean.len();

        if cov.nrows() != ndim {
            return Err(MlError::ShapeMismatch {
                what: "covariance rows",
                got: cov.nrows(),
                expected: ndim,
            });
        }

        if cov.ncols() != ndim {
            return Err(MlError::ShapeMismatch {
                what: "covariance columns",
                got: cov.ncols(),
                expected: ndim,
            });
        }

        let chol = cholesky(cov)?;

        Ok(Self {
            mean: mean.to_owned(),
            cov: cov.to_owned(),
            chol,
        })
    }

    /// A zero-mean distribution whose covariance has a unit diagonal and `rho`
    /// everywhere else.
    ///
    /// # Errors
    /// `MlError::InvalidInput` if that matrix is not positive definite, which
    /// happens unless `-1 / (ndim - 1) < rho < 1`.
    pub fn equicorrelated(ndim: usize, rho: f64) -> Result<Self> {
        let mean = Array1::zeros(ndim);
        let cov = Array2::from_shape_fn((ndim, ndim), |(i, j)| if i == j { 1.0 } else { rho });
        Self::new(mean.view(), cov.view())
    }

    pub fn mean(&self) -> ArrayView1<'_, f64> {
        self.mean.view()
    }

    pub fn cov(&self) -> ArrayView2<'_, f64> {
        self.cov.view()
    }
}

impl SampleSource for MultivariateNormal {
    fn ndim(&self) -> usize {
        self.mean.len()
    }

    fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array2<f64> {
        let z = Array2::<f64>::random_using((n, self.ndim()), StandardNormal, rng);
        z.dot(&self.chol.t()) + &self.mean
    }
}

/// Factors a symmetric positive definite matrix as `L * L^T`.
fn cholesky(a: ArrayView2<f64>) -> Result<Array2<f64>> {
    let d = a.nrows();
    let mut l = Array2::<f64>::zeros((d, d));

    for i in 0..d {
        for j in 0..=i {
            if a[[i, j]] != a[[j, i]] {
                return Err(MlError::InvalidInput("covariance must be symmetric"));
            }

            let sum: f64 = (0..j).map(|p| l[[i, p]] * l[[j, p]]).sum();

            if i == j {
                let pivot = a[[i, i]] - sum;
                if !(pivot > 0.0) {
                    return Err(MlError::InvalidInput("covariance must be positive definite"));
                }
                l[[i, j]] = pivot.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    Ok(l)
}
