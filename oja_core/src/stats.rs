use ndarray::{Array1, ArrayView2, Axis};

use crate::error::{MlError, Result};

/// Per-column population variance (denominator `N`) of a `N x ndim` matrix.
///
/// # Errors
/// `MlError::InvalidInput` if the matrix has no rows.
pub fn column_variance(rows: ArrayView2<f64>) -> Result<Array1<f64>> {
    if rows.nrows() == 0 {
        return Err(MlError::InvalidInput("variance of an empty set of rows"));
    }

    Ok(rows.var_axis(Axis(0), 0.0))
}
