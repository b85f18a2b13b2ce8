//! Numeric solve of an evaluated step system.

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// Solve the evaluated system `a·x = b` by LU decomposition.
///
/// `a` must be square with one row per entry of `b`. A circuit with a
/// floating net or a loop of ideal sources gives a singular `a`.
pub fn solve_dense(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    let size = a.nrows();
    for actual in [a.ncols(), b.len()] {
        if actual != size {
            return Err(Error::DimensionMismatch {
                expected: size,
                actual,
            });
        }
    }

    a.clone().lu().solve(b).ok_or(Error::SingularMatrix)
}
