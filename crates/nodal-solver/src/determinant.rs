//! Symbolic determinants by cofactor expansion.
//!
//! The result is an [`Expr`] over the matrix's own entries, so it follows
//! later changes to any leaf the entries reference. Cost grows factorially
//! with the matrix size; use [`crate::solve_dense`] for numbers.

use nodal_core::{BinaryOp, Expr};

use crate::matrix::ExprMatrix;

/// Laplace expansion along row 0.
///
/// Row-0 entries that currently evaluate to zero are left out of the sum,
/// so an entry that later becomes non-zero is not picked up. A non-square
/// matrix yields a NaN constant.
pub fn determinant(matrix: &ExprMatrix) -> Expr {
    if !matrix.is_square() {
        log::warn!(
            "determinant of a non-square {}x{} matrix",
            matrix.nrows(),
            matrix.ncols()
        );
        return Expr::constant(f64::NAN);
    }
    expand(matrix)
}

fn expand(m: &ExprMatrix) -> Expr {
    match m.nrows() {
        0 => Expr::one(),
        1 => m[(0, 0)].clone(),
        2 => &m[(0, 0)] * &m[(1, 1)] - &m[(0, 1)] * &m[(1, 0)],
        n => {
            let mut sum: Option<Expr> = None;
            for col in 0..n {
                let entry = &m[(0, col)];
                if entry.is_zero() {
                    continue;
                }
                let term = entry * expand(&m.minor(0, col));
                let op = if col % 2 == 0 {
                    BinaryOp::Add
                } else {
                    BinaryOp::Sub
                };
                sum = Some(match sum {
                    Some(acc) => Expr::binary(op, acc, term),
                    None if op == BinaryOp::Sub => -term,
                    None => term,
                });
            }
            sum.unwrap_or_else(Expr::zero)
        }
    }
}
