//! Dense matrices of symbolic entries.

use std::ops::Index;

use nalgebra::DMatrix;
use nodal_core::Expr;

use crate::error::{Error, Result};

/// Row-major matrix of [`Expr`] entries.
///
/// Every entry starts as its own zero leaf.
#[derive(Debug, Clone)]
pub struct ExprMatrix {
    nrows: usize,
    ncols: usize,
    entries: Vec<Expr>,
    stamped: Vec<bool>,
}

impl ExprMatrix {
    /// All-zero matrix.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            entries: (0..nrows * ncols).map(|_| Expr::zero()).collect(),
            stamped: vec![false; nrows * ncols],
        }
    }

    /// Build from rows; every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<Expr>>) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        let mut entries = Vec::with_capacity(nrows * ncols);
        for row in rows {
            if row.len() != ncols {
                return Err(Error::DimensionMismatch {
                    expected: ncols,
                    actual: row.len(),
                });
            }
            entries.extend(row);
        }
        Ok(Self {
            nrows,
            ncols,
            stamped: vec![true; entries.len()],
            entries,
        })
    }

    /// Build entry by entry.
    pub fn from_fn(nrows: usize, ncols: usize, mut f: impl FnMut(usize, usize) -> Expr) -> Self {
        let mut entries = Vec::with_capacity(nrows * ncols);
        for i in 0..nrows {
            for j in 0..ncols {
                entries.push(f(i, j));
            }
        }
        Self {
            nrows,
            ncols,
            stamped: vec![true; entries.len()],
            entries,
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// Replace entry `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<Expr>) {
        let k = self.offset(row, col);
        self.entries[k] = value.into();
        self.stamped[k] = true;
    }

    /// Add `value` to entry `(row, col)`; the first stamp replaces the zero.
    pub fn stamp(&mut self, row: usize, col: usize, value: impl Into<Expr>) {
        let k = self.offset(row, col);
        let value = value.into();
        self.entries[k] = if self.stamped[k] {
            &self.entries[k] + value
        } else {
            value
        };
        self.stamped[k] = true;
    }

    /// Whether entry `(row, col)` received any contribution.
    pub fn is_stamped(&self, row: usize, col: usize) -> bool {
        self.stamped[self.offset(row, col)]
    }

    /// Copy without row `row` and column `col`; entries stay shared.
    pub fn minor(&self, row: usize, col: usize) -> ExprMatrix {
        let nrows = self.nrows.saturating_sub(1);
        let ncols = self.ncols.saturating_sub(1);
        let mut entries = Vec::with_capacity(nrows * ncols);
        let mut stamped = Vec::with_capacity(nrows * ncols);
        for i in (0..self.nrows).filter(|&i| i != row) {
            for j in (0..self.ncols).filter(|&j| j != col) {
                let k = self.offset(i, j);
                entries.push(self.entries[k].clone());
                stamped.push(self.stamped[k]);
            }
        }
        ExprMatrix {
            nrows,
            ncols,
            entries,
            stamped,
        }
    }

    /// Numeric snapshot against the current leaf values.
    pub fn evaluate(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.nrows, self.ncols, |i, j| self[(i, j)].eval())
    }

    /// Cofactor expansion of this matrix; see [`crate::determinant`].
    pub fn determinant(&self) -> Expr {
        crate::determinant::determinant(self)
    }

    fn offset(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.nrows && col < self.ncols,
            "entry ({}, {}) outside a {}x{} matrix",
            row,
            col,
            self.nrows,
            self.ncols
        );
        row * self.ncols + col
    }
}

impl Index<(usize, usize)> for ExprMatrix {
    type Output = Expr;

    fn index(&self, (row, col): (usize, usize)) -> &Expr {
        &self.entries[self.offset(row, col)]
    }
}
