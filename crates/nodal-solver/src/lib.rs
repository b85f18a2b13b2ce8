//! Symbolic MNA assembly and step solving for nodal circuits.
//!
//! This crate provides:
//! - [`CircuitMatrix::generate`]: the symbolic system of a flattened hierarchy
//! - [`determinant`]: cofactor expansion over symbolic entries
//! - [`solve_dense`]: LU solving of the evaluated system
//! - [`StepSolution`]: solved unknowns and history write-back

pub mod assemble;
pub mod determinant;
pub mod error;
pub mod linear;
pub mod matrix;
pub mod solution;

pub use assemble::{CircuitMatrix, get_determinant};
pub use determinant::determinant;
pub use error::{Error, Result};
pub use linear::solve_dense;
pub use matrix::ExprMatrix;
pub use solution::StepSolution;

/// Step size used when the caller has no preference (1 µs).
pub const DEFAULT_STEP: f64 = 1e-6;
