//! # Nodal
//!
//! Hierarchical circuit construction with lazily evaluated symbolic MNA.
//!
//! Nodal provides:
//! - A circuit arena of nested levels, with packages wrapping inner circuits
//! - Node merging and removal that keep the topology consistent
//! - Symbolic MNA assembly whose coefficients follow later value changes
//! - Cofactor determinants and dense LU step solving
//!
//! ## Quick Start
//!
//! ```rust
//! use nodal::prelude::*;
//!
//! // 10 V source with 1 mΩ internal resistance across 100 Ω
//! let mut circuit = Circuit::new();
//! let root = CircuitId::ROOT;
//! let vs = circuit.add_voltage_source(root, 10.0, 1e-3, Some("V1")).unwrap();
//! let r = circuit.add_resistor(root, 100.0, Some("R1")).unwrap();
//! let gnd = circuit.add_ground(root, Some("GND")).unwrap();
//!
//! let top = circuit.connect(circuit.pin(vs, 0).unwrap(), circuit.pin(r, 0).unwrap()).unwrap();
//! let bottom = circuit.connect(circuit.pin(r, 1).unwrap(), circuit.pin(gnd, 0).unwrap()).unwrap();
//! circuit.connect(circuit.pin(vs, 1).unwrap(), bottom).unwrap();
//!
//! let system = CircuitMatrix::generate(&circuit, DEFAULT_STEP).unwrap();
//! let solution = system.solve().unwrap();
//! let v_top = solution.voltage(top).unwrap();
//! assert!((v_top - 1000.0 / 100.001).abs() < 1e-6);
//! ```
//!
//! ## Stepping Reactive Circuits
//!
//! Assemble once per step, solve, then commit the solution as history for
//! the next assembly:
//!
//! ```rust,ignore
//! for _ in 0..steps {
//!     let solution = CircuitMatrix::generate(&circuit, dt)?.solve()?;
//!     solution.commit(&mut circuit)?;
//! }
//! ```

// Re-export member crates
pub use nodal_core as core;
pub use nodal_solver as solver;

// ============================================================================
// Convenient re-exports from nodal_core
// ============================================================================

pub use nodal_core::{
    BinaryOp,
    BranchEquation,
    // Circuit representation
    Circuit,
    CircuitId,
    Component,
    ComponentId,
    ComponentKind,
    // Expressions
    Constant,
    Element,
    ElementKind,
    // Errors
    Error as CoreError,
    Expr,
    GROUND_RESISTANCE,
    Labeled,
    Level,
    Node,
    NodeId,
    Package,
    PackageKind,
    Unfolded,
};

// ============================================================================
// Convenient re-exports from nodal_solver
// ============================================================================

pub use nodal_solver::{
    // Assembly
    CircuitMatrix,
    DEFAULT_STEP,
    // Errors
    Error as SolverError,
    ExprMatrix,
    StepSolution,
    determinant,
    get_determinant,
    // Linear solve
    solve_dense,
};

// ============================================================================
// Re-export commonly used external types
// ============================================================================

/// Re-export of nalgebra's dynamic vector type.
pub use nalgebra::DVector;

/// Re-export of nalgebra's dynamic matrix type.
pub use nalgebra::DMatrix;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module containing commonly used types.
///
/// ```rust
/// use nodal::prelude::*;
/// ```
pub mod prelude {
    // Topology
    pub use crate::{Circuit, CircuitId, ComponentId, ElementKind, NodeId};

    // Expressions
    pub use crate::{Constant, Expr};

    // Assembly and solving
    pub use crate::{CircuitMatrix, DEFAULT_STEP, StepSolution, get_determinant};

    // Common external types
    pub use crate::{DMatrix, DVector};
}
