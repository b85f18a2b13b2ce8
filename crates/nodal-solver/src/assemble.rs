//! Symbolic MNA assembly from a flattened circuit hierarchy.
//!
//! For a hierarchy with `n` canonical nodes and `m` leaf components the
//! system has `n + m` unknowns and equations:
//!
//! ```text
//!            V (n cols)          I (m cols)
//!          ┌──────────────────┬──────────────────┐
//! branch   │ ±voltage coeff   │ current coeff    │ = constant   (m rows)
//!          ├──────────────────┼──────────────────┤
//! KCL      │ 0                │ -1 pin0, +1 pin1 │ = 0          (n rows)
//!          └──────────────────┴──────────────────┘
//! ```
//!
//! An ideal ground sentinel's branch row pins its node to 0 V and its current
//! column carries the ground return current.

use indexmap::IndexSet;
use nalgebra::{DMatrix, DVector};
use nodal_core::{Circuit, ComponentId, ComponentKind, Constant, Expr, NodeId};

use crate::error::Result;
use crate::linear::solve_dense;
use crate::matrix::ExprMatrix;
use crate::solution::StepSolution;

/// Symbolic MNA system for one time step.
#[derive(Debug, Clone)]
pub struct CircuitMatrix {
    matrix: ExprMatrix,
    constants: Vec<Expr>,
    dt: Constant,
    nodes: IndexSet<NodeId>,
    elements: IndexSet<ComponentId>,
}

impl CircuitMatrix {
    /// Assemble the system for `circuit` with step size `dt`.
    ///
    /// Every coefficient references the circuit's value and history leaves,
    /// so value changes made afterwards are seen by [`CircuitMatrix::evaluate`]
    /// without reassembling. Topology changes need a new call.
    pub fn generate(circuit: &Circuit, dt: f64) -> Result<Self> {
        let unfolded = circuit.unfold()?;
        let nodes = unfolded.nodes;
        let elements: IndexSet<ComponentId> = unfolded.elements.into_iter().collect();
        let num_nodes = nodes.len();
        let num_elements = elements.len();
        let size = num_nodes + num_elements;

        let step = Constant::new(dt);
        let dt = step.to_expr();
        let mut matrix = ExprMatrix::zeros(size, size);
        let mut constants: Vec<Expr> = (0..size).map(|_| Expr::zero()).collect();

        for (row, &id) in elements.iter().enumerate() {
            let component = circuit.component(id)?;
            let mut pins = Vec::with_capacity(component.pin_count());
            let mut cols = Vec::with_capacity(component.pin_count());
            for &pin in component.pins() {
                let node = circuit.highest_level_node(pin)?;
                let col = nodes
                    .get_index_of(&node)
                    .ok_or(nodal_core::Error::NodeNotFound(node))?;
                pins.push(node);
                cols.push(col);
            }
            let current_col = num_nodes + row;

            match component.kind() {
                ComponentKind::Element(element) => {
                    let history = circuit.node(pins[0])?.prev_voltage()
                        - circuit.node(pins[1])?.prev_voltage();
                    let eq = element.equation(&dt, &history);

                    matrix.stamp(row, cols[0], &eq.voltage);
                    matrix.stamp(row, cols[1], -&eq.voltage);
                    matrix.stamp(row, current_col, eq.current);
                    constants[row] = eq.constant;

                    matrix.stamp(num_elements + cols[0], current_col, -1.0);
                    matrix.stamp(num_elements + cols[1], current_col, 1.0);
                }
                ComponentKind::Ground => {
                    matrix.stamp(row, cols[0], 1.0);
                    matrix.stamp(num_elements + cols[0], current_col, -1.0);
                }
                ComponentKind::Package(_) => unreachable!("unfold yields leaf components only"),
            }
        }

        log::debug!(
            "assembled {}x{} system: {} nodes, {} elements, dt = {}",
            size,
            size,
            num_nodes,
            num_elements,
            step.get()
        );
        Ok(CircuitMatrix {
            matrix,
            constants,
            dt: step,
            nodes,
            elements,
        })
    }

    /// Number of unknowns.
    pub fn size(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    /// Canonical nodes in column order.
    pub fn nodes(&self) -> &IndexSet<NodeId> {
        &self.nodes
    }

    /// Leaf components in branch-row order.
    pub fn elements(&self) -> &IndexSet<ComponentId> {
        &self.elements
    }

    /// Column of a canonical node's voltage.
    pub fn voltage_column(&self, node: NodeId) -> Option<usize> {
        self.nodes.get_index_of(&node)
    }

    /// Column of a leaf component's branch current.
    pub fn current_column(&self, element: ComponentId) -> Option<usize> {
        self.elements
            .get_index_of(&element)
            .map(|i| self.num_nodes() + i)
    }

    /// Coefficient matrix.
    pub fn matrix(&self) -> &ExprMatrix {
        &self.matrix
    }

    /// Right-hand side.
    pub fn constants(&self) -> &[Expr] {
        &self.constants
    }

    /// Step size leaf shared by every companion coefficient.
    pub fn dt(&self) -> &Constant {
        &self.dt
    }

    /// Numeric snapshot of the system against the current leaf values.
    pub fn evaluate(&self) -> (DMatrix<f64>, DVector<f64>) {
        let rhs = DVector::from_iterator(self.size(), self.constants.iter().map(Expr::eval));
        (self.matrix.evaluate(), rhs)
    }

    /// Symbolic determinant of the coefficient matrix.
    pub fn determinant(&self) -> Expr {
        self.matrix.determinant()
    }

    /// Evaluate and solve the system.
    pub fn solve(&self) -> Result<StepSolution> {
        let (a, b) = self.evaluate();
        let x = solve_dense(&a, &b)?;
        Ok(StepSolution::new(self.nodes.clone(), self.elements.clone(), x))
    }
}

/// Cofactor determinant of the system assembled for `circuit` and `dt`.
pub fn get_determinant(circuit: &Circuit, dt: f64) -> Result<Expr> {
    Ok(CircuitMatrix::generate(circuit, dt)?.determinant())
}
