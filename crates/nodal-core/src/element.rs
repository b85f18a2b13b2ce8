//! Primitive two-terminal elements and their branch equations.
//!
//! Every element contributes one branch equation
//!
//! ```text
//! voltage_coeff * (V0 - V1) + current_coeff * I = constant
//! ```
//!
//! where `I` is the current flowing from pin 0 to pin 1 through the element.
//! Reactive elements use backward-Euler companion models.

use std::fmt;

use crate::expr::{Constant, Expr};

/// Kind of a primitive element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Resistor,
    Capacitor,
    Inductor,
    VoltageSource,
    CurrentSource,
}

impl ElementKind {
    /// SPICE-style designator letter.
    pub fn prefix(self) -> char {
        match self {
            ElementKind::Resistor => 'R',
            ElementKind::Capacitor => 'C',
            ElementKind::Inductor => 'L',
            ElementKind::VoltageSource => 'V',
            ElementKind::CurrentSource => 'I',
        }
    }

    /// Whether the element carries state between time steps.
    pub fn is_reactive(self) -> bool {
        matches!(self, ElementKind::Capacitor | ElementKind::Inductor)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementKind::Resistor => "resistor",
            ElementKind::Capacitor => "capacitor",
            ElementKind::Inductor => "inductor",
            ElementKind::VoltageSource => "voltage source",
            ElementKind::CurrentSource => "current source",
        };
        f.write_str(name)
    }
}

/// The three coefficients of one branch equation.
#[derive(Debug, Clone)]
pub struct BranchEquation {
    pub voltage: Expr,
    pub current: Expr,
    pub constant: Expr,
}

/// A primitive element's parameters and history.
#[derive(Debug)]
pub struct Element {
    kind: ElementKind,
    /// Resistance, capacitance, inductance or source strength.
    value: Constant,
    /// Initial voltage (capacitor) or current (inductor); unused otherwise.
    initial: Constant,
    /// Solved branch current of the previous time step.
    prev_current: Constant,
}

impl Element {
    /// Create an element with a zero initial condition.
    pub fn new(kind: ElementKind, value: f64) -> Self {
        Self::with_initial(kind, value, 0.0)
    }

    /// Create an element with an explicit initial condition.
    pub fn with_initial(kind: ElementKind, value: f64, initial: f64) -> Self {
        Self {
            kind,
            value: Constant::new(value),
            initial: Constant::new(initial),
            prev_current: Constant::unknown(),
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn value(&self) -> &Constant {
        &self.value
    }

    pub fn initial(&self) -> &Constant {
        &self.initial
    }

    pub fn prev_current(&self) -> &Constant {
        &self.prev_current
    }

    /// Coefficient of `V0 - V1`.
    pub fn voltage_coefficient(&self, dt: &Expr) -> Expr {
        match self.kind {
            ElementKind::CurrentSource => Expr::zero(),
            ElementKind::Inductor => dt / &self.value,
            ElementKind::Resistor | ElementKind::Capacitor | ElementKind::VoltageSource => {
                Expr::one()
            }
        }
    }

    /// Coefficient of the branch current.
    pub fn current_coefficient(&self, dt: &Expr) -> Expr {
        match self.kind {
            ElementKind::VoltageSource => Expr::zero(),
            ElementKind::CurrentSource => Expr::one(),
            ElementKind::Resistor => -&self.value,
            ElementKind::Capacitor => -(dt / &self.value),
            ElementKind::Inductor => Expr::constant(-1.0),
        }
    }

    /// Right-hand side of the branch equation.
    ///
    /// `terminal_history` is the previous-step voltage difference across the
    /// element. Whether history exists is decided now, from its current value;
    /// the returned expression stays tied to the history leaves.
    pub fn constant(&self, terminal_history: &Expr) -> Expr {
        match self.kind {
            ElementKind::VoltageSource | ElementKind::CurrentSource => self.value.to_expr(),
            ElementKind::Resistor => Expr::zero(),
            ElementKind::Capacitor => {
                if terminal_history.eval().is_nan() {
                    self.initial.to_expr()
                } else {
                    terminal_history.clone()
                }
            }
            ElementKind::Inductor => {
                if self.prev_current.is_unknown() {
                    -&self.initial
                } else {
                    -&self.prev_current
                }
            }
        }
    }

    /// All three coefficients for one time step of size `dt`.
    pub fn equation(&self, dt: &Expr, terminal_history: &Expr) -> BranchEquation {
        BranchEquation {
            voltage: self.voltage_coefficient(dt),
            current: self.current_coefficient(dt),
            constant: self.constant(terminal_history),
        }
    }
}
