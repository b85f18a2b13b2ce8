//! Lazily evaluated scalar expression graph.
//!
//! An [`Expr`] is either a mutable [`Constant`] leaf or a binary operation over
//! two other expressions. Operands are held by shared reference, so every
//! expression built from a constant observes later writes to it:
//!
//! ```
//! use nodal_core::expr::{Constant, Expr};
//!
//! let r = Constant::new(100.0);
//! let g = 1.0 / &r;
//! assert_eq!(g.eval(), 0.01);
//!
//! r.set(200.0);
//! assert_eq!(g.eval(), 0.005);
//! ```
//!
//! Evaluation walks the graph on every call; nothing is memoized.

mod ops;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// A mutable scalar leaf shared by every expression that references it.
///
/// Cloning a `Constant` clones the handle, not the value.
#[derive(Clone)]
pub struct Constant(Rc<Cell<f64>>);

impl Constant {
    /// Create a new leaf holding `value`.
    pub fn new(value: f64) -> Self {
        Self(Rc::new(Cell::new(value)))
    }

    /// Create a leaf whose value is not yet known.
    pub fn unknown() -> Self {
        Self::new(f64::NAN)
    }

    /// Current value of the leaf.
    pub fn get(&self) -> f64 {
        self.0.get()
    }

    /// Overwrite the leaf. Every expression referencing it sees the new value.
    pub fn set(&self, value: f64) {
        self.0.set(value);
    }

    /// Whether the leaf still holds the "unknown" marker.
    pub fn is_unknown(&self) -> bool {
        self.get().is_nan()
    }

    /// Whether both handles point at the same cell.
    pub fn ptr_eq(&self, other: &Constant) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Wrap this leaf as an expression sharing the same cell.
    pub fn to_expr(&self) -> Expr {
        Expr::Constant(self.clone())
    }
}

impl fmt::Debug for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constant({})", self.get())
    }
}

/// Binary operators supported by the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Apply the operator to two evaluated operands.
    ///
    /// Division follows IEEE-754: a zero divisor yields infinity or NaN.
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            BinaryOp::Add => left + right,
            BinaryOp::Sub => left - right,
            BinaryOp::Mul => left * right,
            BinaryOp::Div => left / right,
        }
    }

    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }
}

/// Interior node of the graph.
#[derive(Debug)]
pub struct Binary {
    pub op: BinaryOp,
    pub left: Expr,
    pub right: Expr,
}

/// A node of the expression graph.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Mutable leaf.
    Constant(Constant),
    /// Operator applied to two shared operands.
    Binary(Rc<Binary>),
}

impl Expr {
    /// Create an expression over a fresh leaf.
    pub fn constant(value: f64) -> Self {
        Expr::Constant(Constant::new(value))
    }

    /// Fresh leaf holding `0`.
    pub fn zero() -> Self {
        Self::constant(0.0)
    }

    /// Fresh leaf holding `1`.
    pub fn one() -> Self {
        Self::constant(1.0)
    }

    /// Combine two operands without copying either of them.
    pub fn binary(op: BinaryOp, left: impl Into<Expr>, right: impl Into<Expr>) -> Self {
        Expr::Binary(Rc::new(Binary {
            op,
            left: left.into(),
            right: right.into(),
        }))
    }

    /// Evaluate the graph against the current leaf values.
    pub fn eval(&self) -> f64 {
        match self {
            Expr::Constant(c) => c.get(),
            Expr::Binary(b) => b.op.apply(b.left.eval(), b.right.eval()),
        }
    }

    /// The leaf handle, if this expression is a bare constant.
    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Expr::Constant(c) => Some(c),
            Expr::Binary(_) => None,
        }
    }

    /// Whether this expression currently evaluates to exactly zero.
    pub fn is_zero(&self) -> bool {
        self.eval() == 0.0
    }

    /// Identity comparison: both expressions are the same graph node.
    pub fn ptr_eq(&self, other: &Expr) -> bool {
        match (self, other) {
            (Expr::Constant(a), Expr::Constant(b)) => a.ptr_eq(b),
            (Expr::Binary(a), Expr::Binary(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Whether `leaf` is reachable from this expression.
    pub fn references(&self, leaf: &Constant) -> bool {
        match self {
            Expr::Constant(c) => c.ptr_eq(leaf),
            Expr::Binary(b) => b.left.references(leaf) || b.right.references(leaf),
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::constant(value)
    }
}

impl From<Constant> for Expr {
    fn from(constant: Constant) -> Self {
        Expr::Constant(constant)
    }
}

impl From<&Constant> for Expr {
    fn from(constant: &Constant) -> Self {
        constant.to_expr()
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(c) => write!(f, "{}", c.get()),
            Expr::Binary(b) => write!(f, "({} {} {})", b.left, b.op.symbol(), b.right),
        }
    }
}
