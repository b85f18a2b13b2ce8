//! Hierarchical circuit topology and lazy symbolic expressions.
//!
//! This crate provides the data structures the matrix assembler works from:
//! a [`Circuit`] arena of levels, nodes and components (primitive elements,
//! ground sentinels and packages that wrap their own inner level), and the
//! [`Expr`] graph whose [`Constant`] leaves are shared with the circuit so
//! that changing a component value re-prices every expression built from it.

pub mod circuit;
pub mod component;
pub mod element;
pub mod error;
pub mod expr;
pub mod node;
pub mod package;

pub use circuit::{Circuit, CircuitId, Labeled, Level, Unfolded};
pub use component::{Component, ComponentId, ComponentKind};
pub use element::{BranchEquation, Element, ElementKind};
pub use error::{Error, Result};
pub use expr::{Binary, BinaryOp, Constant, Expr};
pub use node::{Node, NodeId};
pub use package::{Package, PackageKind, GROUND_RESISTANCE};
