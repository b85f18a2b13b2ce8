//! Error types for nodal-core.

use thiserror::Error;

use crate::circuit::CircuitId;
use crate::component::ComponentId;
use crate::node::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("label {label:?} is already used in {level}")]
    LabelCollision { label: String, level: CircuitId },

    #[error("node {node} is already labeled {label:?}")]
    LabelAlreadySet { node: NodeId, label: String },

    #[error("pin index {index} out of range for a component with {pin_count} pins")]
    InvalidPinIndex { index: usize, pin_count: usize },

    #[error("{item} is already registered with {owner}")]
    DoubleRegistration { item: String, owner: String },

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("component not found: {0}")]
    ComponentNotFound(ComponentId),

    #[error("circuit level not found: {0}")]
    CircuitNotFound(CircuitId),

    #[error("component {0} carries no element value")]
    NotAnElement(ComponentId),

    #[error("component {0} is not a package")]
    NotAPackage(ComponentId),
}

pub type Result<T> = std::result::Result<T, Error>;
