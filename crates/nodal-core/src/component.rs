//! Components: shared fields plus a closed set of kinds.

use std::fmt;

use crate::circuit::CircuitId;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::package::Package;

/// Stable handle to a component in a [`Circuit`](crate::Circuit) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u32);

impl ComponentId {
    /// Create a new ComponentId from a raw value.
    pub fn new(id: u32) -> Self {
        ComponentId(id)
    }

    /// Get the raw component ID value.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X{}", self.0)
    }
}

/// What a component is.
#[derive(Debug)]
pub enum ComponentKind {
    /// Primitive two-terminal element.
    Element(Element),
    /// Composite device wrapping its own circuit level.
    Package(Package),
    /// Ideal ground sentinel: pins its single node to 0 V.
    Ground,
}

/// A component placed in one level of the hierarchy.
#[derive(Debug)]
pub struct Component {
    pub(crate) id: ComponentId,
    pub(crate) level: CircuitId,
    pub(crate) label: Option<String>,
    pub(crate) pins: Vec<NodeId>,
    pub(crate) kind: ComponentKind,
}

impl Component {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Level this component was placed in.
    pub fn level(&self) -> CircuitId {
        self.level
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// Nodes attached to each pin, by pin index.
    pub fn pins(&self) -> &[NodeId] {
        &self.pins
    }

    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    /// Node attached to pin `index`.
    pub fn pin(&self, index: usize) -> Result<NodeId> {
        self.pins
            .get(index)
            .copied()
            .ok_or(Error::InvalidPinIndex {
                index,
                pin_count: self.pins.len(),
            })
    }

    pub fn as_element(&self) -> Option<&Element> {
        match &self.kind {
            ComponentKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_package(&self) -> Option<&Package> {
        match &self.kind {
            ComponentKind::Package(package) => Some(package),
            _ => None,
        }
    }

    /// Ideal ground sentinel.
    pub fn is_ground(&self) -> bool {
        matches!(self.kind, ComponentKind::Ground)
    }

    /// Leaf components are the ones that end up in the assembled matrix.
    pub fn is_leaf(&self) -> bool {
        !matches!(self.kind, ComponentKind::Package(_))
    }
}
