//! Electrical nets of the circuit graph.

use std::fmt;

use indexmap::IndexSet;

use crate::circuit::CircuitId;
use crate::component::ComponentId;
use crate::expr::Constant;

/// Stable handle to a node in a [`Circuit`](crate::Circuit) arena.
///
/// Handles are never reused, so a handle to a node that has been merged away
/// or removed stays invalid forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Create a new NodeId from a raw value.
    pub fn new(id: u32) -> Self {
        NodeId(id)
    }

    /// Get the raw node ID value.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// A node in the circuit graph.
#[derive(Debug)]
pub struct Node {
    /// Unique identifier for this node.
    id: NodeId,
    /// Level that owns this node.
    level: CircuitId,
    /// Optional name, set at most once.
    label: Option<String>,
    /// Components with at least one pin on this node, in attachment order.
    components: IndexSet<ComponentId>,
    /// Solved voltage of the previous time step (NaN until written back).
    prev_voltage: Constant,
}

impl Node {
    pub(crate) fn new(id: NodeId, level: CircuitId, component: ComponentId) -> Self {
        let mut components = IndexSet::new();
        components.insert(component);
        Self {
            id,
            level,
            label: None,
            components,
            prev_voltage: Constant::unknown(),
        }
    }

    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Level this node belongs to.
    pub fn level(&self) -> CircuitId {
        self.level
    }

    /// Get the node's label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Components attached to this node.
    pub fn components(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.components.iter().copied()
    }

    /// Number of attached components.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Whether `component` is in this node's list.
    pub fn is_attached(&self, component: ComponentId) -> bool {
        self.components.contains(&component)
    }

    /// Voltage written back by the driver after the previous step.
    pub fn prev_voltage(&self) -> &Constant {
        &self.prev_voltage
    }

    pub(crate) fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    pub(crate) fn take_label(&mut self) -> Option<String> {
        self.label.take()
    }

    /// Returns false if the component was already attached.
    pub(crate) fn attach(&mut self, component: ComponentId) -> bool {
        self.components.insert(component)
    }

    /// Returns true if the node is left without components.
    pub(crate) fn detach(&mut self, component: ComponentId) -> bool {
        self.components.shift_remove(&component);
        self.components.is_empty()
    }

    pub(crate) fn take_components(&mut self) -> IndexSet<ComponentId> {
        std::mem::take(&mut self.components)
    }
}
