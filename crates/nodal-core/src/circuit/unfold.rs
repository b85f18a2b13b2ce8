//! Flattening a hierarchy into canonical nodes and leaf components.

use indexmap::IndexSet;

use super::{Circuit, CircuitId};
use crate::component::{ComponentId, ComponentKind};
use crate::error::Result;
use crate::node::NodeId;

/// Flat view of a hierarchy: what the matrix assembler stamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unfolded {
    /// Canonical nodes, deduplicated, in first-seen order.
    pub nodes: IndexSet<NodeId>,
    /// Leaf components (elements and ground sentinels) in flattening order.
    pub elements: Vec<ComponentId>,
}

impl Unfolded {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Position of a canonical node.
    pub fn node_index(&self, node: NodeId) -> Option<usize> {
        self.nodes.get_index_of(&node)
    }

    /// Position of a leaf component.
    pub fn element_index(&self, element: ComponentId) -> Option<usize> {
        self.elements.iter().position(|id| *id == element)
    }
}

impl Circuit {
    /// Flatten the whole hierarchy from the root level.
    ///
    /// Each level contributes its nodes (resolved to their canonical node)
    /// and then its components in insertion order; packages are replaced by
    /// the flattening of their inner level.
    pub fn unfold(&self) -> Result<Unfolded> {
        self.unfold_level(CircuitId::ROOT)
    }

    /// Flatten the sub-hierarchy below `level`. Nodes bound to outer pins of
    /// enclosing packages still resolve to their canonical outer node.
    pub fn unfold_level(&self, level: CircuitId) -> Result<Unfolded> {
        let mut unfolded = Unfolded::default();
        self.collect(level, &mut unfolded)?;
        log::debug!(
            "unfolded {}: {} nodes, {} elements",
            level,
            unfolded.node_count(),
            unfolded.element_count()
        );
        Ok(unfolded)
    }

    fn collect(&self, level: CircuitId, out: &mut Unfolded) -> Result<()> {
        let owner = self.level(level)?;
        for node in owner.nodes() {
            out.nodes.insert(self.highest_level_node(node)?);
        }
        for id in owner.components() {
            match &self.component(id)?.kind {
                ComponentKind::Package(package) => self.collect(package.circuit(), out)?,
                ComponentKind::Element(_) | ComponentKind::Ground => out.elements.push(id),
            }
        }
        Ok(())
    }
}
