//! Circuit graph representation.
//!
//! A [`Circuit`] is an arena owning every level of a hierarchy: the root level
//! plus one inner level per package. Nodes, components and levels are addressed
//! by stable handles; removing an item invalidates its handle for good.

mod topology;
mod unfold;

pub use unfold::Unfolded;

use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::component::{Component, ComponentId, ComponentKind};
use crate::element::{Element, ElementKind};
use crate::error::{Error, Result};
use crate::expr::Constant;
use crate::node::{Node, NodeId};
use crate::package::{Package, PackageKind};

/// Stable handle to one level of the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CircuitId(pub(crate) u32);

impl CircuitId {
    /// The top level (level 0), present in every circuit.
    pub const ROOT: CircuitId = CircuitId(0);

    /// Create a new CircuitId from a raw value.
    pub fn new(id: u32) -> Self {
        CircuitId(id)
    }

    /// Get the raw level ID value.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Check if this is the root level.
    pub fn is_root(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "root level")
        } else {
            write!(f, "level {}", self.0)
        }
    }
}

/// Item registered under a label. Nodes and components share one namespace
/// per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Labeled {
    Node(NodeId),
    Component(ComponentId),
}

/// One level of the hierarchy.
#[derive(Debug, Default)]
pub struct Level {
    /// Package owning this level; `None` for the root.
    parent: Option<ComponentId>,
    nodes: IndexSet<NodeId>,
    components: IndexSet<ComponentId>,
    labels: IndexMap<String, Labeled>,
}

impl Level {
    fn new(parent: Option<ComponentId>) -> Self {
        Self {
            parent,
            ..Default::default()
        }
    }

    /// Package owning this level.
    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn components(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.components.iter().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Item registered under `label` at this level.
    pub fn lookup(&self, label: &str) -> Option<Labeled> {
        self.labels.get(label).copied()
    }
}

/// Arena holding every level, node and component of a hierarchy.
#[derive(Debug)]
pub struct Circuit {
    levels: IndexMap<CircuitId, Level>,
    nodes: IndexMap<NodeId, Node>,
    components: IndexMap<ComponentId, Component>,
    next_level_id: u32,
    next_node_id: u32,
    next_component_id: u32,
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

impl Circuit {
    /// Create a new circuit holding an empty root level.
    pub fn new() -> Self {
        let mut levels = IndexMap::new();
        levels.insert(CircuitId::ROOT, Level::new(None));
        Self {
            levels,
            nodes: IndexMap::new(),
            components: IndexMap::new(),
            next_level_id: 1,
            next_node_id: 1,
            next_component_id: 1,
        }
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn level(&self, id: CircuitId) -> Result<&Level> {
        self.levels.get(&id).ok_or(Error::CircuitNotFound(id))
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(Error::NodeNotFound(id))
    }

    pub fn component(&self, id: ComponentId) -> Result<&Component> {
        self.components.get(&id).ok_or(Error::ComponentNotFound(id))
    }

    /// Element data of a primitive element.
    pub fn element(&self, id: ComponentId) -> Result<&Element> {
        self.component(id)?
            .as_element()
            .ok_or(Error::NotAnElement(id))
    }

    /// Package data of a composite component.
    pub fn package(&self, id: ComponentId) -> Result<&Package> {
        self.component(id)?
            .as_package()
            .ok_or(Error::NotAPackage(id))
    }

    /// Inner level of a package.
    pub fn package_circuit(&self, id: ComponentId) -> Result<CircuitId> {
        Ok(self.package(id)?.circuit())
    }

    /// Level owning `node`.
    pub fn level_of(&self, node: NodeId) -> Result<CircuitId> {
        Ok(self.node(node)?.level())
    }

    /// Package owning `level`, or `None` for the root.
    pub fn parent_package(&self, level: CircuitId) -> Result<Option<ComponentId>> {
        Ok(self.level(level)?.parent)
    }

    /// Check if a node handle is still live.
    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn has_component(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    /// Number of nodes owned directly by `level`.
    pub fn node_count(&self, level: CircuitId) -> Result<usize> {
        Ok(self.level(level)?.node_count())
    }

    /// Number of components placed directly in `level`.
    pub fn component_count(&self, level: CircuitId) -> Result<usize> {
        Ok(self.level(level)?.component_count())
    }

    /// Nodes owned directly by `level`.
    pub fn nodes(&self, level: CircuitId) -> Result<impl Iterator<Item = &Node> + '_> {
        let level = self.level(level)?;
        Ok(level.nodes.iter().filter_map(move |id| self.nodes.get(id)))
    }

    /// Components placed directly in `level`.
    pub fn components(&self, level: CircuitId) -> Result<impl Iterator<Item = &Component> + '_> {
        let level = self.level(level)?;
        Ok(level.components.iter().filter_map(move |id| self.components.get(id)))
    }

    /// Item registered under `label` at `level`.
    pub fn find(&self, level: CircuitId, label: &str) -> Option<Labeled> {
        self.levels.get(&level)?.lookup(label)
    }

    /// Node registered under `label` at `level`.
    pub fn find_node(&self, level: CircuitId, label: &str) -> Option<NodeId> {
        match self.find(level, label)? {
            Labeled::Node(id) => Some(id),
            Labeled::Component(_) => None,
        }
    }

    /// Component registered under `label` at `level`.
    pub fn find_component(&self, level: CircuitId, label: &str) -> Option<ComponentId> {
        match self.find(level, label)? {
            Labeled::Component(id) => Some(id),
            Labeled::Node(_) => None,
        }
    }

    /// Node attached to pin `index` of `component`.
    pub fn pin(&self, component: ComponentId, index: usize) -> Result<NodeId> {
        self.component(component)?.pin(index)
    }

    /// Nodes attached to every pin of `component`.
    pub fn pins(&self, component: ComponentId) -> Result<&[NodeId]> {
        Ok(self.component(component)?.pins())
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Place a primitive element in `level`.
    pub fn add_element(
        &mut self,
        level: CircuitId,
        kind: ElementKind,
        value: f64,
        label: Option<&str>,
    ) -> Result<ComponentId> {
        self.add_element_with_initial(level, kind, value, 0.0, label)
    }

    /// Place a primitive element with an initial condition in `level`.
    pub fn add_element_with_initial(
        &mut self,
        level: CircuitId,
        kind: ElementKind,
        value: f64,
        initial: f64,
        label: Option<&str>,
    ) -> Result<ComponentId> {
        let element = Element::with_initial(kind, value, initial);
        self.insert_component(level, label, 2, ComponentKind::Element(element))
    }

    /// Place an ideal ground sentinel in `level`.
    pub fn add_ideal_ground(&mut self, level: CircuitId, label: Option<&str>) -> Result<ComponentId> {
        self.insert_component(level, label, 1, ComponentKind::Ground)
    }

    /// Place an empty package with `pin_count` outer pins in `level`.
    ///
    /// Populate [`Circuit::package_circuit`] and bind its nodes to the outer
    /// pins with [`Circuit::set_inner_pin`].
    pub fn add_package(
        &mut self,
        level: CircuitId,
        pin_count: usize,
        label: Option<&str>,
    ) -> Result<ComponentId> {
        self.insert_package(level, PackageKind::Custom, pin_count, label)
    }

    pub(crate) fn insert_package(
        &mut self,
        level: CircuitId,
        kind: PackageKind,
        pin_count: usize,
        label: Option<&str>,
    ) -> Result<ComponentId> {
        self.check_label_free(level, label)?;
        let id = ComponentId(self.next_component_id);
        let inner = CircuitId(self.next_level_id);
        self.next_level_id += 1;
        self.levels.insert(inner, Level::new(Some(id)));
        let package = Package::new(kind, inner, pin_count);
        self.insert_component(level, label, pin_count, ComponentKind::Package(package))
    }

    fn insert_component(
        &mut self,
        level: CircuitId,
        label: Option<&str>,
        pin_count: usize,
        kind: ComponentKind,
    ) -> Result<ComponentId> {
        self.check_label_free(level, label)?;
        let id = ComponentId(self.next_component_id);
        self.next_component_id += 1;

        let pins = (0..pin_count).map(|_| self.new_node(level, id)).collect();
        let label = label.filter(|l| !l.is_empty()).map(str::to_string);

        let owner = self.level_mut(level)?;
        owner.components.insert(id);
        if let Some(label) = &label {
            owner.labels.insert(label.clone(), Labeled::Component(id));
        }
        self.components.insert(
            id,
            Component {
                id,
                level,
                label,
                pins,
                kind,
            },
        );
        log::debug!("added component {} to {}", id, level);
        Ok(id)
    }

    /// Bind outer pin `index` of `package` to `node` of its inner level.
    pub fn set_inner_pin(&mut self, package: ComponentId, index: usize, node: NodeId) -> Result<()> {
        let inner = self.package(package)?.circuit();
        let pin_count = self.component(package)?.pin_count();
        if index >= pin_count {
            return Err(Error::InvalidPinIndex { index, pin_count });
        }
        let owner = self.node(node)?.level();
        if owner != inner {
            return Err(Error::DoubleRegistration {
                item: format!("node {}", node),
                owner: owner.to_string(),
            });
        }
        if let Some(other) = self.package(package)?.outer_pin_of(node) {
            if other != index {
                return Err(Error::DoubleRegistration {
                    item: format!("node {}", node),
                    owner: format!("pin {} of package {}", other, package),
                });
            }
        }
        self.package_mut(package)?.inner_pins[index] = Some(node);
        Ok(())
    }

    pub(crate) fn set_primary(&mut self, package: ComponentId, element: ComponentId) -> Result<()> {
        self.element(element)?;
        self.package_mut(package)?.primary = Some(element);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Labels
    // ------------------------------------------------------------------

    /// Label a node. Node labels can be set once.
    pub fn set_node_label(&mut self, node: NodeId, label: &str) -> Result<()> {
        let current = self.node(node)?;
        if let Some(existing) = current.label() {
            return Err(Error::LabelAlreadySet {
                node,
                label: existing.to_string(),
            });
        }
        let level = current.level();
        self.check_label_free(level, Some(label))?;
        if label.is_empty() {
            return Ok(());
        }
        self.level_mut(level)?
            .labels
            .insert(label.to_string(), Labeled::Node(node));
        self.node_mut(node)?.set_label(Some(label.to_string()));
        Ok(())
    }

    /// Rename a component; an empty label clears it.
    pub fn set_component_label(&mut self, component: ComponentId, label: &str) -> Result<()> {
        let current = self.component(component)?;
        if current.label() == Some(label) {
            return Ok(());
        }
        let level = current.level();
        self.check_label_free(level, Some(label))?;

        let old = self.component_mut(component)?.label.take();
        let owner = self.level_mut(level)?;
        if let Some(old) = old {
            owner.labels.shift_remove(&old);
        }
        if !label.is_empty() {
            owner
                .labels
                .insert(label.to_string(), Labeled::Component(component));
            self.component_mut(component)?.label = Some(label.to_string());
        }
        Ok(())
    }

    fn check_label_free(&self, level: CircuitId, label: Option<&str>) -> Result<()> {
        let owner = self.level(level)?;
        match label {
            Some(label) if !label.is_empty() && owner.labels.contains_key(label) => {
                Err(Error::LabelCollision {
                    label: label.to_string(),
                    level,
                })
            }
            _ => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Values and history
    // ------------------------------------------------------------------

    /// Element standing for `component`: itself, or a package's primary element.
    pub fn primary_element(&self, component: ComponentId) -> Result<ComponentId> {
        match &self.component(component)?.kind {
            ComponentKind::Element(_) => Ok(component),
            ComponentKind::Package(package) => package
                .primary()
                .ok_or(Error::NotAnElement(component)),
            ComponentKind::Ground => Err(Error::NotAnElement(component)),
        }
    }

    fn resolve_element(&self, component: ComponentId) -> Result<&Element> {
        self.element(self.primary_element(component)?)
    }

    /// Value leaf of an element or built-in package.
    pub fn value(&self, component: ComponentId) -> Result<&Constant> {
        Ok(self.resolve_element(component)?.value())
    }

    /// Change a component's value. Expressions already assembled from it
    /// follow the change without being rebuilt.
    pub fn set_value(&mut self, component: ComponentId, value: f64) -> Result<()> {
        self.value(component)?.set(value);
        log::debug!("set value of {} to {}", component, value);
        Ok(())
    }

    /// Initial voltage (capacitor) or current (inductor) leaf.
    pub fn initial_condition(&self, component: ComponentId) -> Result<&Constant> {
        Ok(self.resolve_element(component)?.initial())
    }

    pub fn set_initial_condition(&mut self, component: ComponentId, value: f64) -> Result<()> {
        self.initial_condition(component)?.set(value);
        Ok(())
    }

    /// Branch current solved at the previous step (NaN before the first one).
    pub fn prev_current(&self, component: ComponentId) -> Result<f64> {
        Ok(self.resolve_element(component)?.prev_current().get())
    }

    pub fn set_prev_current(&mut self, component: ComponentId, current: f64) -> Result<()> {
        self.resolve_element(component)?.prev_current().set(current);
        Ok(())
    }

    /// Node voltage solved at the previous step (NaN before the first one).
    pub fn prev_voltage(&self, node: NodeId) -> Result<f64> {
        Ok(self.node(node)?.prev_voltage().get())
    }

    pub fn set_prev_voltage(&mut self, node: NodeId, voltage: f64) -> Result<()> {
        self.node(node)?.prev_voltage().set(voltage);
        Ok(())
    }

    /// Run every package's per-step refresh hook.
    pub fn update_packages(&mut self) {
        for component in self.components.values_mut() {
            if let ComponentKind::Package(package) = &mut component.kind {
                package.update();
            }
        }
    }

    // ------------------------------------------------------------------
    // Internal accessors
    // ------------------------------------------------------------------

    fn level_mut(&mut self, id: CircuitId) -> Result<&mut Level> {
        self.levels.get_mut(&id).ok_or(Error::CircuitNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(Error::NodeNotFound(id))
    }

    fn component_mut(&mut self, id: ComponentId) -> Result<&mut Component> {
        self.components
            .get_mut(&id)
            .ok_or(Error::ComponentNotFound(id))
    }

    fn package_mut(&mut self, id: ComponentId) -> Result<&mut Package> {
        match &mut self.component_mut(id)?.kind {
            ComponentKind::Package(package) => Ok(package),
            _ => Err(Error::NotAPackage(id)),
        }
    }

    /// Allocate an isolated node in `level` attached to `component`.
    fn new_node(&mut self, level: CircuitId, component: ComponentId) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        self.nodes.insert(id, Node::new(id, level, component));
        if let Some(owner) = self.levels.get_mut(&level) {
            owner.nodes.insert(id);
        }
        id
    }
}
