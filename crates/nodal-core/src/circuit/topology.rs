//! Structural edits: merging nodes, re-pinning and removal.
//!
//! A node lives exactly as long as some component has a pin on it. Every edit
//! that moves a pin away from a node runs the detach check on that node, and
//! the node is destroyed as soon as its component list empties.

use indexmap::IndexSet;

use super::{Circuit, CircuitId, Labeled};
use crate::component::{ComponentId, ComponentKind};
use crate::error::{Error, Result};
use crate::node::NodeId;

impl Circuit {
    /// Merge `node` into `other` and return the survivor, which is always
    /// `other`.
    ///
    /// Every pin and package inner-pin binding that referenced `node` is moved
    /// to `other`, the component lists are unioned and `node` is removed. If
    /// `other` has no label it inherits the label of `node`.
    ///
    /// When both nodes are inner pins of the package owning their level, the
    /// outer pin nodes they are bound to become one net as well, and the merge
    /// continues upward from there.
    pub fn connect(&mut self, node: NodeId, other: NodeId) -> Result<NodeId> {
        if node == other {
            self.node(node)?;
            return Ok(other);
        }
        let level = self.node(node)?.level();
        let other_level = self.node(other)?.level();
        if level != other_level {
            return Err(Error::DoubleRegistration {
                item: format!("node {}", node),
                owner: level.to_string(),
            });
        }

        let shorted = self.shorted_outer_pins(level, node, other);

        let (components, label) = {
            let absorbed = self.node_mut(node)?;
            (absorbed.take_components(), absorbed.take_label())
        };

        for id in &components {
            if let Some(component) = self.components.get_mut(id) {
                for pin in component.pins.iter_mut().filter(|pin| **pin == node) {
                    *pin = other;
                }
            }
        }
        self.rebind_inner_pin(level, node, Some(other));

        let survivor = self.node_mut(other)?;
        for id in components {
            survivor.attach(id);
        }
        let inherit = survivor.label().is_none();
        if let (Some(label), true) = (&label, inherit) {
            survivor.set_label(Some(label.clone()));
        }

        self.nodes.shift_remove(&node);
        let owner = self.level_mut(level)?;
        owner.nodes.shift_remove(&node);
        if let Some(label) = label {
            if inherit {
                owner.labels.insert(label, Labeled::Node(other));
            } else {
                owner.labels.shift_remove(&label);
            }
        }

        log::debug!("merged node {} into {} in {}", node, other, level);

        if let Some((package, outer, survivor)) = shorted {
            log::debug!(
                "short inside {} joins its pins {} and {}",
                package,
                outer,
                survivor
            );
            let outer = self.component(package)?.pin(outer)?;
            let survivor = self.component(package)?.pin(survivor)?;
            self.connect(outer, survivor)?;
        }
        Ok(other)
    }

    /// Outer pins of the package owning `level` that a merge of `node` into
    /// `other` would short together, as `(package, absorbed pin, surviving pin)`.
    fn shorted_outer_pins(
        &self,
        level: CircuitId,
        node: NodeId,
        other: NodeId,
    ) -> Option<(ComponentId, usize, usize)> {
        let parent = self.levels.get(&level)?.parent?;
        let package = self.components.get(&parent)?.as_package()?;
        let absorbed = package.outer_pin_of(node)?;
        let survivor = package.outer_pin_of(other)?;
        Some((parent, absorbed, survivor))
    }

    /// Detach `component` from `node` unless one of its pins still uses it.
    ///
    /// Returns `false` when the component is still connected. A node left
    /// without components is removed from its level.
    pub fn remove_component_if_not_connected(
        &mut self,
        node: NodeId,
        component: ComponentId,
    ) -> Result<bool> {
        let still_connected = self
            .components
            .get(&component)
            .is_some_and(|c| c.pins.contains(&node));
        if still_connected {
            return Ok(false);
        }

        if self.node_mut(node)?.detach(component) {
            self.destroy_node(node)?;
        }
        Ok(true)
    }

    /// Move pin `index` of `component` onto a fresh isolated node and clean up
    /// the node it left. Returns the new node.
    pub fn reset_pin(&mut self, component: ComponentId, index: usize) -> Result<NodeId> {
        let (old, level) = {
            let c = self.component(component)?;
            (c.pin(index)?, c.level())
        };
        let fresh = self.new_node(level, component);
        self.component_mut(component)?.pins[index] = fresh;
        self.remove_component_if_not_connected(old, component)?;
        Ok(fresh)
    }

    /// Reset every pin of `component`.
    pub fn reset_all_pins(&mut self, component: ComponentId) -> Result<()> {
        let pin_count = self.component(component)?.pin_count();
        for index in 0..pin_count {
            self.reset_pin(component, index)?;
        }
        Ok(())
    }

    /// Detach every pin of `component` and delete it.
    ///
    /// Nodes left empty are removed. Removing a package tears down its inner
    /// level, including nested packages.
    pub fn remove_component(&mut self, component: ComponentId) -> Result<()> {
        let (level, pins, label) = {
            let c = self.component_mut(component)?;
            (c.level, std::mem::take(&mut c.pins), c.label.take())
        };
        let pins: IndexSet<NodeId> = pins.into_iter().collect();
        for node in pins {
            self.remove_component_if_not_connected(node, component)?;
        }

        let inner = self
            .components
            .get(&component)
            .and_then(|c| c.as_package())
            .map(|package| package.circuit());
        if let Some(inner) = inner {
            self.remove_level(inner)?;
        }

        let owner = self.level_mut(level)?;
        owner.components.shift_remove(&component);
        if let Some(label) = label {
            owner.labels.shift_remove(&label);
        }
        self.components.shift_remove(&component);
        log::debug!("removed component {} from {}", component, level);
        Ok(())
    }

    /// Disconnect everything from `node`; the node disappears with its last
    /// component.
    pub fn remove_node(&mut self, node: NodeId) -> Result<()> {
        let components: Vec<ComponentId> = self.node(node)?.components().collect();
        for component in components {
            let pins = self.pins(component)?.to_vec();
            for (index, pin) in pins.into_iter().enumerate() {
                if pin == node {
                    self.reset_pin(component, index)?;
                }
            }
        }
        Ok(())
    }

    /// Canonical representative of `node` across hierarchy levels.
    ///
    /// While the node is an inner pin of the package owning its level,
    /// resolution moves to the matching outer pin node. The result is a fixed
    /// point: resolving it again returns it unchanged.
    pub fn highest_level_node(&self, node: NodeId) -> Result<NodeId> {
        let mut current = node;
        loop {
            let level = self.node(current)?.level();
            let Some(parent) = self.level(level)?.parent else {
                return Ok(current);
            };
            let package = self.component(parent)?;
            let outer = package
                .as_package()
                .ok_or(Error::NotAPackage(parent))?
                .outer_pin_of(current);
            match outer {
                Some(index) => current = package.pin(index)?,
                None => return Ok(current),
            }
        }
    }

    fn remove_level(&mut self, level: CircuitId) -> Result<()> {
        let components: Vec<ComponentId> = self.level(level)?.components().collect();
        for component in components {
            self.remove_component(component)?;
        }
        self.levels.shift_remove(&level);
        log::debug!("removed {}", level);
        Ok(())
    }

    fn destroy_node(&mut self, node: NodeId) -> Result<()> {
        let Some(mut removed) = self.nodes.shift_remove(&node) else {
            return Err(Error::NodeNotFound(node));
        };
        let level = removed.level();
        self.rebind_inner_pin(level, node, None);

        let owner = self.level_mut(level)?;
        owner.nodes.shift_remove(&node);
        if let Some(label) = removed.take_label() {
            owner.labels.shift_remove(&label);
        }
        log::trace!("node {} in {} has no components left", node, level);
        Ok(())
    }

    /// Point the owning package's inner-pin binding of `node` at `target`.
    fn rebind_inner_pin(&mut self, level: CircuitId, node: NodeId, target: Option<NodeId>) {
        let Some(parent) = self.levels.get(&level).and_then(|l| l.parent) else {
            return;
        };
        if let Some(ComponentKind::Package(package)) =
            self.components.get_mut(&parent).map(|c| &mut c.kind)
        {
            for slot in package.inner_pins.iter_mut() {
                if *slot == Some(node) {
                    *slot = target;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;

    fn resistor(circuit: &mut Circuit, level: CircuitId, label: &str) -> ComponentId {
        circuit
            .add_element(level, ElementKind::Resistor, 1e3, Some(label))
            .unwrap()
    }

    #[test]
    fn test_connect_keeps_other_side() {
        let mut circuit = Circuit::new();
        let root = CircuitId::ROOT;
        let r1 = resistor(&mut circuit, root, "R1");
        let r2 = resistor(&mut circuit, root, "R2");
        let a = circuit.pin(r1, 1).unwrap();
        let b = circuit.pin(r2, 0).unwrap();

        let survivor = circuit.connect(a, b).unwrap();

        assert_eq!(survivor, b);
        assert!(!circuit.has_node(a));
        assert_eq!(circuit.pin(r1, 1).unwrap(), b);
        assert_eq!(circuit.pin(r2, 0).unwrap(), b);
        assert_eq!(
            circuit.node(b).unwrap().components().collect::<Vec<_>>(),
            vec![r2, r1]
        );
        assert_eq!(circuit.node_count(root).unwrap(), 3);
    }

    #[test]
    fn test_connect_is_idempotent_on_same_node() {
        let mut circuit = Circuit::new();
        let r1 = resistor(&mut circuit, CircuitId::ROOT, "R1");
        let a = circuit.pin(r1, 0).unwrap();
        assert_eq!(circuit.connect(a, a).unwrap(), a);
        assert!(circuit.has_node(a));
    }

    #[test]
    fn test_connect_deduplicates_components() {
        let mut circuit = Circuit::new();
        let r1 = resistor(&mut circuit, CircuitId::ROOT, "R1");
        let a = circuit.pin(r1, 0).unwrap();
        let b = circuit.pin(r1, 1).unwrap();

        circuit.connect(a, b).unwrap();

        assert_eq!(circuit.pins(r1).unwrap(), &[b, b]);
        assert_eq!(circuit.node(b).unwrap().component_count(), 1);
    }

    #[test]
    fn test_connect_moves_label() {
        let mut circuit = Circuit::new();
        let root = CircuitId::ROOT;
        let r1 = resistor(&mut circuit, root, "R1");
        let r2 = resistor(&mut circuit, root, "R2");
        let a = circuit.pin(r1, 1).unwrap();
        let b = circuit.pin(r2, 0).unwrap();
        circuit.set_node_label(a, "MID").unwrap();

        circuit.connect(a, b).unwrap();

        assert_eq!(circuit.find_node(root, "MID"), Some(b));
        assert_eq!(circuit.node(b).unwrap().label(), Some("MID"));
    }

    #[test]
    fn test_connect_drops_label_of_absorbed_node_when_survivor_is_labeled() {
        let mut circuit = Circuit::new();
        let root = CircuitId::ROOT;
        let r1 = resistor(&mut circuit, root, "R1");
        let a = circuit.pin(r1, 0).unwrap();
        let b = circuit.pin(r1, 1).unwrap();
        circuit.set_node_label(a, "A").unwrap();
        circuit.set_node_label(b, "B").unwrap();

        circuit.connect(a, b).unwrap();

        assert_eq!(circuit.find(root, "A"), None);
        assert_eq!(circuit.find_node(root, "B"), Some(b));
    }

    #[test]
    fn test_connect_across_levels_is_rejected() {
        let mut circuit = Circuit::new();
        let root = CircuitId::ROOT;
        let pkg = circuit.add_package(root, 1, Some("U1")).unwrap();
        let inner = circuit.package_circuit(pkg).unwrap();
        let inner_r = resistor(&mut circuit, inner, "R");
        let outer_r = resistor(&mut circuit, root, "R");

        let err = circuit
            .connect(circuit.pin(inner_r, 0).unwrap(), circuit.pin(outer_r, 0).unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::DoubleRegistration { .. }));
        assert_eq!(circuit.node_count(inner).unwrap(), 2);
    }

    #[test]
    fn test_connect_rebinds_inner_pin() {
        let mut circuit = Circuit::new();
        let pkg = circuit.add_package(CircuitId::ROOT, 1, None).unwrap();
        let inner = circuit.package_circuit(pkg).unwrap();
        let r1 = resistor(&mut circuit, inner, "R1");
        let r2 = resistor(&mut circuit, inner, "R2");
        let bound = circuit.pin(r1, 0).unwrap();
        circuit.set_inner_pin(pkg, 0, bound).unwrap();

        let survivor = circuit.connect(bound, circuit.pin(r2, 0).unwrap()).unwrap();

        assert_eq!(circuit.package(pkg).unwrap().inner_pin(0), Some(survivor));
    }

    /// Two-pin package with one inner resistor bound to each outer pin:
    ///
    /// ```text
    /// root:  top ──[ U ]── bottom
    /// U:     pin0 ── A ──  B ── pin1
    /// ```
    #[test]
    fn test_connect_short_inside_package_joins_outer_pins() {
        let mut circuit = Circuit::new();
        let root = CircuitId::ROOT;
        let pkg = circuit.add_package(root, 2, Some("U")).unwrap();
        let inner = circuit.package_circuit(pkg).unwrap();
        let a = resistor(&mut circuit, inner, "A");
        let b = resistor(&mut circuit, inner, "B");
        circuit.set_inner_pin(pkg, 0, circuit.pin(a, 0).unwrap()).unwrap();
        circuit.set_inner_pin(pkg, 1, circuit.pin(b, 0).unwrap()).unwrap();
        let r_out = resistor(&mut circuit, root, "ROUT");
        let top = circuit
            .connect(circuit.pin(pkg, 0).unwrap(), circuit.pin(r_out, 0).unwrap())
            .unwrap();
        let bottom = circuit
            .connect(circuit.pin(pkg, 1).unwrap(), circuit.pin(r_out, 1).unwrap())
            .unwrap();

        let shorted = circuit
            .connect(circuit.pin(a, 0).unwrap(), circuit.pin(b, 0).unwrap())
            .unwrap();

        assert_eq!(circuit.pin(pkg, 0).unwrap(), circuit.pin(pkg, 1).unwrap());
        assert!(!circuit.has_node(top));
        assert_eq!(circuit.highest_level_node(shorted).unwrap(), bottom);
        assert_eq!(circuit.pins(r_out).unwrap(), &[bottom, bottom]);
        assert_eq!(circuit.node_count(root).unwrap(), 1);
    }

    #[test]
    fn test_connect_short_propagates_through_nested_packages() {
        let mut circuit = Circuit::new();
        let root = CircuitId::ROOT;
        let outer = circuit.add_package(root, 2, Some("OUTER")).unwrap();
        let level1 = circuit.package_circuit(outer).unwrap();
        let middle = circuit.add_package(level1, 2, Some("MIDDLE")).unwrap();
        for pin in 0..2 {
            let node = circuit.pin(middle, pin).unwrap();
            circuit.set_inner_pin(outer, pin, node).unwrap();
        }
        let level2 = circuit.package_circuit(middle).unwrap();
        let a = resistor(&mut circuit, level2, "A");
        let b = resistor(&mut circuit, level2, "B");
        circuit.set_inner_pin(middle, 0, circuit.pin(a, 0).unwrap()).unwrap();
        circuit.set_inner_pin(middle, 1, circuit.pin(b, 0).unwrap()).unwrap();

        let shorted = circuit
            .connect(circuit.pin(a, 0).unwrap(), circuit.pin(b, 0).unwrap())
            .unwrap();

        let top = circuit.pin(outer, 1).unwrap();
        assert_eq!(circuit.pin(outer, 0).unwrap(), top);
        assert_eq!(circuit.highest_level_node(shorted).unwrap(), top);
        assert_eq!(circuit.node_count(level1).unwrap(), 1);
    }

    #[test]
    fn test_reset_pin_replaces_node_and_cleans_up() {
        let mut circuit = Circuit::new();
        let root = CircuitId::ROOT;
        let r1 = resistor(&mut circuit, root, "R1");
        let old = circuit.pin(r1, 0).unwrap();

        let fresh = circuit.reset_pin(r1, 0).unwrap();

        assert_ne!(fresh, old);
        assert!(!circuit.has_node(old));
        assert_eq!(circuit.pin(r1, 0).unwrap(), fresh);
        assert_eq!(circuit.node_count(root).unwrap(), 2);
        assert!(matches!(
            circuit.reset_pin(r1, 2),
            Err(Error::InvalidPinIndex { index: 2, .. })
        ));
    }

    #[test]
    fn test_reset_pin_keeps_shared_node() {
        let mut circuit = Circuit::new();
        let r1 = resistor(&mut circuit, CircuitId::ROOT, "R1");
        let r2 = resistor(&mut circuit, CircuitId::ROOT, "R2");
        let shared = circuit
            .connect(circuit.pin(r1, 1).unwrap(), circuit.pin(r2, 0).unwrap())
            .unwrap();

        circuit.reset_pin(r1, 1).unwrap();

        assert!(circuit.has_node(shared));
        assert!(!circuit.node(shared).unwrap().is_attached(r1));
        assert!(circuit.node(shared).unwrap().is_attached(r2));
    }

    #[test]
    fn test_still_connected_through_other_pin() {
        let mut circuit = Circuit::new();
        let r1 = resistor(&mut circuit, CircuitId::ROOT, "R1");
        let a = circuit.pin(r1, 0).unwrap();
        let b = circuit.pin(r1, 1).unwrap();
        circuit.connect(a, b).unwrap();

        circuit.reset_pin(r1, 0).unwrap();

        assert!(circuit.has_node(b));
        assert!(circuit.node(b).unwrap().is_attached(r1));
        assert!(!circuit.remove_component_if_not_connected(b, r1).unwrap());
    }

    #[test]
    fn test_remove_last_component_removes_node() {
        let mut circuit = Circuit::new();
        let root = CircuitId::ROOT;
        let r1 = resistor(&mut circuit, root, "R1");
        let r2 = resistor(&mut circuit, root, "R2");
        let shared = circuit
            .connect(circuit.pin(r1, 1).unwrap(), circuit.pin(r2, 0).unwrap())
            .unwrap();
        let lone = circuit.pin(r1, 0).unwrap();

        circuit.remove_component(r1).unwrap();

        assert!(!circuit.has_component(r1));
        assert!(!circuit.has_node(lone));
        assert!(circuit.has_node(shared));
        assert_eq!(circuit.find(root, "R1"), None);
        assert_eq!(circuit.node_count(root).unwrap(), 2);

        circuit.remove_component(r2).unwrap();
        assert_eq!(circuit.node_count(root).unwrap(), 0);
        assert_eq!(circuit.component_count(root).unwrap(), 0);
    }

    #[test]
    fn test_remove_package_tears_down_inner_level() {
        let mut circuit = Circuit::new();
        let root = CircuitId::ROOT;
        let outer = circuit.add_package(root, 1, Some("OUTER")).unwrap();
        let level1 = circuit.package_circuit(outer).unwrap();
        let nested = circuit.add_voltage_source(level1, 1.0, 1.0, Some("V")).unwrap();
        let level2 = circuit.package_circuit(nested).unwrap();

        circuit.remove_component(outer).unwrap();

        assert!(circuit.level(level1).is_err());
        assert!(circuit.level(level2).is_err());
        assert!(!circuit.has_component(nested));
        assert_eq!(circuit.node_count(root).unwrap(), 0);
        assert!(circuit.nodes.is_empty());
        assert!(circuit.components.is_empty());
    }

    #[test]
    fn test_removing_inner_node_unbinds_inner_pin() {
        let mut circuit = Circuit::new();
        let pkg = circuit.add_resistor(CircuitId::ROOT, 10.0, None).unwrap();
        let inner = circuit.package_circuit(pkg).unwrap();
        let r = circuit.find_component(inner, "R").unwrap();

        circuit.remove_component(r).unwrap();

        assert_eq!(circuit.package(pkg).unwrap().inner_pins(), &[None, None]);
    }

    #[test]
    fn test_remove_node_disconnects_everything() {
        let mut circuit = Circuit::new();
        let root = CircuitId::ROOT;
        let r1 = resistor(&mut circuit, root, "R1");
        let r2 = resistor(&mut circuit, root, "R2");
        let shared = circuit
            .connect(circuit.pin(r1, 1).unwrap(), circuit.pin(r2, 0).unwrap())
            .unwrap();
        circuit.set_node_label(shared, "MID").unwrap();

        circuit.remove_node(shared).unwrap();

        assert!(!circuit.has_node(shared));
        assert_eq!(circuit.find(root, "MID"), None);
        assert_ne!(circuit.pin(r1, 1).unwrap(), circuit.pin(r2, 0).unwrap());
        assert_eq!(circuit.node_count(root).unwrap(), 4);
    }

    #[test]
    fn test_highest_level_node_resolves_through_nesting() {
        let mut circuit = Circuit::new();
        let root = CircuitId::ROOT;
        let outer = circuit.add_package(root, 2, Some("OUTER")).unwrap();
        let level1 = circuit.package_circuit(outer).unwrap();
        let inner_pkg = circuit.add_resistor(level1, 10.0, Some("RP")).unwrap();
        circuit
            .set_inner_pin(outer, 0, circuit.pin(inner_pkg, 0).unwrap())
            .unwrap();

        let level2 = circuit.package_circuit(inner_pkg).unwrap();
        let leaf = circuit.find_component(level2, "R").unwrap();
        let deepest = circuit.pin(leaf, 0).unwrap();
        let canonical = circuit.highest_level_node(deepest).unwrap();

        assert_eq!(canonical, circuit.pin(outer, 0).unwrap());
        assert_eq!(circuit.highest_level_node(canonical).unwrap(), canonical);

        // Pin 1 of the nested package is not exported by OUTER.
        let low = circuit.pin(leaf, 1).unwrap();
        assert_eq!(
            circuit.highest_level_node(low).unwrap(),
            circuit.pin(inner_pkg, 1).unwrap()
        );
    }
}
