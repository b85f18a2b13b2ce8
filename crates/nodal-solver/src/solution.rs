//! Solved unknowns of one step and history write-back.

use indexmap::IndexSet;
use nalgebra::DVector;
use nodal_core::{Circuit, ComponentId, NodeId};

use crate::error::Result;

/// Node voltages and branch currents solved for one step.
#[derive(Debug, Clone)]
pub struct StepSolution {
    nodes: IndexSet<NodeId>,
    elements: IndexSet<ComponentId>,
    /// Node voltages followed by branch currents, in column order.
    values: DVector<f64>,
}

impl StepSolution {
    pub(crate) fn new(
        nodes: IndexSet<NodeId>,
        elements: IndexSet<ComponentId>,
        values: DVector<f64>,
    ) -> Self {
        Self {
            nodes,
            elements,
            values,
        }
    }

    /// Voltage of a canonical node.
    pub fn voltage(&self, node: NodeId) -> Option<f64> {
        self.nodes.get_index_of(&node).map(|i| self.values[i])
    }

    /// Voltage of any node, resolved to its canonical node first.
    pub fn voltage_at(&self, circuit: &Circuit, node: NodeId) -> Result<Option<f64>> {
        Ok(self.voltage(circuit.highest_level_node(node)?))
    }

    /// Branch current of a leaf component, flowing from pin 0 to pin 1.
    pub fn current(&self, element: ComponentId) -> Option<f64> {
        self.elements
            .get_index_of(&element)
            .map(|i| self.values[self.nodes.len() + i])
    }

    /// Branch current of an element or of a package's primary element.
    pub fn current_of(&self, circuit: &Circuit, component: ComponentId) -> Result<Option<f64>> {
        Ok(self.current(circuit.primary_element(component)?))
    }

    /// Solution vector in column order.
    pub fn as_vector(&self) -> &DVector<f64> {
        &self.values
    }

    /// Store this step as the history of the next one: node voltages into
    /// each canonical node, branch currents into each element.
    ///
    /// Ground sentinels carry no history and are skipped.
    pub fn commit(&self, circuit: &mut Circuit) -> Result<()> {
        for (i, &node) in self.nodes.iter().enumerate() {
            circuit.set_prev_voltage(node, self.values[i])?;
        }
        let offset = self.nodes.len();
        for (i, &id) in self.elements.iter().enumerate() {
            if circuit.component(id)?.as_element().is_some() {
                circuit.set_prev_current(id, self.values[offset + i])?;
            }
        }
        circuit.update_packages();
        log::trace!(
            "committed {} node voltages and {} branch currents",
            self.nodes.len(),
            self.elements.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::CircuitMatrix;
    use nodal_core::{CircuitId, ElementKind};

    /// ```text
    /// (+) I1 = 2mA ── top ── R1 = 1k ── GND
    /// ```
    ///
    /// The current source pushes 2 mA from the ground node into `top`.
    fn loaded_current_source() -> (Circuit, ComponentId, ComponentId, NodeId) {
        let mut circuit = Circuit::new();
        let root = CircuitId::ROOT;
        let i1 = circuit
            .add_element(root, ElementKind::CurrentSource, 2e-3, Some("I1"))
            .unwrap();
        let r1 = circuit
            .add_element(root, ElementKind::Resistor, 1e3, Some("R1"))
            .unwrap();
        let gnd = circuit.add_ideal_ground(root, None).unwrap();

        let top = circuit
            .connect(circuit.pin(i1, 1).unwrap(), circuit.pin(r1, 0).unwrap())
            .unwrap();
        let bottom = circuit
            .connect(circuit.pin(r1, 1).unwrap(), circuit.pin(gnd, 0).unwrap())
            .unwrap();
        circuit.connect(circuit.pin(i1, 0).unwrap(), bottom).unwrap();
        (circuit, i1, r1, top)
    }

    #[test]
    fn test_current_source_into_resistor() {
        let (circuit, i1, r1, top) = loaded_current_source();
        let solution = CircuitMatrix::generate(&circuit, 1e-6)
            .unwrap()
            .solve()
            .unwrap();

        let v_top = solution.voltage(top).unwrap();
        assert!((v_top - 2.0).abs() < 1e-9, "V(top) = {} (expected 2.0)", v_top);

        let i_r = solution.current(r1).unwrap();
        assert!((i_r - 2e-3).abs() < 1e-12, "I(R1) = {} (expected 2e-3)", i_r);
        assert!((solution.current(i1).unwrap() - 2e-3).abs() < 1e-12);
    }

    #[test]
    fn test_commit_writes_history() {
        let (mut circuit, i1, r1, top) = loaded_current_source();
        let solution = CircuitMatrix::generate(&circuit, 1e-6)
            .unwrap()
            .solve()
            .unwrap();
        solution.commit(&mut circuit).unwrap();

        assert!((circuit.prev_voltage(top).unwrap() - 2.0).abs() < 1e-9);
        assert!((circuit.prev_current(r1).unwrap() - 2e-3).abs() < 1e-12);
        assert!((circuit.prev_current(i1).unwrap() - 2e-3).abs() < 1e-12);
    }

    #[test]
    fn test_lookup_outside_system() {
        let (circuit, _, r1, _) = loaded_current_source();
        let solution = CircuitMatrix::generate(&circuit, 1e-6)
            .unwrap()
            .solve()
            .unwrap();

        assert_eq!(solution.voltage(NodeId::new(999)), None);
        assert_eq!(solution.current(ComponentId::new(999)), None);
        assert_eq!(solution.as_vector().len(), 2 + 3);
        assert_eq!(
            solution.current_of(&circuit, r1).unwrap(),
            solution.current(r1)
        );
    }
}
