//! Composite devices built from an inner circuit level.
//!
//! A package exposes `n` outer pins. Each outer pin `i` may be bound to an
//! inner node; flattening treats that inner node as the same net as outer pin
//! `i`. The built-in packages wire primitives at construction:
//!
//! ```text
//! Ground          pin0 ── R(1e9) ── GND
//! VoltageSource   pin0 ──(+ V_th -)── R_th ── pin1
//! CurrentSource   pin0 ──┬── I_n ──┬── pin1
//!                        └── R_n ──┘
//! Resistor        pin0 ── R ── pin1
//! Capacitor       pin0 ── C ── pin1
//! Inductor        pin0 ── L ── pin1
//! ```

use crate::circuit::{Circuit, CircuitId};
use crate::component::ComponentId;
use crate::element::ElementKind;
use crate::error::Result;
use crate::node::NodeId;

/// Resistance between a [`Circuit::add_ground`] pin and the ideal ground.
pub const GROUND_RESISTANCE: f64 = 1e9;

/// Which composite a package is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageKind {
    /// User-assembled package; starts with an empty inner level.
    Custom,
    Ground,
    VoltageSource,
    CurrentSource,
    Resistor,
    Capacitor,
    Inductor,
}

/// Package-specific state of a component.
#[derive(Debug)]
pub struct Package {
    kind: PackageKind,
    /// Inner level owned by this package.
    circuit: CircuitId,
    /// Inner node bound to each outer pin.
    pub(crate) inner_pins: Vec<Option<NodeId>>,
    /// Element whose value stands for the package's value.
    pub(crate) primary: Option<ComponentId>,
}

impl Package {
    pub(crate) fn new(kind: PackageKind, circuit: CircuitId, pin_count: usize) -> Self {
        Self {
            kind,
            circuit,
            inner_pins: vec![None; pin_count],
            primary: None,
        }
    }

    pub fn kind(&self) -> PackageKind {
        self.kind
    }

    /// The inner level.
    pub fn circuit(&self) -> CircuitId {
        self.circuit
    }

    pub fn inner_pins(&self) -> &[Option<NodeId>] {
        &self.inner_pins
    }

    /// Inner node bound to outer pin `index`, if any.
    pub fn inner_pin(&self, index: usize) -> Option<NodeId> {
        self.inner_pins.get(index).copied().flatten()
    }

    /// Outer pin index bound to `node`, if it is one of the inner pins.
    pub fn outer_pin_of(&self, node: NodeId) -> Option<usize> {
        self.inner_pins.iter().position(|pin| *pin == Some(node))
    }

    pub fn primary(&self) -> Option<ComponentId> {
        self.primary
    }

    /// Per-step refresh hook. The built-in packages have nothing to refresh.
    pub fn update(&mut self) {
        log::trace!("update {:?} package at {}", self.kind, self.circuit);
    }
}

impl Circuit {
    /// Ground with the default [`GROUND_RESISTANCE`].
    pub fn add_ground(&mut self, level: CircuitId, label: Option<&str>) -> Result<ComponentId> {
        self.add_ground_with_resistance(level, GROUND_RESISTANCE, label)
    }

    /// One-pin package tying its pin to the ideal ground through `r`.
    pub fn add_ground_with_resistance(
        &mut self,
        level: CircuitId,
        r: f64,
        label: Option<&str>,
    ) -> Result<ComponentId> {
        let package = self.insert_package(level, PackageKind::Ground, 1, label)?;
        let inner = self.package_circuit(package)?;

        let res = self.add_element(inner, ElementKind::Resistor, r, Some("R"))?;
        let gnd = self.add_ideal_ground(inner, Some("GND"))?;
        let res_low = self.pin(res, 1)?;
        let gnd_pin = self.pin(gnd, 0)?;
        self.connect(res_low, gnd_pin)?;

        let res_high = self.pin(res, 0)?;
        self.set_inner_pin(package, 0, res_high)?;
        self.set_primary(package, res)?;
        Ok(package)
    }

    /// Practical voltage source: ideal `v_th` in series with `r_th`.
    ///
    /// Pin 0 is the positive terminal.
    pub fn add_voltage_source(
        &mut self,
        level: CircuitId,
        v_th: f64,
        r_th: f64,
        label: Option<&str>,
    ) -> Result<ComponentId> {
        let package = self.insert_package(level, PackageKind::VoltageSource, 2, label)?;
        let inner = self.package_circuit(package)?;

        let v = self.add_element(inner, ElementKind::VoltageSource, v_th, Some("V_th"))?;
        let r = self.add_element(inner, ElementKind::Resistor, r_th, Some("R_th"))?;
        let v_low = self.pin(v, 1)?;
        let r_high = self.pin(r, 0)?;
        self.connect(v_low, r_high)?;

        let v_high = self.pin(v, 0)?;
        let r_low = self.pin(r, 1)?;
        self.set_inner_pin(package, 0, v_high)?;
        self.set_inner_pin(package, 1, r_low)?;
        self.set_primary(package, v)?;
        Ok(package)
    }

    /// Practical current source: ideal `i_n` in parallel with `r_n`.
    ///
    /// The source drives current from pin 0 to pin 1 through itself.
    pub fn add_current_source(
        &mut self,
        level: CircuitId,
        i_n: f64,
        r_n: f64,
        label: Option<&str>,
    ) -> Result<ComponentId> {
        let package = self.insert_package(level, PackageKind::CurrentSource, 2, label)?;
        let inner = self.package_circuit(package)?;

        let i = self.add_element(inner, ElementKind::CurrentSource, i_n, Some("I_n"))?;
        let r = self.add_element(inner, ElementKind::Resistor, r_n, Some("R_n"))?;
        for pin in 0..2 {
            let i_pin = self.pin(i, pin)?;
            let r_pin = self.pin(r, pin)?;
            let joined = self.connect(i_pin, r_pin)?;
            self.set_inner_pin(package, pin, joined)?;
        }
        self.set_primary(package, i)?;
        Ok(package)
    }

    /// Two-pin package around a single resistor.
    pub fn add_resistor(
        &mut self,
        level: CircuitId,
        r: f64,
        label: Option<&str>,
    ) -> Result<ComponentId> {
        self.wrap_element(level, PackageKind::Resistor, ElementKind::Resistor, r, 0.0, label)
    }

    /// Two-pin package around a single capacitor charged to `v0`.
    pub fn add_capacitor(
        &mut self,
        level: CircuitId,
        c: f64,
        v0: f64,
        label: Option<&str>,
    ) -> Result<ComponentId> {
        self.wrap_element(level, PackageKind::Capacitor, ElementKind::Capacitor, c, v0, label)
    }

    /// Two-pin package around a single inductor carrying `i0`.
    pub fn add_inductor(
        &mut self,
        level: CircuitId,
        l: f64,
        i0: f64,
        label: Option<&str>,
    ) -> Result<ComponentId> {
        self.wrap_element(level, PackageKind::Inductor, ElementKind::Inductor, l, i0, label)
    }

    fn wrap_element(
        &mut self,
        level: CircuitId,
        package_kind: PackageKind,
        element_kind: ElementKind,
        value: f64,
        initial: f64,
        label: Option<&str>,
    ) -> Result<ComponentId> {
        let package = self.insert_package(level, package_kind, 2, label)?;
        let inner = self.package_circuit(package)?;

        let name = element_kind.prefix().to_string();
        let element =
            self.add_element_with_initial(inner, element_kind, value, initial, Some(&name))?;
        for pin in 0..2 {
            let node = self.pin(element, pin)?;
            self.set_inner_pin(package, pin, node)?;
        }
        self.set_primary(package, element)?;
        Ok(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentKind;

    #[test]
    fn test_ground_package_wiring() {
        let mut circuit = Circuit::new();
        let gnd = circuit.add_ground(CircuitId::ROOT, Some("G")).unwrap();
        let inner = circuit.package_circuit(gnd).unwrap();

        // R and GND share one node after construction.
        assert_eq!(circuit.node_count(inner).unwrap(), 2);
        assert_eq!(circuit.component_count(inner).unwrap(), 2);
        assert_eq!(circuit.value(gnd).unwrap().get(), GROUND_RESISTANCE);

        let r = circuit.find_component(inner, "R").unwrap();
        let ideal = circuit.find_component(inner, "GND").unwrap();
        assert_eq!(circuit.pin(r, 1).unwrap(), circuit.pin(ideal, 0).unwrap());
        assert!(matches!(
            circuit.component(ideal).unwrap().kind(),
            ComponentKind::Ground
        ));
    }

    #[test]
    fn test_voltage_source_package_wiring() {
        let mut circuit = Circuit::new();
        let vs = circuit
            .add_voltage_source(CircuitId::ROOT, 10.0, 1e-3, Some("VIN"))
            .unwrap();
        let inner = circuit.package_circuit(vs).unwrap();
        let v = circuit.find_component(inner, "V_th").unwrap();
        let r = circuit.find_component(inner, "R_th").unwrap();

        assert_eq!(circuit.pin(v, 1).unwrap(), circuit.pin(r, 0).unwrap());

        let package = circuit.package(vs).unwrap();
        assert_eq!(package.kind(), PackageKind::VoltageSource);
        assert_eq!(package.inner_pin(0), Some(circuit.pin(v, 0).unwrap()));
        assert_eq!(package.inner_pin(1), Some(circuit.pin(r, 1).unwrap()));
        assert_eq!(package.primary(), Some(v));
        assert_eq!(circuit.value(vs).unwrap().get(), 10.0);
    }

    #[test]
    fn test_current_source_package_is_parallel() {
        let mut circuit = Circuit::new();
        let cs = circuit
            .add_current_source(CircuitId::ROOT, 0.01, 1e6, None)
            .unwrap();
        let inner = circuit.package_circuit(cs).unwrap();
        let i = circuit.find_component(inner, "I_n").unwrap();
        let r = circuit.find_component(inner, "R_n").unwrap();

        assert_eq!(circuit.node_count(inner).unwrap(), 2);
        assert_eq!(circuit.pins(i).unwrap(), circuit.pins(r).unwrap());
        assert_eq!(
            circuit.package(cs).unwrap().inner_pins(),
            &[
                Some(circuit.pin(r, 0).unwrap()),
                Some(circuit.pin(r, 1).unwrap())
            ]
        );
    }

    #[test]
    fn test_reactive_packages_keep_initial_condition() {
        let mut circuit = Circuit::new();
        let c = circuit
            .add_capacitor(CircuitId::ROOT, 1e-6, 1.5, Some("C1"))
            .unwrap();
        let l = circuit
            .add_inductor(CircuitId::ROOT, 1e-3, 0.25, Some("L1"))
            .unwrap();

        assert_eq!(circuit.initial_condition(c).unwrap().get(), 1.5);
        assert_eq!(circuit.initial_condition(l).unwrap().get(), 0.25);
        assert_eq!(circuit.value(c).unwrap().get(), 1e-6);
        assert_eq!(circuit.package(l).unwrap().kind(), PackageKind::Inductor);
    }

    #[test]
    fn test_outer_pin_lookup() {
        let mut circuit = Circuit::new();
        let r = circuit.add_resistor(CircuitId::ROOT, 100.0, None).unwrap();
        let package = circuit.package(r).unwrap();
        let inner_high = package.inner_pin(0).unwrap();
        let inner_low = package.inner_pin(1).unwrap();

        assert_eq!(package.outer_pin_of(inner_high), Some(0));
        assert_eq!(package.outer_pin_of(inner_low), Some(1));
        assert_eq!(package.outer_pin_of(circuit.pin(r, 0).unwrap()), None);
    }
}
