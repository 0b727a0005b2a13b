// SPDX-License-Identifier: MIT OR Apache-2.0
//! Type resolution for pins.
//!
//! A node kind gets the first say for its own pins. Otherwise a pin is what
//! it declares, and an untyped data input takes the declared type of the pin
//! feeding it. Resolution never looks further than one hop and never fails:
//! anything undetermined is `Object` for classes and any (`Nil`) for kinds.

use crate::graph::Graph;
use crate::kinds::{ResolvedInputs, TypeInfo};
use crate::node::{Node, NodeId};
use crate::pin::{Pin, PinDirection, PinRef};
use crate::variant::{VariantType, OBJECT_CLASS};

impl Graph {
    /// Class the pin should be treated as
    pub fn resolve_type_class(&self, pin_ref: PinRef) -> String {
        let Some((node, pin)) = self.node_and_pin(pin_ref) else {
            return OBJECT_CLASS.to_string();
        };
        if let Some(class_name) = node.kind().resolve_type_class(node, pin, self) {
            return class_name;
        }
        if let Some(class_name) = pin.target_class() {
            return class_name.to_string();
        }
        self.feeding_pin(pin)
            .and_then(Pin::target_class)
            .unwrap_or(OBJECT_CLASS)
            .to_string()
    }

    /// Value kind the pin should be treated as
    pub fn resolve_pin_type(&self, pin_ref: PinRef) -> VariantType {
        let Some((node, pin)) = self.node_and_pin(pin_ref) else {
            return VariantType::Nil;
        };
        if let Some(pin_type) = node.kind().resolve_pin_type(node, pin, self) {
            return pin_type;
        }
        if !pin.pin_type().is_nil() {
            return pin.pin_type();
        }
        self.feeding_pin(pin).map_or(VariantType::Nil, Pin::pin_type)
    }

    /// Both halves of a pin's resolved type
    pub fn resolve_type_info(&self, pin_ref: PinRef) -> TypeInfo {
        TypeInfo {
            variant_type: self.resolve_pin_type(pin_ref),
            class_name: self.resolve_type_class(pin_ref),
        }
    }

    /// Resolved types of a node's connected data inputs, keyed by pin name
    pub(crate) fn resolve_connected_inputs(&self, node_id: NodeId) -> ResolvedInputs {
        let mut inputs = ResolvedInputs::new();
        let Some(node) = self.node(node_id) else {
            return inputs;
        };
        for pin in node.find_pins(Some(PinDirection::Input)) {
            if pin.is_data() && pin.has_any_connections() {
                let info = self.resolve_type_info(PinRef::new(node_id, pin.id()));
                inputs.insert(pin.name().to_string(), info);
            }
        }
        inputs
    }

    fn node_and_pin(&self, pin_ref: PinRef) -> Option<(&Node, &Pin)> {
        let node = self.node(pin_ref.node)?;
        let pin = node.pin(pin_ref.pin)?;
        Some((node, pin))
    }

    /// The output feeding a connected data input
    fn feeding_pin(&self, pin: &Pin) -> Option<&Pin> {
        if !pin.is_input() || !pin.is_data() {
            return None;
        }
        pin.connections().first().and_then(|peer| self.pin(*peer))
    }
}
