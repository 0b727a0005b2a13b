// SPDX-License-Identifier: MIT OR Apache-2.0
//! Generic select: picks one of two values.

use super::{default_rewire_compatible, NodeKind, PropertyChange};
use crate::graph::Graph;
use crate::instance::{ExecutionContext, ExecutionOwner, NodeInstance};
use crate::node::{Node, PinSet};
use crate::pin::{Pin, PinDirection};
use crate::variant::{Variant, VariantType};
use indexmap::IndexMap;
use std::any::Any;

const GENERIC_PINS: [&str; 3] = ["a", "b", "result"];

/// Returns `a` if `pick_a` is true, otherwise `b`
#[derive(Debug, Clone, Default)]
pub struct Select {
    pin_type: VariantType,
}

impl Select {
    /// Create a select over values of the given kind
    pub fn new(pin_type: VariantType) -> Self {
        Self { pin_type }
    }

    /// Kind of the `a`, `b` and `result` pins
    pub fn pin_type(&self) -> VariantType {
        self.pin_type
    }
}

struct SelectInstance;

impl NodeInstance for SelectInstance {
    fn step(&self, context: &mut ExecutionContext) -> usize {
        let picked = if context.get_input(2).is_truthy() {
            context.get_input(0).clone()
        } else {
            context.get_input(1).clone()
        };
        context.set_output(0, picked);
        0
    }
}

impl NodeKind for Select {
    fn type_name(&self) -> &'static str {
        "Select"
    }

    fn icon(&self) -> String {
        "ClassList".to_string()
    }

    fn tooltip(&self) -> String {
        "If 'Pick A' is true, A is returned, otherwise B is.".to_string()
    }

    fn allocate_default_pins(&self, pins: &mut PinSet) {
        let default = self.pin_type.default_value();
        pins.create_data_pin(PinDirection::Input, "a", self.pin_type, default.clone());
        pins.create_data_pin(PinDirection::Input, "b", self.pin_type, default);
        pins.create_data_pin(PinDirection::Input, "pick_a", VariantType::Bool, Variant::Bool(false));
        pins.create_data_pin(PinDirection::Output, "result", self.pin_type, Variant::Nil);
    }

    fn is_rewire_compatible(&self, old: &Pin, new: &Pin) -> bool {
        // Retyping is an explicit user choice; keep the generic pins' links
        if GENERIC_PINS.contains(&new.name()) && old.is_data() && new.is_data() {
            return true;
        }
        default_rewire_compatible(old, new)
    }

    fn can_change_pin_type(&self) -> bool {
        true
    }

    fn possible_pin_types(&self) -> Vec<VariantType> {
        VariantType::ALL
            .iter()
            .copied()
            .filter(|t| !t.is_nil() && t.index() < VariantType::Object.index())
            .collect()
    }

    fn change_pin_types(&mut self, pin_type: VariantType) -> bool {
        if pin_type == self.pin_type {
            return false;
        }
        self.pin_type = pin_type;
        true
    }

    fn properties(&self) -> IndexMap<String, Variant> {
        let mut properties = IndexMap::new();
        properties.insert("type".to_string(), Variant::from(self.pin_type.name()));
        properties
    }

    fn set_property(&mut self, name: &str, value: &Variant) -> PropertyChange {
        if name != "type" {
            return PropertyChange::Ignored;
        }
        let pin_type = match value {
            // Numbered types skip "any", so 0 is the first concrete kind
            Variant::Int(n) => usize::try_from(*n)
                .ok()
                .and_then(|n| VariantType::from_index(n + 1)),
            _ => VariantType::from_variant(value),
        };
        match pin_type {
            Some(pin_type) if self.change_pin_types(pin_type) => PropertyChange::PinsChanged,
            Some(_) => PropertyChange::Updated,
            None => PropertyChange::Ignored,
        }
    }

    fn resolve_pin_type(&self, node: &Node, pin: &Pin, graph: &Graph) -> Option<VariantType> {
        if !GENERIC_PINS.contains(&pin.name()) {
            return None;
        }
        if !self.pin_type.is_nil() {
            return Some(self.pin_type);
        }

        // Untyped: look at what feeds `a` and `b`
        let mut common = None;
        for name in ["a", "b"] {
            let Some(input) = node.find_pin(name, Some(PinDirection::Input)) else {
                continue;
            };
            for peer in input.connections() {
                let Some(peer_type) = graph.pin(*peer).map(Pin::pin_type) else {
                    continue;
                };
                if peer_type.is_nil() {
                    continue;
                }
                match common {
                    None => common = Some(peer_type),
                    Some(existing) if existing == peer_type => {}
                    Some(_) => return None,
                }
            }
        }
        common
    }

    fn instantiate(&self, _node: &Node, _owner: &ExecutionOwner) -> Box<dyn NodeInstance> {
        Box::new(SelectInstance)
    }

    fn clone_box(&self) -> Box<dyn NodeKind> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(a: Variant, b: Variant, pick_a: Variant) -> (usize, ExecutionContext) {
        let mut context = ExecutionContext::new(vec![a, b, pick_a], 1);
        let control = SelectInstance.step(&mut context);
        (control, context)
    }

    #[test]
    fn test_step_picks_a() {
        let (control, context) = step(Variant::from("x"), Variant::from("y"), Variant::Bool(true));
        assert_eq!(control, 0);
        assert_eq!(context.output(0), Some(&Variant::from("x")));
    }

    #[test]
    fn test_step_picks_b() {
        let (control, context) = step(Variant::from("x"), Variant::from("y"), Variant::Bool(false));
        assert_eq!(control, 0);
        assert_eq!(context.output(0), Some(&Variant::from("y")));

        // Missing condition reads as nil, which is false
        let mut context = ExecutionContext::new(vec![Variant::Int(1), Variant::Int(2)], 1);
        SelectInstance.step(&mut context);
        assert_eq!(context.output(0), Some(&Variant::Int(2)));
    }

    #[test]
    fn test_possible_pin_types_exclude_any_and_references() {
        let types = Select::default().possible_pin_types();
        assert!(types.contains(&VariantType::Int));
        assert!(types.contains(&VariantType::Quaternion));
        assert!(!types.contains(&VariantType::Nil));
        assert!(!types.contains(&VariantType::Object));
        assert!(!types.contains(&VariantType::Dictionary));
    }

    #[test]
    fn test_type_property() {
        let mut select = Select::default();
        assert_eq!(select.set_property("type", &Variant::from("float")), PropertyChange::PinsChanged);
        assert_eq!(select.pin_type(), VariantType::Float);
        assert_eq!(select.set_property("type", &Variant::from("nope")), PropertyChange::Ignored);
        assert_eq!(select.get_property("type"), Some(Variant::from("float")));
    }

    #[test]
    fn test_numbered_type_skips_any() {
        let mut select = Select::new(VariantType::Float);
        assert_eq!(select.set_property("type", &Variant::Int(2)), PropertyChange::Updated);
        assert_eq!(select.pin_type(), VariantType::Float);
        assert_eq!(select.set_property("type", &Variant::Int(0)), PropertyChange::PinsChanged);
        assert_eq!(select.pin_type(), VariantType::Bool);
        assert_eq!(select.set_property("type", &Variant::Int(-1)), PropertyChange::Ignored);
        assert_eq!(select.pin_type(), VariantType::Bool);
    }
}
