// SPDX-License-Identifier: MIT OR Apache-2.0
//! Constant value source.

use super::{NodeKind, PropertyChange};
use crate::graph::Graph;
use crate::instance::{ExecutionContext, ExecutionOwner, NodeInstance};
use crate::node::{InitContext, Node, PinSet};
use crate::pin::{Pin, PinDirection};
use crate::variant::{Variant, VariantType};
use indexmap::IndexMap;
use std::any::Any;

/// Pure node producing a fixed value on its `value` output
#[derive(Debug, Clone, Default)]
pub struct Constant {
    value: Variant,
}

impl Constant {
    /// Create a constant holding `value`
    pub fn new(value: Variant) -> Self {
        Self { value }
    }

    /// The configured value
    pub fn value(&self) -> &Variant {
        &self.value
    }
}

struct ConstantInstance {
    value: Variant,
}

impl NodeInstance for ConstantInstance {
    fn step(&self, context: &mut ExecutionContext) -> usize {
        context.set_output(0, self.value.clone());
        0
    }
}

impl NodeKind for Constant {
    fn type_name(&self) -> &'static str {
        "Constant"
    }

    fn title(&self) -> String {
        format!("{} Constant", self.value.variant_type())
    }

    fn icon(&self) -> String {
        self.value.variant_type().name().to_string()
    }

    fn initialize(&mut self, context: &InitContext) {
        if let Some(value) = context.user_value("value") {
            self.value = value.clone();
        }
    }

    fn allocate_default_pins(&self, pins: &mut PinSet) {
        let pin = pins.create_data_pin(PinDirection::Output, "value", self.value.variant_type(), Variant::Nil);
        if let Some(object) = self.value.as_object() {
            pin.set_target_class(object.class_name.clone());
        }
    }

    fn can_change_pin_type(&self) -> bool {
        true
    }

    fn possible_pin_types(&self) -> Vec<VariantType> {
        VariantType::ALL.iter().copied().filter(|t| !t.is_nil()).collect()
    }

    fn change_pin_types(&mut self, pin_type: VariantType) -> bool {
        if pin_type == self.value.variant_type() {
            return false;
        }
        self.value = self
            .value
            .convert(pin_type)
            .unwrap_or_else(|| pin_type.default_value());
        true
    }

    fn properties(&self) -> IndexMap<String, Variant> {
        let mut properties = IndexMap::new();
        properties.insert("value".to_string(), self.value.clone());
        properties
    }

    fn set_property(&mut self, name: &str, value: &Variant) -> PropertyChange {
        match name {
            "value" => {
                let retyped = value.variant_type() != self.value.variant_type();
                self.value = value.clone();
                if retyped || value.as_object().is_some() {
                    PropertyChange::PinsChanged
                } else {
                    PropertyChange::Updated
                }
            }
            "type" => match VariantType::from_variant(value) {
                Some(pin_type) if self.change_pin_types(pin_type) => PropertyChange::PinsChanged,
                Some(_) => PropertyChange::Updated,
                None => PropertyChange::Ignored,
            },
            _ => PropertyChange::Ignored,
        }
    }

    fn resolve_type_class(&self, _node: &Node, pin: &Pin, _graph: &Graph) -> Option<String> {
        if !pin.is_output() {
            return None;
        }
        self.value.as_object().map(|object| object.class_name.clone())
    }

    fn instantiate(&self, _node: &Node, _owner: &ExecutionOwner) -> Box<dyn NodeInstance> {
        Box::new(ConstantInstance {
            value: self.value.clone(),
        })
    }

    fn clone_box(&self) -> Box<dyn NodeKind> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
