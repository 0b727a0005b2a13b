// SPDX-License-Identifier: MIT OR Apache-2.0
//! Object type cast.

use super::{NodeKind, PropertyChange, ResolvedInputs};
use crate::class_db::ClassHierarchy;
use crate::graph::Graph;
use crate::instance::{ExecutionContext, ExecutionOwner, NodeInstance};
use crate::node::{InitContext, Node, PinSet};
use crate::pin::{Pin, PinDirection, PinFlags};
use crate::variant::{Variant, VariantType, OBJECT_CLASS};
use indexmap::IndexMap;
use std::any::Any;
use std::sync::Arc;

/// Checks whether an object is an instance of a class.
///
/// Continues through `yes` with the object on `output` when it is, and
/// through `no` otherwise.
#[derive(Debug, Clone, Default)]
pub struct TypeCast {
    target_type: String,
}

impl TypeCast {
    /// Create a cast to the given class
    pub fn new(target_type: impl Into<String>) -> Self {
        Self {
            target_type: target_type.into(),
        }
    }

    /// Class objects are cast to; an empty target means `Object`
    pub fn target_type(&self) -> &str {
        if self.target_type.is_empty() {
            OBJECT_CLASS
        } else {
            &self.target_type
        }
    }
}

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

struct TypeCastInstance {
    target_type: String,
    classes: Arc<dyn ClassHierarchy>,
}

impl NodeInstance for TypeCastInstance {
    fn step(&self, context: &mut ExecutionContext) -> usize {
        let instance = context.get_input(0);
        let Some(object) = instance.as_object() else {
            return 1;
        };
        if !self.classes.is_parent_class(&object.class_name, &self.target_type) {
            return 1;
        }
        let value = instance.clone();
        context.set_output(0, value);
        0
    }
}

impl NodeKind for TypeCast {
    fn type_name(&self) -> &'static str {
        "TypeCast"
    }

    fn title(&self) -> String {
        format!("Cast To {}", self.target_type())
    }

    fn icon(&self) -> String {
        "CurveLinear".to_string()
    }

    fn tooltip(&self) -> String {
        format!(
            "Tries to access the object as a '{}', it may be an instance of.",
            self.target_type()
        )
    }

    fn keywords(&self) -> Vec<String> {
        vec!["cast".to_string(), "as".to_string()]
    }

    fn initialize(&mut self, context: &InitContext) {
        if let Some(class_name) = &context.class_name {
            self.target_type = class_name.clone();
        }
    }

    fn allocate_default_pins(&self, pins: &mut PinSet) {
        pins.create_execution_pin(PinDirection::Input, "ExecIn");
        pins.create_data_pin(
            PinDirection::Input,
            "instance",
            VariantType::Object,
            VariantType::Object.default_value(),
        );

        pins.create_execution_pin(PinDirection::Output, "yes")
            .set_flags(PinFlags::EXECUTION | PinFlags::SHOW_LABEL);
        pins.create_execution_pin(PinDirection::Output, "no")
            .set_flags(PinFlags::EXECUTION | PinFlags::SHOW_LABEL);
        pins.create_data_pin(
            PinDirection::Output,
            "output",
            VariantType::Object,
            VariantType::Object.default_value(),
        )
        .set_flags(PinFlags::DATA | PinFlags::OBJECT | PinFlags::NO_CAPITALIZE)
        .set_label(format!("as {}", self.target_type()))
        .set_target_class(self.target_type());
    }

    fn properties(&self) -> IndexMap<String, Variant> {
        let mut properties = IndexMap::new();
        properties.insert("type".to_string(), Variant::from(self.target_type.as_str()));
        properties
    }

    fn set_property(&mut self, name: &str, value: &Variant) -> PropertyChange {
        match (name, value) {
            ("type", Variant::String(class_name) | Variant::StringName(class_name)) => {
                if *class_name == self.target_type {
                    return PropertyChange::Updated;
                }
                self.target_type = class_name.clone();
                PropertyChange::PinsChanged
            }
            _ => PropertyChange::Ignored,
        }
    }

    fn resolve_type_class(&self, _node: &Node, pin: &Pin, _graph: &Graph) -> Option<String> {
        if !pin.is_output() {
            return None;
        }
        // `yes` and `output` carry the cast object, `no` the unconverted one
        match pin.index() {
            0 | 2 => Some(self.target_type().to_string()),
            1 => Some(OBJECT_CLASS.to_string()),
            _ => None,
        }
    }

    fn post_node_autowired(&mut self, inputs: &ResolvedInputs) -> bool {
        let Some(instance) = inputs.get("instance") else {
            return false;
        };
        if instance.variant_type != VariantType::Object
            || instance.class_name.is_empty()
            || instance.class_name == self.target_type()
        {
            return false;
        }
        tracing::debug!(target_type = %instance.class_name, "cast adopted autowired class");
        self.target_type = instance.class_name.clone();
        true
    }

    fn validate_node_during_build(&self, _node: &Node) -> Result<(), String> {
        if is_valid_identifier(self.target_type()) {
            Ok(())
        } else {
            Err(format!("'{}' is not a valid class name", self.target_type))
        }
    }

    fn instantiate(&self, _node: &Node, owner: &ExecutionOwner) -> Box<dyn NodeInstance> {
        Box::new(TypeCastInstance {
            target_type: self.target_type().to_string(),
            classes: owner.classes(),
        })
    }

    fn clone_box(&self) -> Box<dyn NodeKind> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
