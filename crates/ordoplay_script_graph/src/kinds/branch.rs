// SPDX-License-Identifier: MIT OR Apache-2.0
//! If/else branching on a boolean condition.

use super::NodeKind;
use crate::instance::{ExecutionContext, ExecutionOwner, NodeInstance};
use crate::node::{Node, PinSet};
use crate::pin::{PinDirection, PinFlags};
use crate::variant::{Variant, VariantType};
use std::any::Any;

/// Follows `true` or `false` depending on its condition
#[derive(Debug, Clone, Copy, Default)]
pub struct Branch;

struct BranchInstance;

impl NodeInstance for BranchInstance {
    fn step(&self, context: &mut ExecutionContext) -> usize {
        if context.get_input(0).is_truthy() {
            0
        } else {
            1
        }
    }
}

impl NodeKind for Branch {
    fn type_name(&self) -> &'static str {
        "Branch"
    }

    fn icon(&self) -> String {
        "VisualShaderNodeSwitch".to_string()
    }

    fn tooltip(&self) -> String {
        "Continues along 'true' or 'false' depending on the condition.".to_string()
    }

    fn keywords(&self) -> Vec<String> {
        vec!["if".to_string(), "else".to_string()]
    }

    fn allocate_default_pins(&self, pins: &mut PinSet) {
        pins.create_execution_pin(PinDirection::Input, "ExecIn");
        pins.create_data_pin(PinDirection::Input, "condition", VariantType::Bool, Variant::Bool(false));
        pins.create_execution_pin(PinDirection::Output, "true")
            .set_flags(PinFlags::EXECUTION | PinFlags::SHOW_LABEL);
        pins.create_execution_pin(PinDirection::Output, "false")
            .set_flags(PinFlags::EXECUTION | PinFlags::SHOW_LABEL);
    }

    fn instantiate(&self, _node: &Node, _owner: &ExecutionOwner) -> Box<dyn NodeInstance> {
        Box::new(BranchInstance)
    }

    fn clone_box(&self) -> Box<dyn NodeKind> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
