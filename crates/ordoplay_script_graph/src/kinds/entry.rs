// SPDX-License-Identifier: MIT OR Apache-2.0
//! Entry point of a script function.

use super::NodeKind;
use crate::instance::{ExecutionContext, ExecutionOwner, NodeInstance};
use crate::node::{Node, PinSet};
use crate::pin::PinDirection;
use std::any::Any;

/// Starts execution; has a single execution output
#[derive(Debug, Clone, Copy, Default)]
pub struct Entry;

struct EntryInstance;

impl NodeInstance for EntryInstance {
    fn step(&self, _context: &mut ExecutionContext) -> usize {
        0
    }
}

impl NodeKind for Entry {
    fn type_name(&self) -> &'static str {
        "Entry"
    }

    fn icon(&self) -> String {
        "Play".to_string()
    }

    fn tooltip(&self) -> String {
        "Execution starts here.".to_string()
    }

    fn allocate_default_pins(&self, pins: &mut PinSet) {
        pins.create_execution_pin(PinDirection::Output, "ExecOut");
    }

    fn instantiate(&self, _node: &Node, _owner: &ExecutionOwner) -> Box<dyn NodeInstance> {
        Box::new(EntryInstance)
    }

    fn clone_box(&self) -> Box<dyn NodeKind> {
        Box::new(*self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
