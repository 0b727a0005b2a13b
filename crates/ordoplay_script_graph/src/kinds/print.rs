// SPDX-License-Identifier: MIT OR Apache-2.0
//! Writes a line to the script output.

use super::{NodeKind, PropertyChange};
use crate::instance::{ExecutionContext, ExecutionOwner, NodeInstance, OutputSink};
use crate::node::{Node, PinSet};
use crate::pin::PinDirection;
use crate::variant::{Variant, VariantType};
use indexmap::IndexMap;
use std::any::Any;

/// Prints its `text` input and continues
#[derive(Debug, Clone)]
pub struct Print {
    text: String,
}

impl Print {
    /// Create a print node with the given default text
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for Print {
    fn default() -> Self {
        Self::new("Hello")
    }
}

struct PrintInstance {
    output: OutputSink,
}

impl NodeInstance for PrintInstance {
    fn step(&self, context: &mut ExecutionContext) -> usize {
        let line = context.get_input(0).to_string();
        tracing::info!(target: "script", "{line}");
        self.output.push(line);
        0
    }
}

impl NodeKind for Print {
    fn type_name(&self) -> &'static str {
        "Print"
    }

    fn title(&self) -> String {
        "Print String".to_string()
    }

    fn icon(&self) -> String {
        "Info".to_string()
    }

    fn keywords(&self) -> Vec<String> {
        vec!["log".to_string(), "debug".to_string()]
    }

    fn allocate_default_pins(&self, pins: &mut PinSet) {
        pins.create_execution_pin(PinDirection::Input, "ExecIn");
        pins.create_data_pin(PinDirection::Input, "text", VariantType::String, Variant::from(self.text.as_str()));
        pins.create_execution_pin(PinDirection::Output, "ExecOut");
    }

    fn properties(&self) -> IndexMap<String, Variant> {
        let mut properties = IndexMap::new();
        properties.insert("text".to_string(), Variant::from(self.text.as_str()));
        properties
    }

    fn set_property(&mut self, name: &str, value: &Variant) -> PropertyChange {
        match (name, value) {
            ("text", Variant::String(text)) => {
                self.text = text.clone();
                PropertyChange::PinsChanged
            }
            _ => PropertyChange::Ignored,
        }
    }

    fn instantiate(&self, _node: &Node, owner: &ExecutionOwner) -> Box<dyn NodeInstance> {
        Box::new(PrintInstance {
            output: owner.output().clone(),
        })
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

    #[test]
    fn test_step_writes_to_sink() {
        let instance = PrintInstance {
            output: OutputSink::new(),
        };
        let mut context = ExecutionContext::new(vec![Variant::Int(42)], 0);
        assert_eq!(instance.step(&mut context), 0);
        assert_eq!(instance.output.lines(), vec!["42".to_string()]);
    }
}
