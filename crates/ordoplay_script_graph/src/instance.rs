// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compiled runtime instances of nodes.
//!
//! An instance freezes whatever configuration its node had at compile time
//! together with the node's pin layout. It never looks at the graph again; if
//! the node is reconstructed the instance is stale and must be recompiled.

use crate::class_db::ClassHierarchy;
use crate::graph::{Graph, GraphError};
use crate::node::{Node, NodeId, NodeLifecycle};
use crate::pin::{PinDirection, PinId};
use crate::variant::Variant;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

static NIL: Variant = Variant::Nil;

/// Runtime behavior of a compiled node
pub trait NodeInstance: Send + Sync {
    /// Execute one step.
    ///
    /// Reads inputs and writes outputs positionally (data pins in index
    /// order) and returns the index of the execution output to follow.
    fn step(&self, context: &mut ExecutionContext) -> usize;
}

/// Input values and output slots for a single step
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    inputs: Vec<Variant>,
    outputs: Vec<Option<Variant>>,
}

impl ExecutionContext {
    /// Create a context with the given inputs and empty output slots
    pub fn new(inputs: Vec<Variant>, output_count: usize) -> Self {
        Self {
            inputs,
            outputs: vec![None; output_count],
        }
    }

    /// Get an input value; missing inputs read as nil
    pub fn get_input(&self, index: usize) -> &Variant {
        self.inputs.get(index).unwrap_or(&NIL)
    }

    /// Number of inputs
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Write an output value
    pub fn set_output(&mut self, index: usize, value: Variant) {
        if index >= self.outputs.len() {
            self.outputs.resize(index + 1, None);
        }
        self.outputs[index] = Some(value);
    }

    /// Get an output value, `None` if the step did not write it
    pub fn output(&self, index: usize) -> Option<&Variant> {
        self.outputs.get(index).and_then(Option::as_ref)
    }

    /// All output slots
    pub fn outputs(&self) -> &[Option<Variant>] {
        &self.outputs
    }

    /// Consume the context, returning its output slots
    pub fn into_outputs(self) -> Vec<Option<Variant>> {
        self.outputs
    }
}

/// Lines written by running scripts
#[derive(Debug, Clone, Default)]
pub struct OutputSink(Arc<Mutex<Vec<String>>>);

impl OutputSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line
    pub fn push(&self, line: impl Into<String>) {
        self.0.lock().push(line.into());
    }

    /// Copy of all lines written so far
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Take all lines written so far
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }
}

/// The script session instances are compiled for
#[derive(Clone)]
pub struct ExecutionOwner {
    classes: Arc<dyn ClassHierarchy>,
    output: OutputSink,
}

impl ExecutionOwner {
    /// Create an owner with the given class hierarchy
    pub fn new(classes: Arc<dyn ClassHierarchy>) -> Self {
        Self {
            classes,
            output: OutputSink::new(),
        }
    }

    /// Use an existing output sink
    pub fn with_output(mut self, output: OutputSink) -> Self {
        self.output = output;
        self
    }

    /// Class hierarchy used for object type checks
    pub fn classes(&self) -> Arc<dyn ClassHierarchy> {
        Arc::clone(&self.classes)
    }

    /// Output sink for script messages
    pub fn output(&self) -> &OutputSink {
        &self.output
    }
}

impl fmt::Debug for ExecutionOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionOwner")
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

/// Pin layout of a node at compile time, each list in pin-index order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinLayout {
    /// Data inputs
    pub data_inputs: Vec<PinId>,
    /// Data outputs
    pub data_outputs: Vec<PinId>,
    /// Execution inputs
    pub execution_inputs: Vec<PinId>,
    /// Execution outputs
    pub execution_outputs: Vec<PinId>,
}

impl PinLayout {
    /// Capture the layout of a node
    pub fn of(node: &Node) -> Self {
        let mut layout = Self::default();
        for direction in [PinDirection::Input, PinDirection::Output] {
            let mut pins: Vec<_> = node.find_pins(Some(direction)).collect();
            pins.sort_by_key(|p| p.index());
            for pin in pins {
                let list = match (direction, pin.is_execution()) {
                    (PinDirection::Input, false) => &mut layout.data_inputs,
                    (PinDirection::Output, false) => &mut layout.data_outputs,
                    (PinDirection::Input, true) => &mut layout.execution_inputs,
                    (PinDirection::Output, true) => &mut layout.execution_outputs,
                };
                list.push(pin.id());
            }
        }
        layout
    }

    /// Whether the node has no execution pins and is evaluated on demand
    pub fn is_pure(&self) -> bool {
        self.execution_inputs.is_empty() && self.execution_outputs.is_empty()
    }

    /// Position of a data output among the data outputs
    pub fn data_output_slot(&self, pin: PinId) -> Option<usize> {
        self.data_outputs.iter().position(|p| *p == pin)
    }
}

/// A node compiled into its runtime instance
pub struct CompiledNode {
    node: NodeId,
    revision: u64,
    layout: PinLayout,
    instance: Box<dyn NodeInstance>,
}

impl CompiledNode {
    /// Node the instance was compiled from
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Revision of the node at compile time
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Pin layout at compile time
    pub fn layout(&self) -> &PinLayout {
        &self.layout
    }

    /// Execute one step of the instance
    pub fn step(&self, context: &mut ExecutionContext) -> usize {
        self.instance.step(context)
    }

    /// Whether the node changed since compilation (or no longer exists)
    pub fn is_stale(&self, graph: &Graph) -> bool {
        graph
            .node(self.node)
            .map_or(true, |node| node.revision() != self.revision)
    }
}

impl fmt::Debug for CompiledNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledNode")
            .field("node", &self.node)
            .field("revision", &self.revision)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl Graph {
    /// Compile a node into a fresh runtime instance
    pub fn instantiate(&self, node_id: NodeId, owner: &ExecutionOwner) -> Result<CompiledNode, GraphError> {
        let node = self.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        if node.state() != NodeLifecycle::Live {
            return Err(GraphError::InvalidState {
                node: node_id,
                state: node.state(),
            });
        }

        let instance = node.kind().instantiate(node, owner);
        tracing::trace!(node = %node_id, kind = node.kind().type_name(), "compiled node instance");
        Ok(CompiledNode {
            node: node_id,
            revision: node.revision(),
            layout: PinLayout::of(node),
            instance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_defaults() {
        let mut context = ExecutionContext::new(vec![Variant::Int(1)], 1);
        assert_eq!(context.get_input(0), &Variant::Int(1));
        assert_eq!(context.get_input(5), &Variant::Nil);
        assert!(context.output(0).is_none());

        context.set_output(2, Variant::Bool(true));
        assert_eq!(context.outputs().len(), 3);
        assert_eq!(context.output(2), Some(&Variant::Bool(true)));
        assert!(context.output(1).is_none());
    }

    #[test]
    fn test_output_sink_is_shared() {
        let sink = OutputSink::new();
        let clone = sink.clone();
        clone.push("hello");
        assert_eq!(sink.lines(), vec!["hello".to_string()]);
        assert_eq!(sink.drain().len(), 1);
        assert!(clone.lines().is_empty());
    }
}
