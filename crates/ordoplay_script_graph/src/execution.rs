// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph execution.
//!
//! [`ScriptBuild`] compiles every node of a graph into its instance.
//! [`StepEngine`] then walks the execution connections from an entry node,
//! stepping one instance at a time. Data inputs are taken from the node
//! feeding them: pure nodes (no execution pins) are evaluated on demand, any
//! other node provides whatever it produced when it last stepped.
//!
//! An execution output linked to several inputs continues along its first
//! link only. Link order is kept by saved records.

use crate::graph::{Graph, GraphError};
use crate::instance::{CompiledNode, ExecutionContext, ExecutionOwner, PinLayout};
use crate::node::NodeId;
use crate::pin::PinRef;
use crate::settings::{ExecutionSettings, MAX_DATA_DEPTH};
use crate::variant::Variant;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Compiled instances for one execution session
#[derive(Debug)]
pub struct ScriptBuild {
    owner: ExecutionOwner,
    nodes: IndexMap<NodeId, CompiledNode>,
}

impl ScriptBuild {
    /// Validate and compile every node of the graph
    pub fn build(graph: &Graph, owner: ExecutionOwner) -> Result<Self, GraphError> {
        let mut build = Self {
            owner,
            nodes: IndexMap::new(),
        };
        for node_id in graph.node_ids() {
            build.compile(graph, node_id)?;
        }
        tracing::debug!(graph = %graph.name, nodes = build.nodes.len(), "built script");
        Ok(build)
    }

    /// Recompile stale and new nodes, dropping nodes no longer in the graph.
    ///
    /// Returns the number of nodes compiled.
    pub fn refresh(&mut self, graph: &Graph) -> Result<usize, GraphError> {
        self.nodes.retain(|id, _| graph.node(*id).is_some());

        let mut compiled = 0;
        for node_id in graph.node_ids() {
            let fresh = self.nodes.get(&node_id).is_some_and(|c| !c.is_stale(graph));
            if !fresh {
                self.compile(graph, node_id)?;
                compiled += 1;
            }
        }
        Ok(compiled)
    }

    /// Discard a node's instance, returning whether it had one
    pub fn invalidate(&mut self, node_id: NodeId) -> bool {
        self.nodes.shift_remove(&node_id).is_some()
    }

    /// Compiled instance of a node
    pub fn get(&self, node_id: NodeId) -> Option<&CompiledNode> {
        self.nodes.get(&node_id)
    }

    /// Session the instances were compiled for
    pub fn owner(&self) -> &ExecutionOwner {
        &self.owner
    }

    /// Number of compiled nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing is compiled
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn compile(&mut self, graph: &Graph, node_id: NodeId) -> Result<(), GraphError> {
        let node = graph.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        node.kind()
            .validate_node_during_build(node)
            .map_err(|message| GraphError::Validation { node: node_id, message })?;
        let compiled = graph.instantiate(node_id, &self.owner)?;
        self.nodes.insert(node_id, compiled);
        Ok(())
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of execution steps taken
    pub steps: usize,
    /// Nodes stepped along the execution path, in order
    pub path: Vec<NodeId>,
}

/// Walks execution flow through a compiled graph
#[derive(Debug)]
pub struct StepEngine<'a> {
    graph: &'a Graph,
    build: &'a mut ScriptBuild,
    settings: ExecutionSettings,
    values: HashMap<NodeId, Vec<Option<Variant>>>,
}

impl<'a> StepEngine<'a> {
    /// Create an engine over a graph and its build
    pub fn new(graph: &'a Graph, build: &'a mut ScriptBuild, mut settings: ExecutionSettings) -> Self {
        if settings.max_data_depth > MAX_DATA_DEPTH {
            tracing::warn!(requested = settings.max_data_depth, limit = MAX_DATA_DEPTH, "clamping data depth");
            settings.max_data_depth = MAX_DATA_DEPTH;
        }
        Self {
            graph,
            build,
            settings,
            values: HashMap::new(),
        }
    }

    /// Run from `entry` until execution flow ends
    pub fn run(&mut self, entry: NodeId) -> Result<RunSummary, ExecutionError> {
        let mut summary = RunSummary::default();
        let mut current = Some(entry);

        while let Some(node_id) = current {
            if summary.steps >= self.settings.max_steps {
                tracing::warn!(graph = %self.graph.name, steps = summary.steps, "step limit reached");
                return Err(ExecutionError::StepLimitExceeded(self.settings.max_steps));
            }
            let control = self.step_node(node_id)?;
            summary.steps += 1;
            summary.path.push(node_id);
            current = self.next_node(node_id, control)?;
        }

        tracing::debug!(graph = %self.graph.name, steps = summary.steps, "run finished");
        Ok(summary)
    }

    /// Step a single node, returning the control index it selected
    pub fn step_node(&mut self, node_id: NodeId) -> Result<usize, ExecutionError> {
        self.evaluate(node_id, 0)
    }

    /// Last value produced on an output pin
    pub fn output_value(&self, pin: PinRef) -> Option<&Variant> {
        let slot = self.build.get(pin.node)?.layout().data_output_slot(pin.pin)?;
        self.values.get(&pin.node)?.get(slot)?.as_ref()
    }

    /// Step a node after gathering its inputs, storing its outputs
    fn evaluate(&mut self, node_id: NodeId, depth: usize) -> Result<usize, ExecutionError> {
        if depth > self.settings.max_data_depth {
            return Err(ExecutionError::DataDepthExceeded(node_id));
        }
        let layout = self.ensure_current(node_id)?;
        let inputs = self.gather_inputs(node_id, &layout, depth)?;

        let compiled = self.build.get(node_id).ok_or(ExecutionError::NotCompiled(node_id))?;
        let mut context = ExecutionContext::new(inputs, layout.data_outputs.len());
        let control = compiled.step(&mut context);
        tracing::trace!(node = %node_id, control, "stepped node");

        self.values.insert(node_id, context.into_outputs());
        Ok(control)
    }

    /// Check the node's instance against the graph, returning its layout
    fn ensure_current(&mut self, node_id: NodeId) -> Result<PinLayout, ExecutionError> {
        if self.graph.node(node_id).is_none() {
            return Err(ExecutionError::NodeNotFound(node_id));
        }
        let compiled = self.build.get(node_id).ok_or(ExecutionError::NotCompiled(node_id))?;
        if compiled.is_stale(self.graph) {
            if self.settings.strict_revision_check {
                tracing::warn!(node = %node_id, revision = compiled.revision(), "refusing stale instance");
                return Err(ExecutionError::StaleInstance(node_id));
            }
            tracing::debug!(node = %node_id, "recompiling stale instance");
            self.build.compile(self.graph, node_id)?;
        }
        self.build
            .get(node_id)
            .map(|c| c.layout().clone())
            .ok_or(ExecutionError::NotCompiled(node_id))
    }

    fn gather_inputs(&mut self, node_id: NodeId, layout: &PinLayout, depth: usize) -> Result<Vec<Variant>, ExecutionError> {
        let graph = self.graph;
        let node = graph.node(node_id).ok_or(ExecutionError::NodeNotFound(node_id))?;

        let mut inputs = Vec::with_capacity(layout.data_inputs.len());
        for pin_id in &layout.data_inputs {
            let Some(pin) = node.pin(*pin_id) else {
                inputs.push(Variant::Nil);
                continue;
            };
            let value = match pin.connections().first() {
                Some(source) => self.source_value(*source, depth)?,
                None => None,
            };
            inputs.push(value.unwrap_or_else(|| pin.default_value().clone()));
        }
        Ok(inputs)
    }

    /// Value on an output pin, evaluating its node first if it is pure
    fn source_value(&mut self, source: PinRef, depth: usize) -> Result<Option<Variant>, ExecutionError> {
        let pure = self
            .build
            .get(source.node)
            .ok_or(ExecutionError::NotCompiled(source.node))?
            .layout()
            .is_pure();
        if pure {
            self.evaluate(source.node, depth + 1)?;
        }
        Ok(self.output_value(source).cloned())
    }

    /// Node on the first link of the selected execution output
    fn next_node(&self, node_id: NodeId, control: usize) -> Result<Option<NodeId>, ExecutionError> {
        let layout = self
            .build
            .get(node_id)
            .ok_or(ExecutionError::NotCompiled(node_id))?
            .layout();
        if layout.execution_outputs.is_empty() {
            return Ok(None);
        }
        let pin = layout
            .execution_outputs
            .get(control)
            .ok_or(ExecutionError::InvalidControlIndex { node: node_id, index: control })?;
        Ok(self
            .graph
            .pin(PinRef::new(node_id, *pin))
            .and_then(|p| p.connections().first())
            .map(|next| next.node))
    }
}

/// Error while running a graph
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The node has no compiled instance
    #[error("Node {0} is not compiled")]
    NotCompiled(NodeId),

    /// The node changed after its instance was compiled
    #[error("Instance of node {0} is stale and must be recompiled")]
    StaleInstance(NodeId),

    /// A step selected an execution output the node does not have
    #[error("Node {node} selected missing execution output {index}")]
    InvalidControlIndex {
        /// Node
        node: NodeId,
        /// Selected index
        index: usize,
    },

    /// The run did not finish within the step limit
    #[error("Step limit of {0} exceeded")]
    StepLimitExceeded(usize),

    /// Pure data evaluation nested too deeply, usually a data cycle
    #[error("Data evaluation too deep at node {0}")]
    DataDepthExceeded(NodeId),

    /// Recompiling a node failed
    #[error(transparent)]
    Graph(#[from] GraphError),
}
