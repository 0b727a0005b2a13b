// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure owning nodes and maintaining the connection index.
//!
//! Nodes live in an arena keyed by [`NodeId`]. Connections are stored on both
//! endpoint pins as [`PinRef`]s; every operation here keeps the two sides
//! symmetric.

use crate::kinds::{NodeKind, PropertyChange};
use crate::node::{InitContext, Node, NodeId, NodeLifecycle};
use crate::pin::{Pin, PinDirection, PinFlags, PinRef};
use crate::variant::{Variant, VariantType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Unique identifier for a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphId(pub Uuid);

impl GraphId {
    /// Create a new random graph ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A script node graph
#[derive(Debug, Clone)]
pub struct Graph {
    id: GraphId,
    /// Graph name
    pub name: String,
    nodes: IndexMap<NodeId, Node>,
    next_node_id: u32,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GraphId::new(),
            name: name.into(),
            nodes: IndexMap::new(),
            next_node_id: 0,
        }
    }

    /// Graph identity
    pub fn id(&self) -> GraphId {
        self.id
    }

    /// Add a node to the graph, allocating its pins if that has not happened yet
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.insert_node(id, node);
        id
    }

    /// Add a node under a specific id, as when rebuilding a saved graph
    pub fn add_node_with_id(&mut self, id: NodeId, node: Node) -> Result<NodeId> {
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.insert_node(id, node);
        Ok(id)
    }

    fn insert_node(&mut self, id: NodeId, mut node: Node) {
        if matches!(node.state(), NodeLifecycle::Uncreated | NodeLifecycle::Initialized) {
            node.allocate_default_pins();
        }
        node.attach(id, self.id);
        self.nodes.insert(id, node);
        if id.0 >= self.next_node_id {
            self.next_node_id = id.0 + 1;
        }
        tracing::debug!(graph = %self.name, node = %id, "added node");
    }

    /// Create, initialize and add a node of the given kind
    pub fn spawn(&mut self, kind: impl NodeKind, context: &InitContext) -> NodeId {
        let mut node = Node::new(kind);
        node.initialize(context);
        node.allocate_default_pins();
        self.add_node(node)
    }

    /// Remove a node, severing all of its connections first
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let pins: Vec<PinRef> = self
            .nodes
            .get(&node_id)?
            .all_pins()
            .iter()
            .map(|p| PinRef::new(node_id, p.id()))
            .collect();

        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.kind_mut().pre_remove();
        }
        for pin in pins {
            self.unlink_all(pin);
        }

        let mut node = self.nodes.shift_remove(&node_id)?;
        node.set_state(NodeLifecycle::Removed);
        tracing::debug!(graph = %self.name, node = %node_id, "removed node");
        Some(node)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get a pin anywhere in the graph
    pub fn pin(&self, pin: PinRef) -> Option<&Pin> {
        self.nodes.get(&pin.node)?.pin(pin.pin)
    }

    /// Reference a pin by node, name and direction
    pub fn pin_ref(&self, node_id: NodeId, name: &str, direction: PinDirection) -> Option<PinRef> {
        self.nodes.get(&node_id)?.pin_ref(name, direction)
    }

    /// Link two pins; the order of the arguments does not matter
    pub fn link(&mut self, a: PinRef, b: PinRef) -> std::result::Result<(), ConnectionError> {
        let (output, input) = self.validate_link(a, b)?;

        if let Some(pin) = self.pin_mut(output) {
            pin.add_connection(input);
        }
        if let Some(pin) = self.pin_mut(input) {
            pin.add_connection(output);
        }
        tracing::debug!(graph = %self.name, from = %output, to = %input, "linked pins");
        Ok(())
    }

    /// Check whether two pins may be linked, returning them as (output, input)
    pub fn validate_link(&self, a: PinRef, b: PinRef) -> std::result::Result<(PinRef, PinRef), ConnectionError> {
        let (output, input) = self.check_endpoints(a, b)?;
        let input_pin = self.owned_pin(input)?;

        if input_pin.is_connected_to(output) {
            return Err(ConnectionError::AlreadyConnected);
        }
        if input_pin.is_single_link() && input_pin.has_any_connections() {
            return Err(ConnectionError::InputOccupied(input));
        }
        Ok((output, input))
    }

    /// Structural checks on a pair of pins, ignoring existing links
    pub(crate) fn check_endpoints(&self, a: PinRef, b: PinRef) -> std::result::Result<(PinRef, PinRef), ConnectionError> {
        if a.node == b.node {
            return Err(ConnectionError::SelfLoop(a.node));
        }
        let pin_a = self.owned_pin(a)?;
        let pin_b = self.owned_pin(b)?;
        pin_a.can_link(pin_b)?;
        Ok(if pin_a.is_output() { (a, b) } else { (b, a) })
    }

    pub(crate) fn owned_pin(&self, pin: PinRef) -> std::result::Result<&Pin, ConnectionError> {
        let node = self
            .nodes
            .get(&pin.node)
            .filter(|n| n.graph_id() == Some(self.id))
            .ok_or(ConnectionError::NotInGraph(pin))?;
        node.pin(pin.pin).ok_or(ConnectionError::NotInGraph(pin))
    }

    /// Remove the link between two pins, returning whether one existed
    pub fn unlink(&mut self, a: PinRef, b: PinRef) -> bool {
        let removed_a = self.pin_mut(a).is_some_and(|p| p.remove_connection(b));
        let removed_b = self.pin_mut(b).is_some_and(|p| p.remove_connection(a));
        if removed_a || removed_b {
            tracing::debug!(graph = %self.name, a = %a, b = %b, "unlinked pins");
        }
        removed_a || removed_b
    }

    /// Remove every link of a pin, returning how many were removed
    pub fn unlink_all(&mut self, pin: PinRef) -> usize {
        let connections = match self.pin_mut(pin) {
            Some(p) => p.take_connections(),
            None => return 0,
        };
        for other in &connections {
            if let Some(p) = self.pin_mut(*other) {
                p.remove_connection(pin);
            }
        }
        connections.len()
    }

    /// Remove a pin from its node, severing its links on both sides first
    pub fn remove_pin(&mut self, pin: PinRef) -> Result<Pin> {
        let node = self.nodes.get(&pin.node).ok_or(GraphError::NodeNotFound(pin.node))?;
        if node.is_reconstructing() {
            return Err(GraphError::ReconstructionInProgress(pin.node));
        }
        if node.pin(pin.pin).is_none() {
            return Err(GraphError::PinNotFound(pin));
        }

        let severed = self.unlink_all(pin);
        let node = self.nodes.get_mut(&pin.node).ok_or(GraphError::NodeNotFound(pin.node))?;
        let removed = node.pins_mut().remove(pin.pin).ok_or(GraphError::PinNotFound(pin))?;
        node.bump_revision();
        tracing::debug!(graph = %self.name, pin = %pin, severed, "removed pin");
        Ok(removed)
    }

    /// Set the value an unconnected data pin provides
    pub fn set_pin_default_value(&mut self, pin: PinRef, value: Variant) -> Result<()> {
        let target = self.editable_pin(pin)?;
        if target.is_execution() {
            return Err(GraphError::ExecutionPin(pin));
        }
        self.edit_pin(pin, |p| {
            p.set_default_value(value);
        })
    }

    /// Set the display label of a pin
    pub fn set_pin_label(&mut self, pin: PinRef, label: impl Into<String>) -> Result<()> {
        self.editable_pin(pin)?;
        let label = label.into();
        self.edit_pin(pin, |p| {
            p.set_label(label);
        })
    }

    /// Change the value kind of an unconnected data pin
    pub fn set_pin_type(&mut self, pin: PinRef, pin_type: VariantType) -> Result<()> {
        let target = self.editable_pin(pin)?;
        if target.is_execution() {
            return Err(GraphError::ExecutionPin(pin));
        }
        if target.has_any_connections() {
            return Err(GraphError::PinConnected(pin));
        }
        self.edit_pin(pin, |p| {
            p.set_type(pin_type);
        })
    }

    /// Replace the flags of an unconnected pin
    pub fn set_pin_flags(&mut self, pin: PinRef, flags: PinFlags) -> Result<()> {
        if self.editable_pin(pin)?.has_any_connections() {
            return Err(GraphError::PinConnected(pin));
        }
        self.edit_pin(pin, |p| {
            p.set_flags(flags);
        })
    }

    fn editable_pin(&self, pin: PinRef) -> Result<&Pin> {
        let node = self.nodes.get(&pin.node).ok_or(GraphError::NodeNotFound(pin.node))?;
        if node.is_reconstructing() {
            return Err(GraphError::ReconstructionInProgress(pin.node));
        }
        node.pin(pin.pin).ok_or(GraphError::PinNotFound(pin))
    }

    fn edit_pin(&mut self, pin: PinRef, edit: impl FnOnce(&mut Pin)) -> Result<()> {
        let node = self.nodes.get_mut(&pin.node).ok_or(GraphError::NodeNotFound(pin.node))?;
        edit(node.pin_mut(pin.pin).ok_or(GraphError::PinNotFound(pin))?);
        node.bump_revision();
        tracing::debug!(graph = %self.name, pin = %pin, "edited pin");
        Ok(())
    }

    /// All links as (output, input) pairs
    pub fn connections(&self) -> impl Iterator<Item = (PinRef, PinRef)> + '_ {
        self.nodes.iter().flat_map(|(node_id, node)| {
            node.find_pins(Some(PinDirection::Output)).flat_map(move |pin| {
                let output = PinRef::new(*node_id, pin.id());
                pin.connections().iter().map(move |input| (output, *input))
            })
        })
    }

    /// Get the number of links
    pub fn connection_count(&self) -> usize {
        self.connections().count()
    }

    /// Set a node property, reconstructing the node if its pins are affected.
    ///
    /// Any accepted change bumps the node's revision.
    pub fn set_node_property(&mut self, node_id: NodeId, name: &str, value: &Variant) -> Result<PropertyChange> {
        let node = self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        let change = node.kind_mut().set_property(name, value);
        match change {
            PropertyChange::PinsChanged => {
                self.reconstruct_node(node_id)?;
            }
            // Compiled instances captured the old configuration
            PropertyChange::Updated => node.bump_revision(),
            PropertyChange::Ignored => {}
        }
        Ok(change)
    }

    /// Change the generic pin type of a node that supports it
    pub fn change_pin_types(&mut self, node_id: NodeId, pin_type: VariantType) -> Result<bool> {
        let node = self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        if !node.kind().can_change_pin_type() {
            return Ok(false);
        }
        if !node.kind_mut().change_pin_types(pin_type) {
            return Ok(false);
        }
        self.reconstruct_node(node_id)?;
        Ok(true)
    }

    /// Link `source` into `target` and let the target adapt to what it received.
    ///
    /// The first free execution output of `source` is linked to the first
    /// unconnected execution input of `target`, and the first compatible data
    /// output to the first unconnected data input. The target kind then sees
    /// the resolved types of its connected inputs and may reconfigure itself.
    pub fn autowire(&mut self, source: NodeId, target: NodeId) -> Result<usize> {
        let source_node = self.nodes.get(&source).ok_or(GraphError::NodeNotFound(source))?;
        let target_node = self.nodes.get(&target).ok_or(GraphError::NodeNotFound(target))?;

        let mut links = Vec::new();
        let exec_out = source_node
            .find_pins(Some(PinDirection::Output))
            .find(|p| p.is_execution() && !p.has_any_connections());
        let exec_in = target_node
            .find_pins(Some(PinDirection::Input))
            .find(|p| p.is_execution() && !p.has_any_connections());
        if let (Some(out), Some(inp)) = (exec_out, exec_in) {
            links.push((PinRef::new(source, out.id()), PinRef::new(target, inp.id())));
        }

        let data_in = target_node
            .find_pins(Some(PinDirection::Input))
            .find(|p| p.is_data() && !p.has_any_connections());
        if let Some(inp) = data_in {
            let data_out = source_node
                .find_pins(Some(PinDirection::Output))
                .find(|p| p.is_data() && p.pin_type().can_convert_to(inp.pin_type()));
            if let Some(out) = data_out {
                links.push((PinRef::new(source, out.id()), PinRef::new(target, inp.id())));
            }
        }

        let mut made = 0;
        for (from, to) in links {
            match self.link(from, to) {
                Ok(()) => made += 1,
                Err(err) => tracing::debug!(from = %from, to = %to, %err, "autowire skipped link"),
            }
        }

        let inputs = self.resolve_connected_inputs(target);
        let node = self.nodes.get_mut(&target).ok_or(GraphError::NodeNotFound(target))?;
        if node.kind_mut().post_node_autowired(&inputs) {
            self.reconstruct_node(target)?;
        }
        Ok(made)
    }

    pub(crate) fn pin_mut(&mut self, pin: PinRef) -> Option<&mut Pin> {
        self.nodes.get_mut(&pin.node)?.pin_mut(pin.pin)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Reasons a link is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Both pins have the same direction
    #[error("Cannot link two pins of the same direction")]
    SameDirection,

    /// One side is an execution pin, the other a data pin
    #[error("Cannot link an execution pin to a data pin")]
    KindMismatch,

    /// The pin does not belong to a node of this graph
    #[error("Pin not in graph: {0}")]
    NotInGraph(PinRef),

    /// The data input already has a link
    #[error("Input already connected: {0}")]
    InputOccupied(PinRef),

    /// The pins are already linked to each other
    #[error("Pins are already connected")]
    AlreadyConnected,

    /// Both pins belong to the same node
    #[error("Cannot link node {0} to itself")]
    SelfLoop(NodeId),
}

/// Error from a graph edit
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Pin not found
    #[error("Pin not found: {0}")]
    PinNotFound(PinRef),

    /// A node with this id already exists
    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// The node is in the middle of a reconstruction
    #[error("Node {0} is already being reconstructed")]
    ReconstructionInProgress(NodeId),

    /// The operation is not valid in the node's current state
    #[error("Node {node} is {state:?}")]
    InvalidState {
        /// Node
        node: NodeId,
        /// Its current state
        state: NodeLifecycle,
    },

    /// The edit needs the pin to be unconnected
    #[error("Pin {0} has connections")]
    PinConnected(PinRef),

    /// The edit only applies to data pins
    #[error("Pin {0} is an execution pin")]
    ExecutionPin(PinRef),

    /// Invalid link
    #[error(transparent)]
    InvalidConnection(#[from] ConnectionError),

    /// A node failed build validation
    #[error("Node {node} failed validation: {message}")]
    Validation {
        /// Node
        node: NodeId,
        /// What is wrong
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{Branch, Constant, Entry, Print, Select};

    fn pin(graph: &Graph, node: NodeId, name: &str, direction: PinDirection) -> PinRef {
        graph.pin_ref(node, name, direction).unwrap()
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut graph = Graph::new("Test");
        let a = graph.spawn(Entry, &InitContext::new());
        let b = graph.spawn(Print::default(), &InitContext::new());
        assert_eq!(a, NodeId(0));
        assert_eq!(b, NodeId(1));
        assert_eq!(graph.node(a).unwrap().id(), Some(a));
        assert_eq!(graph.node(a).unwrap().state(), NodeLifecycle::Live);

        assert!(matches!(
            graph.add_node_with_id(a, Node::new(Entry)),
            Err(GraphError::DuplicateNode(_))
        ));
        let c = graph.add_node_with_id(NodeId(10), Node::new(Entry)).unwrap();
        assert_eq!(c, NodeId(10));
        assert_eq!(graph.add_node(Node::new(Entry)), NodeId(11));
    }

    #[test]
    fn test_link_is_symmetric() {
        let mut graph = Graph::new("Test");
        let value = graph.spawn(Constant::new(Variant::Int(4)), &InitContext::new());
        let select = graph.spawn(Select::new(VariantType::Int), &InitContext::new());

        let out = pin(&graph, value, "value", PinDirection::Output);
        let a = pin(&graph, select, "a", PinDirection::Input);
        graph.link(a, out).unwrap();

        assert!(graph.pin(out).unwrap().is_connected_to(a));
        assert!(graph.pin(a).unwrap().is_connected_to(out));
        assert_eq!(graph.connections().collect::<Vec<_>>(), vec![(out, a)]);

        assert!(graph.unlink(out, a));
        assert!(!graph.pin(out).unwrap().has_any_connections());
        assert!(!graph.pin(a).unwrap().has_any_connections());
        assert!(!graph.unlink(out, a));
    }

    #[test]
    fn test_same_direction_rejected() {
        let mut graph = Graph::new("Test");
        let left = graph.spawn(Select::new(VariantType::Int), &InitContext::new());
        let right = graph.spawn(Select::new(VariantType::Int), &InitContext::new());

        let a = pin(&graph, left, "a", PinDirection::Input);
        let b = pin(&graph, right, "b", PinDirection::Input);
        assert_eq!(graph.link(a, b), Err(ConnectionError::SameDirection));
        assert!(!graph.pin(a).unwrap().has_any_connections());
        assert!(!graph.pin(b).unwrap().has_any_connections());
    }

    #[test]
    fn test_data_input_single_link() {
        let mut graph = Graph::new("Test");
        let one = graph.spawn(Constant::new(Variant::Int(1)), &InitContext::new());
        let two = graph.spawn(Constant::new(Variant::Int(2)), &InitContext::new());
        let select = graph.spawn(Select::new(VariantType::Int), &InitContext::new());

        let a = pin(&graph, select, "a", PinDirection::Input);
        let first = pin(&graph, one, "value", PinDirection::Output);
        let second = pin(&graph, two, "value", PinDirection::Output);

        graph.link(first, a).unwrap();
        assert_eq!(graph.link(second, a), Err(ConnectionError::InputOccupied(a)));
        assert_eq!(graph.link(first, a), Err(ConnectionError::AlreadyConnected));
        assert_eq!(graph.pin(a).unwrap().connections(), &[first]);
        assert!(!graph.pin(second).unwrap().has_any_connections());

        graph.unlink(first, a);
        graph.link(second, a).unwrap();
        assert_eq!(graph.pin(a).unwrap().connections(), &[second]);
    }

    #[test]
    fn test_execution_input_accepts_many() {
        let mut graph = Graph::new("Test");
        let branch = graph.spawn(Branch, &InitContext::new());
        let print = graph.spawn(Print::default(), &InitContext::new());

        let exec_in = pin(&graph, print, "ExecIn", PinDirection::Input);
        let on_true = pin(&graph, branch, "true", PinDirection::Output);
        let on_false = pin(&graph, branch, "false", PinDirection::Output);
        graph.link(on_true, exec_in).unwrap();
        graph.link(on_false, exec_in).unwrap();
        assert_eq!(graph.pin(exec_in).unwrap().connections().len(), 2);

        let text = pin(&graph, print, "text", PinDirection::Input);
        assert_eq!(graph.link(on_true, text), Err(ConnectionError::KindMismatch));
    }

    #[test]
    fn test_self_loop_rejected() {
        let mut graph = Graph::new("Test");
        let select = graph.spawn(Select::new(VariantType::Int), &InitContext::new());
        let result = pin(&graph, select, "result", PinDirection::Output);
        let a = pin(&graph, select, "a", PinDirection::Input);
        assert_eq!(graph.link(result, a), Err(ConnectionError::SelfLoop(select)));
        assert!(!graph.pin(result).unwrap().has_any_connections());
        assert!(!graph.pin(a).unwrap().has_any_connections());
    }

    #[test]
    fn test_pin_edits_bump_revision() {
        let mut graph = Graph::new("Test");
        let select = graph.spawn(Select::new(VariantType::Int), &InitContext::new());
        let pick_a = pin(&graph, select, "pick_a", PinDirection::Input);
        let revision = graph.node(select).unwrap().revision();

        graph.set_pin_default_value(pick_a, Variant::Bool(true)).unwrap();
        graph.set_pin_label(pick_a, "Use A").unwrap();
        let node = graph.node(select).unwrap();
        assert_eq!(node.pin(pick_a.pin).unwrap().default_value(), &Variant::Bool(true));
        assert_eq!(node.pin(pick_a.pin).unwrap().label(), "Use A");
        assert_eq!(node.revision(), revision + 2);
    }

    #[test]
    fn test_connected_pin_keeps_flags_and_type() {
        let mut graph = Graph::new("Test");
        let left = graph.spawn(Select::new(VariantType::Int), &InitContext::new());
        let right = graph.spawn(Select::new(VariantType::Int), &InitContext::new());
        let result = pin(&graph, left, "result", PinDirection::Output);
        let a = pin(&graph, right, "a", PinDirection::Input);
        graph.link(result, a).unwrap();
        let revision = graph.node(right).unwrap().revision();

        assert!(matches!(
            graph.set_pin_flags(a, PinFlags::EXECUTION),
            Err(GraphError::PinConnected(p)) if p == a
        ));
        assert!(matches!(
            graph.set_pin_type(a, VariantType::String),
            Err(GraphError::PinConnected(_))
        ));
        let target = graph.pin(a).unwrap();
        assert!(target.is_data());
        assert_eq!(target.pin_type(), VariantType::Int);
        assert_eq!(graph.node(right).unwrap().revision(), revision);

        graph.unlink(result, a);
        graph.set_pin_type(a, VariantType::String).unwrap();
        assert_eq!(graph.pin(a).unwrap().pin_type(), VariantType::String);
        assert!(graph.node(right).unwrap().revision() > revision);
    }

    #[test]
    fn test_execution_pin_has_no_default() {
        let mut graph = Graph::new("Test");
        let print = graph.spawn(Print::default(), &InitContext::new());
        let exec_in = pin(&graph, print, "ExecIn", PinDirection::Input);
        assert!(matches!(
            graph.set_pin_default_value(exec_in, Variant::Int(1)),
            Err(GraphError::ExecutionPin(_))
        ));
    }

    #[test]
    fn test_foreign_pin_rejected() {
        let mut graph = Graph::new("Test");
        let select = graph.spawn(Select::new(VariantType::Int), &InitContext::new());
        let a = pin(&graph, select, "a", PinDirection::Input);
        let foreign = PinRef::new(NodeId(42), a.pin);
        assert_eq!(graph.link(foreign, a), Err(ConnectionError::NotInGraph(foreign)));
    }

    #[test]
    fn test_remove_pin_severs_links() {
        let mut graph = Graph::new("Test");
        let value = graph.spawn(Constant::new(Variant::Int(4)), &InitContext::new());
        let left = graph.spawn(Select::new(VariantType::Int), &InitContext::new());
        let right = graph.spawn(Select::new(VariantType::Int), &InitContext::new());

        let out = pin(&graph, value, "value", PinDirection::Output);
        let left_a = pin(&graph, left, "a", PinDirection::Input);
        let right_b = pin(&graph, right, "b", PinDirection::Input);
        graph.link(out, left_a).unwrap();
        graph.link(out, right_b).unwrap();

        let revision = graph.node(value).unwrap().revision();
        let removed = graph.remove_pin(out).unwrap();
        assert!(!removed.has_any_connections());
        assert!(!graph.pin(left_a).unwrap().has_any_connections());
        assert!(!graph.pin(right_b).unwrap().has_any_connections());
        assert!(graph.node(value).unwrap().all_pins().is_empty());
        assert!(graph.node(value).unwrap().revision() > revision);
        assert!(matches!(graph.remove_pin(out), Err(GraphError::PinNotFound(_))));
    }

    #[test]
    fn test_remove_pin_reindexes() {
        let mut graph = Graph::new("Test");
        let select = graph.spawn(Select::new(VariantType::Int), &InitContext::new());
        let a = pin(&graph, select, "a", PinDirection::Input);
        graph.remove_pin(a).unwrap();

        let node = graph.node(select).unwrap();
        let indices: Vec<_> = node
            .find_pins(Some(PinDirection::Input))
            .map(|p| (p.name().to_string(), p.index()))
            .collect();
        assert_eq!(indices, vec![("b".to_string(), 0), ("pick_a".to_string(), 1)]);
    }

    #[test]
    fn test_remove_node_severs_links() {
        let mut graph = Graph::new("Test");
        let entry = graph.spawn(Entry, &InitContext::new());
        let print = graph.spawn(Print::default(), &InitContext::new());
        let exec_out = pin(&graph, entry, "ExecOut", PinDirection::Output);
        let exec_in = pin(&graph, print, "ExecIn", PinDirection::Input);
        graph.link(exec_out, exec_in).unwrap();

        let removed = graph.remove_node(print).unwrap();
        assert_eq!(removed.state(), NodeLifecycle::Removed);
        assert!(!removed.has_any_connections());
        assert!(!graph.pin(exec_out).unwrap().has_any_connections());
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.remove_node(print).is_none());
    }

    #[test]
    fn test_autowire_links_flow_and_data() {
        let mut graph = Graph::new("Test");
        let entry = graph.spawn(Entry, &InitContext::new());
        let print = graph.spawn(Print::default(), &InitContext::new());
        assert_eq!(graph.autowire(entry, print).unwrap(), 1);

        let value = graph.spawn(Constant::new(Variant::from("hi")), &InitContext::new());
        assert_eq!(graph.autowire(value, print).unwrap(), 1);
        assert_eq!(graph.connection_count(), 2);
    }
}
