// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the script graph.
//!
//! A [`Node`] is a graph vertex owning an ordered [`PinSet`]. What the node
//! actually does (which pins it allocates, how it executes) is delegated to
//! its [`NodeKind`].

use crate::graph::GraphId;
use crate::kinds::NodeKind;
use crate::pin::{Pin, PinDirection, PinFlags, PinId, PinRef};
use crate::variant::{Variant, VariantType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Unique identifier for a node, assigned by the owning graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeFlags(u32);

impl NodeFlags {
    /// No flags
    pub const NONE: Self = Self(0);
    /// Node should be offered in the action catalog
    pub const CATALOGABLE: Self = Self(1 << 1);
    /// Node is only meant for development builds
    pub const DEVELOPMENT_ONLY: Self = Self(1 << 2);
    /// Node is experimental and may change
    pub const EXPERIMENTAL: Self = Self(1 << 3);

    /// Raw bit representation
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Check whether all flags in `other` are set
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for NodeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Lifecycle of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLifecycle {
    /// Created, no configuration applied yet
    Uncreated,
    /// Creation-time configuration applied
    Initialized,
    /// Default pins allocated, not yet in a graph
    PinsAllocated,
    /// Owned by a graph and editable
    Live,
    /// Pins are being rebuilt; no other pin mutation may happen
    Reconstructing,
    /// Removed from its graph
    Removed,
}

/// Describes an argument or a property
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertyInfo {
    /// Property name
    pub name: String,
    /// Value kind
    pub variant_type: VariantType,
    /// Class for object properties
    pub class_name: Option<String>,
}

/// Describes a callable method
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MethodInfo {
    /// Method name
    pub name: String,
    /// Arguments, in call order
    pub arguments: Vec<PropertyInfo>,
    /// Return value description
    pub return_value: PropertyInfo,
}

/// Creation-time configuration for a node.
///
/// Which fields are populated depends on the kind being created; kinds
/// ignore anything they do not understand.
#[derive(Debug, Clone, Default)]
pub struct InitContext {
    /// Method the node calls or implements
    pub method: Option<MethodInfo>,
    /// Property the node accesses
    pub property: Option<PropertyInfo>,
    /// Scene node path
    pub node_path: Option<String>,
    /// Target class name
    pub class_name: Option<String>,
    /// Script variable name
    pub variable_name: Option<String>,
    /// Resource path
    pub resource_path: Option<String>,
    /// Free-form data
    pub user_data: Option<IndexMap<String, Variant>>,
}

impl InitContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target class name
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Set the variable name
    pub fn with_variable_name(mut self, name: impl Into<String>) -> Self {
        self.variable_name = Some(name.into());
        self
    }

    /// Add one free-form entry
    pub fn with_user_data(mut self, key: impl Into<String>, value: Variant) -> Self {
        self.user_data
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), value);
        self
    }

    /// Look up a free-form entry
    pub fn user_value(&self, key: &str) -> Option<&Variant> {
        self.user_data.as_ref().and_then(|d| d.get(key))
    }
}

/// Ordered pins of one node.
///
/// Indices are kept contiguous per direction; every mutation re-caches them.
#[derive(Debug, Clone, Default)]
pub struct PinSet {
    pins: Vec<Pin>,
    next_id: u32,
}

impl PinSet {
    /// Create an empty pin set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pin.
    ///
    /// Without an `index` the pin is appended after the existing pins of its
    /// direction; otherwise it is inserted at that position.
    pub fn create_pin(
        &mut self,
        direction: PinDirection,
        name: impl Into<String>,
        pin_type: VariantType,
        default_value: Variant,
        index: Option<usize>,
    ) -> &mut Pin {
        let id = PinId(self.next_id);
        self.next_id += 1;
        let pin = Pin::new(id, direction, name, pin_type, default_value);

        let position = index.and_then(|index| {
            self.pins
                .iter()
                .position(|p| p.direction() == direction && p.index() >= index)
        });
        let position = match position {
            Some(position) => {
                self.pins.insert(position, pin);
                position
            }
            None => {
                self.pins.push(pin);
                self.pins.len() - 1
            }
        };

        self.cache_pin_indices();
        &mut self.pins[position]
    }

    /// Create a control-flow pin
    pub fn create_execution_pin(&mut self, direction: PinDirection, name: impl Into<String>) -> &mut Pin {
        self.create_pin(direction, name, VariantType::Nil, Variant::Nil, None)
            .set_flags(PinFlags::EXECUTION)
    }

    /// Create a value-carrying pin
    pub fn create_data_pin(
        &mut self,
        direction: PinDirection,
        name: impl Into<String>,
        pin_type: VariantType,
        default_value: Variant,
    ) -> &mut Pin {
        self.create_pin(direction, name, pin_type, default_value, None)
    }

    /// Find a pin by name; without a direction inputs are searched first
    pub fn find(&self, name: &str, direction: Option<PinDirection>) -> Option<&Pin> {
        match direction {
            Some(direction) => self
                .pins
                .iter()
                .find(|p| p.direction() == direction && p.name() == name),
            None => self
                .find(name, Some(PinDirection::Input))
                .or_else(|| self.find(name, Some(PinDirection::Output))),
        }
    }

    /// Find a pin by its index within a direction
    pub fn find_by_index(&self, index: usize, direction: PinDirection) -> Option<&Pin> {
        self.pins
            .iter()
            .find(|p| p.direction() == direction && p.index() == index)
    }

    /// Iterate the pins of one direction, or all pins
    pub fn find_pins(&self, direction: Option<PinDirection>) -> impl Iterator<Item = &Pin> {
        self.pins
            .iter()
            .filter(move |p| direction.map_or(true, |d| p.direction() == d))
    }

    /// Get a pin by id
    pub fn get(&self, id: PinId) -> Option<&Pin> {
        self.pins.iter().find(|p| p.id() == id)
    }

    /// Get a mutable pin by id
    pub fn get_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        self.pins.iter_mut().find(|p| p.id() == id)
    }

    /// Number of pins in one direction
    pub fn count(&self, direction: PinDirection) -> usize {
        self.pins.iter().filter(|p| p.direction() == direction).count()
    }

    /// All pins in order
    pub fn as_slice(&self) -> &[Pin] {
        &self.pins
    }

    /// Iterate all pins in order
    pub fn iter(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter()
    }

    /// Number of pins
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// Whether there are no pins
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub(crate) fn remove(&mut self, id: PinId) -> Option<Pin> {
        let position = self.pins.iter().position(|p| p.id() == id)?;
        let pin = self.pins.remove(position);
        self.cache_pin_indices();
        Some(pin)
    }

    pub(crate) fn take_all(&mut self) -> Vec<Pin> {
        std::mem::take(&mut self.pins)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Pin> {
        self.pins.iter_mut()
    }

    pub(crate) fn cache_pin_indices(&mut self) {
        let mut inputs = 0;
        let mut outputs = 0;
        for pin in &mut self.pins {
            let counter = match pin.direction() {
                PinDirection::Input => &mut inputs,
                PinDirection::Output => &mut outputs,
            };
            pin.set_index(*counter);
            *counter += 1;
        }
    }
}

/// A node in the script graph
#[derive(Debug)]
pub struct Node {
    id: Option<NodeId>,
    graph: Option<GraphId>,
    position: [f32; 2],
    size: [f32; 2],
    flags: NodeFlags,
    pins: PinSet,
    state: NodeLifecycle,
    revision: u64,
    kind: Box<dyn NodeKind>,
}

impl Node {
    /// Create an empty node of the given kind
    pub fn new(kind: impl NodeKind) -> Self {
        Self::from_kind(Box::new(kind))
    }

    /// Create an empty node from a boxed kind
    pub fn from_kind(kind: Box<dyn NodeKind>) -> Self {
        Self {
            id: None,
            graph: None,
            position: [0.0, 0.0],
            size: [0.0, 0.0],
            flags: kind.default_flags(),
            pins: PinSet::new(),
            state: NodeLifecycle::Uncreated,
            revision: 0,
            kind,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Apply creation-time configuration
    pub fn initialize(&mut self, context: &InitContext) {
        self.kind.initialize(context);
        if self.state == NodeLifecycle::Uncreated {
            self.state = NodeLifecycle::Initialized;
        }
    }

    /// Populate the node's pins from its current configuration.
    ///
    /// Does nothing if the node already has pins.
    pub fn allocate_default_pins(&mut self) {
        if !self.pins.is_empty() {
            tracing::debug!(kind = self.kind.type_name(), "pins already allocated");
            return;
        }
        self.kind.allocate_default_pins(&mut self.pins);
        self.pins.cache_pin_indices();
        self.revision += 1;
        if matches!(self.state, NodeLifecycle::Uncreated | NodeLifecycle::Initialized) {
            self.state = NodeLifecycle::PinsAllocated;
        }
    }

    /// Node id, once the node has been added to a graph
    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    /// Owning graph
    pub fn graph_id(&self) -> Option<GraphId> {
        self.graph
    }

    /// Position on the graph canvas
    pub fn position(&self) -> [f32; 2] {
        self.position
    }

    /// Set the position on the graph canvas
    pub fn set_position(&mut self, position: [f32; 2]) {
        self.position = position;
    }

    /// Node size
    pub fn size(&self) -> [f32; 2] {
        self.size
    }

    /// Set the node size
    pub fn set_size(&mut self, size: [f32; 2]) {
        self.size = size;
    }

    /// Node flags
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Replace the node flags
    pub fn set_flags(&mut self, flags: NodeFlags) {
        self.flags = flags;
    }

    /// Lifecycle state
    pub fn state(&self) -> NodeLifecycle {
        self.state
    }

    /// Whether creation-time configuration has been applied
    pub fn is_initialized(&self) -> bool {
        self.state != NodeLifecycle::Uncreated
    }

    /// Whether a reconstruction is in progress
    pub fn is_reconstructing(&self) -> bool {
        self.state == NodeLifecycle::Reconstructing
    }

    /// Counter bumped on every change to the pin layout
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The node's kind
    pub fn kind(&self) -> &dyn NodeKind {
        self.kind.as_ref()
    }

    /// Downcast the node's kind
    pub fn kind_as<T: NodeKind>(&self) -> Option<&T> {
        self.kind.as_any().downcast_ref::<T>()
    }

    /// Title bar text
    pub fn title(&self) -> String {
        self.kind.title()
    }

    /// Icon name
    pub fn icon(&self) -> String {
        self.kind.icon()
    }

    /// Tooltip text
    pub fn tooltip(&self) -> String {
        self.kind.tooltip()
    }

    /// Create a pin, see [`PinSet::create_pin`]
    pub fn create_pin(
        &mut self,
        direction: PinDirection,
        name: impl Into<String>,
        pin_type: VariantType,
        default_value: Variant,
        index: Option<usize>,
    ) -> &mut Pin {
        self.revision += 1;
        self.pins.create_pin(direction, name, pin_type, default_value, index)
    }

    /// Find a pin by name; without a direction inputs are searched first
    pub fn find_pin(&self, name: &str, direction: Option<PinDirection>) -> Option<&Pin> {
        self.pins.find(name, direction)
    }

    /// Find a pin by its index within a direction
    pub fn find_pin_by_index(&self, index: usize, direction: PinDirection) -> Option<&Pin> {
        self.pins.find_by_index(index, direction)
    }

    /// Iterate the pins of one direction, or all pins
    pub fn find_pins(&self, direction: Option<PinDirection>) -> impl Iterator<Item = &Pin> {
        self.pins.find_pins(direction)
    }

    /// Get a pin by id
    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.get(id)
    }

    pub(crate) fn pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        self.pins.get_mut(id)
    }

    /// Read-only view of all pins
    pub fn all_pins(&self) -> &[Pin] {
        self.pins.as_slice()
    }

    /// Reference a pin by name, once the node is in a graph
    pub fn pin_ref(&self, name: &str, direction: PinDirection) -> Option<PinRef> {
        let id = self.id?;
        self.find_pin(name, Some(direction))
            .map(|pin| PinRef::new(id, pin.id()))
    }

    /// Check whether the node has any connections
    pub fn has_any_connections(&self) -> bool {
        self.pins.iter().any(Pin::has_any_connections)
    }

    /// Replace every input default that does not match its pin's kind
    pub fn validate_input_default_values(&mut self) {
        let mut changed = false;
        for pin in self.pins.iter_mut() {
            if !pin.is_input() || pin.is_execution() {
                continue;
            }
            let pin_type = pin.pin_type();
            if pin.default_value().variant_type() == pin_type || pin_type.is_nil() {
                continue;
            }
            let value = pin
                .default_value()
                .convert(pin_type)
                .unwrap_or_else(|| pin_type.default_value());
            pin.set_default_value(value);
            changed = true;
        }
        if changed {
            self.revision += 1;
        }
    }

    pub(crate) fn kind_mut(&mut self) -> &mut dyn NodeKind {
        self.kind.as_mut()
    }

    pub(crate) fn pins_mut(&mut self) -> &mut PinSet {
        &mut self.pins
    }

    /// Install pins built elsewhere, as when restoring a saved node
    pub(crate) fn replace_pins(&mut self, pins: PinSet) -> PinSet {
        let old = std::mem::replace(&mut self.pins, pins);
        self.pins.cache_pin_indices();
        self.revision += 1;
        if matches!(self.state, NodeLifecycle::Uncreated | NodeLifecycle::Initialized) {
            self.state = NodeLifecycle::PinsAllocated;
        }
        old
    }

    pub(crate) fn bump_revision(&mut self) {
        self.revision += 1;
    }

    pub(crate) fn set_state(&mut self, state: NodeLifecycle) {
        self.state = state;
    }

    pub(crate) fn attach(&mut self, id: NodeId, graph: GraphId) {
        if let Some(existing) = self.id {
            tracing::warn!(%existing, new = %id, "node id is immutable once assigned");
            return;
        }
        self.id = Some(id);
        self.graph = Some(graph);
        self.state = NodeLifecycle::Live;
    }

    pub(crate) fn split_kind_pins(&mut self) -> (&mut dyn NodeKind, &mut PinSet) {
        (self.kind.as_mut(), &mut self.pins)
    }
}

impl Clone for Node {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            graph: self.graph,
            position: self.position,
            size: self.size,
            flags: self.flags,
            pins: self.pins.clone(),
            state: self.state,
            revision: self.revision,
            kind: self.kind.clone_box(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::select::Select;

    fn pin_set() -> PinSet {
        let mut pins = PinSet::new();
        pins.create_data_pin(PinDirection::Input, "a", VariantType::Int, Variant::Int(0));
        pins.create_data_pin(PinDirection::Output, "out", VariantType::Int, Variant::Nil);
        pins.create_data_pin(PinDirection::Input, "b", VariantType::Int, Variant::Int(0));
        pins
    }

    #[test]
    fn test_append_keeps_indices_per_direction() {
        let pins = pin_set();
        assert_eq!(pins.find("a", None).unwrap().index(), 0);
        assert_eq!(pins.find("b", None).unwrap().index(), 1);
        assert_eq!(pins.find("out", None).unwrap().index(), 0);
    }

    #[test]
    fn test_insert_at_index() {
        let mut pins = pin_set();
        pins.create_pin(PinDirection::Input, "first", VariantType::Bool, Variant::Bool(false), Some(0));
        let names: Vec<_> = pins
            .find_pins(Some(PinDirection::Input))
            .map(|p| (p.name().to_string(), p.index()))
            .collect();
        assert_eq!(
            names,
            vec![("first".to_string(), 0), ("a".to_string(), 1), ("b".to_string(), 2)]
        );

        // Past the end behaves like an append
        pins.create_pin(PinDirection::Output, "late", VariantType::Int, Variant::Nil, Some(10));
        assert_eq!(pins.find("late", None).unwrap().index(), 1);
    }

    #[test]
    fn test_find_prefers_inputs() {
        let mut pins = PinSet::new();
        pins.create_data_pin(PinDirection::Output, "value", VariantType::Int, Variant::Nil);
        pins.create_data_pin(PinDirection::Input, "value", VariantType::Int, Variant::Nil);
        assert!(pins.find("value", None).unwrap().is_input());
        assert!(pins.find("value", Some(PinDirection::Output)).unwrap().is_output());
        assert!(pins.find("missing", None).is_none());
        assert!(pins.find_by_index(3, PinDirection::Input).is_none());
    }

    #[test]
    fn test_remove_recaches_indices() {
        let mut pins = pin_set();
        let a = pins.find("a", None).unwrap().id();
        pins.remove(a).unwrap();
        assert_eq!(pins.find("b", None).unwrap().index(), 0);
        assert!(pins.get(a).is_none());
    }

    #[test]
    fn test_node_lifecycle() {
        let mut node = Node::new(Select::default());
        assert_eq!(node.state(), NodeLifecycle::Uncreated);
        assert!(!node.is_initialized());

        node.initialize(&InitContext::new());
        assert_eq!(node.state(), NodeLifecycle::Initialized);

        node.allocate_default_pins();
        assert_eq!(node.state(), NodeLifecycle::PinsAllocated);
        assert_eq!(node.all_pins().len(), 4);
        assert!(node.id().is_none());
        assert!(node.pin_ref("a", PinDirection::Input).is_none());

        // A second allocation keeps the existing pins
        let revision = node.revision();
        node.allocate_default_pins();
        assert_eq!(node.all_pins().len(), 4);
        assert_eq!(node.revision(), revision);
    }

    #[test]
    fn test_validate_input_defaults() {
        let mut node = Node::new(Select::new(VariantType::Int));
        node.allocate_default_pins();
        let a = node.find_pin("a", Some(PinDirection::Input)).unwrap().id();
        node.pin_mut(a).unwrap().set_default_value(Variant::Float(2.9));
        node.validate_input_default_values();
        assert_eq!(node.pin(a).unwrap().default_value(), &Variant::Int(2));
    }

    #[test]
    fn test_init_context_user_data() {
        let context = InitContext::new()
            .with_class_name("Node2D")
            .with_user_data("type", Variant::Int(3));
        assert_eq!(context.class_name.as_deref(), Some("Node2D"));
        assert_eq!(context.user_value("type"), Some(&Variant::Int(3)));
        assert!(context.user_value("missing").is_none());
        assert!(context.method.is_none());
    }
}
