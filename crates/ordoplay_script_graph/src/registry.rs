// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of node kinds, used to create nodes by type name.

use crate::kinds::{Branch, Constant, Entry, NodeKind, Print, Select, TypeCast};
use crate::node::Node;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Node kind category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Events that start execution
    Event,
    /// Flow control
    FlowControl,
    /// Constant values
    Constant,
    /// Type conversion and checks
    Types,
    /// Utility nodes
    Utility,
    /// Custom/user-defined
    Custom,
}

/// Description of a registered node kind
#[derive(Debug, Clone)]
pub struct NodeKindDescriptor {
    /// Type name, matching [`NodeKind::type_name`]
    pub type_name: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Creates a kind in its default configuration
    pub factory: fn() -> Box<dyn NodeKind>,
}

/// Registry of available node kinds
#[derive(Debug, Clone, Default)]
pub struct NodeKindRegistry {
    kinds: IndexMap<String, NodeKindDescriptor>,
}

impl NodeKindRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node kind, replacing any kind with the same type name
    pub fn register(&mut self, descriptor: NodeKindDescriptor) {
        self.kinds.insert(descriptor.type_name.clone(), descriptor);
    }

    /// Get a node kind by type name
    pub fn get(&self, type_name: &str) -> Option<&NodeKindDescriptor> {
        self.kinds.get(type_name)
    }

    /// All registered kinds
    pub fn kinds(&self) -> impl Iterator<Item = &NodeKindDescriptor> {
        self.kinds.values()
    }

    /// Kinds in a category
    pub fn kinds_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeKindDescriptor> {
        self.kinds.values().filter(move |k| k.category == category)
    }

    /// Create a kind in its default configuration
    pub fn create_kind(&self, type_name: &str) -> Option<Box<dyn NodeKind>> {
        self.get(type_name).map(|k| (k.factory)())
    }

    /// Create an unconfigured node of a kind
    pub fn create_node(&self, type_name: &str) -> Option<Node> {
        self.create_kind(type_name).map(Node::from_kind)
    }
}

fn descriptor(
    kind: &dyn NodeKind,
    category: NodeCategory,
    description: &str,
    factory: fn() -> Box<dyn NodeKind>,
) -> NodeKindDescriptor {
    NodeKindDescriptor {
        type_name: kind.type_name().to_string(),
        name: kind.title(),
        category,
        description: description.to_string(),
        factory,
    }
}

/// Create the registry of built-in script node kinds
pub fn create_script_registry() -> NodeKindRegistry {
    let mut registry = NodeKindRegistry::new();

    registry.register(descriptor(
        &Entry,
        NodeCategory::Event,
        "Starts execution",
        || Box::new(Entry),
    ));
    registry.register(descriptor(
        &Branch,
        NodeCategory::FlowControl,
        "If/else branching",
        || Box::new(Branch),
    ));
    registry.register(descriptor(
        &Constant::default(),
        NodeCategory::Constant,
        "A fixed value",
        || Box::new(Constant::default()),
    ));
    registry.register(descriptor(
        &Print::default(),
        NodeCategory::Utility,
        "Print a string to the script output",
        || Box::new(Print::default()),
    ));
    registry.register(descriptor(
        &TypeCast::default(),
        NodeCategory::Types,
        "Cast an object to a class",
        || Box::new(TypeCast::default()),
    ));
    registry.register(descriptor(
        &Select::default(),
        NodeCategory::FlowControl,
        "Pick one of two values",
        || Box::new(Select::default()),
    ));

    registry
}
