// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node kinds: the per-kind behavior behind every [`Node`].
//!
//! A kind decides which pins a node has, how those pins are re-derived when
//! its configuration changes, how it resolves types for its pins and what its
//! compiled [`NodeInstance`] does when stepped.

pub mod branch;
pub mod constant;
pub mod entry;
pub mod print;
pub mod select;
pub mod type_cast;

use crate::graph::Graph;
use crate::instance::{ExecutionOwner, NodeInstance};
use crate::node::{InitContext, Node, NodeFlags, PinSet};
use crate::pin::Pin;
use crate::variant::{Variant, VariantType};
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;

pub use branch::Branch;
pub use constant::Constant;
pub use entry::Entry;
pub use print::Print;
pub use select::Select;
pub use type_cast::TypeCast;

/// Outcome of setting a node property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyChange {
    /// The kind has no such property, or the value was rejected
    Ignored,
    /// The value was stored; pins are unaffected
    Updated,
    /// The value was stored and the node must be reconstructed
    PinsChanged,
}

/// Type information resolved for one pin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// Value kind
    pub variant_type: VariantType,
    /// Object class, meaningful for object values
    pub class_name: String,
}

/// Resolved types of a node's connected data inputs, keyed by pin name
pub type ResolvedInputs = IndexMap<String, TypeInfo>;

/// Per-kind behavior of a node
pub trait NodeKind: fmt::Debug + Send + Sync + 'static {
    /// Stable type name, used by the registry and in records
    fn type_name(&self) -> &'static str;

    /// Title bar text
    fn title(&self) -> String {
        self.type_name().to_string()
    }

    /// Icon name
    fn icon(&self) -> String {
        "Object".to_string()
    }

    /// Tooltip text
    fn tooltip(&self) -> String {
        String::new()
    }

    /// Extra search keywords
    fn keywords(&self) -> Vec<String> {
        Vec::new()
    }

    /// Flags a new node of this kind starts with
    fn default_flags(&self) -> NodeFlags {
        NodeFlags::CATALOGABLE
    }

    /// Apply creation-time configuration
    fn initialize(&mut self, _context: &InitContext) {}

    /// Create the pins for the current configuration
    fn allocate_default_pins(&self, pins: &mut PinSet);

    /// Build the new pin set during reconstruction.
    ///
    /// `pins` is empty when this is called; `old_pins` still carry their
    /// connections.
    fn reallocate_pins_during_reconstruction(&self, _old_pins: &[Pin], pins: &mut PinSet) {
        self.allocate_default_pins(pins);
    }

    /// Whether connections of `old` may move to `new` during rewiring
    fn is_rewire_compatible(&self, old: &Pin, new: &Pin) -> bool {
        default_rewire_compatible(old, new)
    }

    /// Called once a reconstruction has finished
    fn post_reconstruct_node(&mut self) {}

    /// Whether the user may change the node's pin types
    fn can_change_pin_type(&self) -> bool {
        false
    }

    /// Pin types the user may choose from
    fn possible_pin_types(&self) -> Vec<VariantType> {
        Vec::new()
    }

    /// Change the node's pin types; returns true if reconstruction is needed
    fn change_pin_types(&mut self, _pin_type: VariantType) -> bool {
        false
    }

    /// Current configuration, as name/value pairs
    fn properties(&self) -> IndexMap<String, Variant> {
        IndexMap::new()
    }

    /// Get one configuration value
    fn get_property(&self, name: &str) -> Option<Variant> {
        self.properties().shift_remove(name)
    }

    /// Set one configuration value
    fn set_property(&mut self, _name: &str, _value: &Variant) -> PropertyChange {
        PropertyChange::Ignored
    }

    /// Class the given pin should be treated as.
    ///
    /// Implementations must stay local: they may read the node and the
    /// declared types of directly connected pins, nothing further. `None`
    /// lets the graph fall back to the general default.
    fn resolve_type_class(&self, _node: &Node, _pin: &Pin, _graph: &Graph) -> Option<String> {
        None
    }

    /// Value kind the given pin should be treated as, see [`NodeKind::resolve_type_class`]
    fn resolve_pin_type(&self, _node: &Node, _pin: &Pin, _graph: &Graph) -> Option<VariantType> {
        None
    }

    /// Called after the node was autowired to an upstream node.
    ///
    /// Returns true if the configuration changed and the node must be
    /// reconstructed.
    fn post_node_autowired(&mut self, _inputs: &ResolvedInputs) -> bool {
        false
    }

    /// Check the node before it is compiled
    fn validate_node_during_build(&self, _node: &Node) -> Result<(), String> {
        Ok(())
    }

    /// Called before the node is removed from its graph
    fn pre_remove(&mut self) {}

    /// Compile the node into a runtime instance
    fn instantiate(&self, node: &Node, owner: &ExecutionOwner) -> Box<dyn NodeInstance>;

    /// Clone into a box
    fn clone_box(&self) -> Box<dyn NodeKind>;

    /// Access as [`Any`] for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Default rewiring rule.
///
/// Execution pins always match execution pins. Data pins match when the types
/// are identical, either side is untyped, or the old type converts implicitly
/// into the new one.
pub fn default_rewire_compatible(old: &Pin, new: &Pin) -> bool {
    if old.is_execution() || new.is_execution() {
        return old.is_execution() && new.is_execution();
    }
    old.pin_type().can_convert_to(new.pin_type())
}
