// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pin definitions for node inputs/outputs.
//!
//! A pin keeps its own side of the connection index: the list of pins on
//! other nodes it is linked to. The [`Graph`](crate::graph::Graph) keeps both
//! sides symmetric.

use crate::graph::ConnectionError;
use crate::node::NodeId;
use crate::variant::{Variant, VariantType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Identifier of a pin, unique within its node and stable across re-indexing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinId(pub u32);

/// Reference to a pin anywhere in a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PinRef {
    /// Owning node
    pub node: NodeId,
    /// Pin on that node
    pub pin: PinId,
}

impl PinRef {
    /// Create a new pin reference
    pub fn new(node: NodeId, pin: PinId) -> Self {
        Self { node, pin }
    }
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.pin.0)
    }
}

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDirection {
    /// Input pin
    Input,
    /// Output pin
    Output,
}

impl PinDirection {
    /// The direction a pin must have to be linked with this one
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

impl fmt::Display for PinDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// Pin behavior flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinFlags(u32);

impl PinFlags {
    /// No flags
    pub const NONE: Self = Self(0);
    /// Control-flow pin, carries no value
    pub const EXECUTION: Self = Self(1 << 0);
    /// Value-carrying pin
    pub const DATA: Self = Self(1 << 1);
    /// Value is an object reference
    pub const OBJECT: Self = Self(1 << 2);
    /// Always show the pin label
    pub const SHOW_LABEL: Self = Self(1 << 3);
    /// Never show the pin label
    pub const HIDE_LABEL: Self = Self(1 << 4);
    /// Display the label verbatim
    pub const NO_CAPITALIZE: Self = Self(1 << 5);
    /// Pin was added by the user rather than by the node kind
    pub const USER_DEFINED: Self = Self(1 << 6);

    /// Raw bit representation
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Build flags from raw bits
    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Check whether all flags in `other` are set
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the flags in `other`
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear the flags in `other`
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for PinFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PinFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A pin on a node
#[derive(Debug, Clone)]
pub struct Pin {
    id: PinId,
    direction: PinDirection,
    index: usize,
    name: String,
    label: Option<String>,
    pin_type: VariantType,
    target_class: Option<String>,
    flags: PinFlags,
    default_value: Variant,
    connections: Vec<PinRef>,
}

impl Pin {
    /// Create a new, unconnected data pin.
    ///
    /// The index is provisional until the owning node re-caches its indices.
    pub(crate) fn new(
        id: PinId,
        direction: PinDirection,
        name: impl Into<String>,
        pin_type: VariantType,
        default_value: Variant,
    ) -> Self {
        let mut flags = PinFlags::DATA;
        if pin_type == VariantType::Object {
            flags |= PinFlags::OBJECT;
        }
        Self {
            id,
            direction,
            index: 0,
            name: name.into(),
            label: None,
            pin_type,
            target_class: None,
            flags,
            default_value,
            connections: Vec::new(),
        }
    }

    /// Pin identifier
    pub fn id(&self) -> PinId {
        self.id
    }

    /// Pin direction
    pub fn direction(&self) -> PinDirection {
        self.direction
    }

    /// Position of the pin among the node's pins of the same direction
    pub fn index(&self) -> usize {
        self.index
    }

    /// Pin name, used for matching during reconstruction
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display label, falls back to the name
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Explicit display label, if one was set
    pub fn custom_label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Value kind carried by the pin
    pub fn pin_type(&self) -> VariantType {
        self.pin_type
    }

    /// Class hint for object pins
    pub fn target_class(&self) -> Option<&str> {
        self.target_class.as_deref()
    }

    /// Pin flags
    pub fn flags(&self) -> PinFlags {
        self.flags
    }

    /// Value used when the pin is not connected
    pub fn default_value(&self) -> &Variant {
        &self.default_value
    }

    /// Pins on other nodes this pin is linked to
    pub fn connections(&self) -> &[PinRef] {
        &self.connections
    }

    /// Whether this is a control-flow pin
    pub fn is_execution(&self) -> bool {
        self.flags.contains(PinFlags::EXECUTION)
    }

    /// Whether this pin carries a value
    pub fn is_data(&self) -> bool {
        !self.is_execution()
    }

    /// Whether this is an input pin
    pub fn is_input(&self) -> bool {
        self.direction == PinDirection::Input
    }

    /// Whether this is an output pin
    pub fn is_output(&self) -> bool {
        self.direction == PinDirection::Output
    }

    /// Whether the pin is linked to anything
    pub fn has_any_connections(&self) -> bool {
        !self.connections.is_empty()
    }

    /// Check if the pin is linked to a specific pin
    pub fn is_connected_to(&self, other: PinRef) -> bool {
        self.connections.contains(&other)
    }

    /// Whether this pin accepts at most one link
    pub fn is_single_link(&self) -> bool {
        self.is_input() && self.is_data()
    }

    /// Replace the pin flags.
    ///
    /// Marking a pin as execution clears its value kind so it never takes
    /// part in type propagation.
    pub fn set_flags(&mut self, flags: PinFlags) -> &mut Self {
        self.flags = flags;
        if self.is_execution() {
            self.flags.remove(PinFlags::DATA);
            self.pin_type = VariantType::Nil;
            self.default_value = Variant::Nil;
        }
        self
    }

    /// Set the display label
    pub fn set_label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = Some(label.into());
        self
    }

    /// Set the class hint for object pins
    pub fn set_target_class(&mut self, class_name: impl Into<String>) -> &mut Self {
        let class_name = class_name.into();
        self.target_class = (!class_name.is_empty()).then_some(class_name);
        self
    }

    /// Change the value kind of a data pin
    pub fn set_type(&mut self, pin_type: VariantType) -> &mut Self {
        if self.is_execution() {
            return self;
        }
        self.pin_type = pin_type;
        if pin_type == VariantType::Object {
            self.flags.insert(PinFlags::OBJECT);
        } else {
            self.flags.remove(PinFlags::OBJECT);
        }
        self
    }

    /// Set the value used when the pin is not connected
    pub fn set_default_value(&mut self, value: Variant) -> &mut Self {
        if self.is_data() {
            self.default_value = value;
        }
        self
    }

    /// Check whether a link between this pin and `other` is structurally valid.
    ///
    /// Occupancy of single-link inputs is checked by the graph.
    pub fn can_link(&self, other: &Pin) -> Result<(), ConnectionError> {
        if self.direction == other.direction {
            return Err(ConnectionError::SameDirection);
        }
        if self.is_execution() != other.is_execution() {
            return Err(ConnectionError::KindMismatch);
        }
        Ok(())
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) fn add_connection(&mut self, other: PinRef) {
        if !self.connections.contains(&other) {
            self.connections.push(other);
        }
    }

    pub(crate) fn remove_connection(&mut self, other: PinRef) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| *c != other);
        self.connections.len() != before
    }

    pub(crate) fn replace_connection(&mut self, from: PinRef, to: PinRef) {
        for connection in &mut self.connections {
            if *connection == from {
                *connection = to;
            }
        }
    }

    pub(crate) fn set_connections(&mut self, connections: Vec<PinRef>) {
        self.connections = connections;
    }

    pub(crate) fn take_connections(&mut self) -> Vec<PinRef> {
        std::mem::take(&mut self.connections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_flag_clears_type() {
        let mut pin = Pin::new(PinId(0), PinDirection::Input, "ExecIn", VariantType::Int, Variant::Int(4));
        pin.set_flags(PinFlags::EXECUTION);
        assert!(pin.is_execution());
        assert_eq!(pin.pin_type(), VariantType::Nil);
        assert_eq!(pin.default_value(), &Variant::Nil);

        pin.set_type(VariantType::Float);
        assert_eq!(pin.pin_type(), VariantType::Nil);
    }

    #[test]
    fn test_object_flag_follows_type() {
        let mut pin = Pin::new(PinId(0), PinDirection::Output, "out", VariantType::Object, Variant::Nil);
        assert!(pin.flags().contains(PinFlags::DATA | PinFlags::OBJECT));
        pin.set_type(VariantType::Int);
        assert!(!pin.flags().contains(PinFlags::OBJECT));
    }

    #[test]
    fn test_can_link() {
        let a = Pin::new(PinId(0), PinDirection::Output, "a", VariantType::Int, Variant::Nil);
        let b = Pin::new(PinId(1), PinDirection::Output, "b", VariantType::Int, Variant::Nil);
        let mut c = Pin::new(PinId(2), PinDirection::Input, "c", VariantType::Int, Variant::Nil);
        assert!(matches!(a.can_link(&b), Err(ConnectionError::SameDirection)));
        assert!(a.can_link(&c).is_ok());
        c.set_flags(PinFlags::EXECUTION);
        assert!(matches!(a.can_link(&c), Err(ConnectionError::KindMismatch)));
    }

    #[test]
    fn test_label_fallback() {
        let mut pin = Pin::new(PinId(0), PinDirection::Output, "output", VariantType::Object, Variant::Nil);
        assert_eq!(pin.label(), "output");
        pin.set_label("as Node2D");
        assert_eq!(pin.label(), "as Node2D");
        assert_eq!(pin.custom_label(), Some("as Node2D"));
    }
}
