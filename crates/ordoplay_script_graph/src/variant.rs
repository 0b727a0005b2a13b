// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value kinds and dynamically typed values carried by data pins.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Class name every object falls back to when nothing more specific is known
pub const OBJECT_CLASS: &str = "Object";

/// Kind of value that can flow through a data pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VariantType {
    /// No value; used as "any" on data pins and carried by execution pins
    #[default]
    Nil,
    /// Boolean value
    Bool,
    /// Signed integer value
    Int,
    /// Floating point value
    Float,
    /// String value
    String,
    /// Interned name
    StringName,
    /// Path to a node in a scene tree
    NodePath,
    /// 2D vector
    Vector2,
    /// 2D integer vector
    Vector2i,
    /// 3D vector
    Vector3,
    /// 3D integer vector
    Vector3i,
    /// 4D vector
    Vector4,
    /// Color (RGBA)
    Color,
    /// 2D rectangle (position, size)
    Rect2,
    /// Rotation quaternion
    Quaternion,
    /// Engine object reference
    Object,
    /// Ordered list of values
    Array,
    /// String-keyed map of values
    Dictionary,
}

impl VariantType {
    /// Every value kind, in declaration order
    pub const ALL: [VariantType; 18] = [
        Self::Nil,
        Self::Bool,
        Self::Int,
        Self::Float,
        Self::String,
        Self::StringName,
        Self::NodePath,
        Self::Vector2,
        Self::Vector2i,
        Self::Vector3,
        Self::Vector3i,
        Self::Vector4,
        Self::Color,
        Self::Rect2,
        Self::Quaternion,
        Self::Object,
        Self::Array,
        Self::Dictionary,
    ];

    /// Get the display name for this kind
    pub fn name(self) -> &'static str {
        match self {
            Self::Nil => "Any",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "String",
            Self::StringName => "StringName",
            Self::NodePath => "NodePath",
            Self::Vector2 => "Vector2",
            Self::Vector2i => "Vector2i",
            Self::Vector3 => "Vector3",
            Self::Vector3i => "Vector3i",
            Self::Vector4 => "Vector4",
            Self::Color => "Color",
            Self::Rect2 => "Rect2",
            Self::Quaternion => "Quaternion",
            Self::Object => "Object",
            Self::Array => "Array",
            Self::Dictionary => "Dictionary",
        }
    }

    /// Position of this kind in [`VariantType::ALL`]
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    /// Look up a kind by its position in [`VariantType::ALL`]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Look up a kind by its display name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    /// Interpret a property value as a kind, either an index or a name
    pub fn from_variant(value: &Variant) -> Option<Self> {
        match value {
            Variant::Int(i) => usize::try_from(*i).ok().and_then(Self::from_index),
            Variant::String(s) | Variant::StringName(s) => Self::from_name(s),
            _ => None,
        }
    }

    /// Whether this is the untyped "any" kind
    pub fn is_nil(self) -> bool {
        self == Self::Nil
    }

    /// Check if a value of this kind can flow into a pin of another kind
    pub fn can_convert_to(self, other: VariantType) -> bool {
        // Untyped pins accept and produce anything
        if self.is_nil() || other.is_nil() {
            return true;
        }

        if self == other {
            return true;
        }

        match (self, other) {
            // Numeric conversions
            (Self::Int, Self::Float) | (Self::Float, Self::Int) => true,
            (Self::Bool, Self::Int) | (Self::Int, Self::Bool) => true,
            // Text conversions
            (Self::String, Self::StringName | Self::NodePath) => true,
            (Self::StringName | Self::NodePath, Self::String) => true,
            // Vector conversions
            (Self::Vector2, Self::Vector2i) | (Self::Vector2i, Self::Vector2) => true,
            (Self::Vector3, Self::Vector3i) | (Self::Vector3i, Self::Vector3) => true,
            (Self::Color, Self::Vector4) | (Self::Vector4, Self::Color) => true,
            _ => false,
        }
    }

    /// Default value for a freshly created pin of this kind
    pub fn default_value(self) -> Variant {
        match self {
            Self::Nil => Variant::Nil,
            Self::Bool => Variant::Bool(false),
            Self::Int => Variant::Int(0),
            Self::Float => Variant::Float(0.0),
            Self::String => Variant::String(String::new()),
            Self::StringName => Variant::StringName(String::new()),
            Self::NodePath => Variant::NodePath(String::new()),
            Self::Vector2 => Variant::Vector2([0.0; 2]),
            Self::Vector2i => Variant::Vector2i([0; 2]),
            Self::Vector3 => Variant::Vector3([0.0; 3]),
            Self::Vector3i => Variant::Vector3i([0; 3]),
            Self::Vector4 => Variant::Vector4([0.0; 4]),
            Self::Color => Variant::Color([0.0, 0.0, 0.0, 1.0]),
            Self::Rect2 => Variant::Rect2([0.0; 4]),
            Self::Quaternion => Variant::Quaternion([0.0, 0.0, 0.0, 1.0]),
            Self::Object => Variant::Object(None),
            Self::Array => Variant::Array(Vec::new()),
            Self::Dictionary => Variant::Dictionary(IndexMap::new()),
        }
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of a runtime object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

/// Reference to a runtime object, as seen by a script
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Object identity
    pub id: ObjectId,
    /// Runtime class of the object
    pub class_name: String,
}

impl ObjectRef {
    /// Create a new object reference
    pub fn new(id: u64, class_name: impl Into<String>) -> Self {
        Self {
            id: ObjectId(id),
            class_name: class_name.into(),
        }
    }
}

/// Dynamically typed value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Variant {
    /// No value
    #[default]
    Nil,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    String(String),
    /// Interned name
    StringName(String),
    /// Node path
    NodePath(String),
    /// 2D vector
    Vector2([f32; 2]),
    /// 2D integer vector
    Vector2i([i32; 2]),
    /// 3D vector
    Vector3([f32; 3]),
    /// 3D integer vector
    Vector3i([i32; 3]),
    /// 4D vector
    Vector4([f32; 4]),
    /// Color
    Color([f32; 4]),
    /// Rectangle as `[x, y, width, height]`
    Rect2([f32; 4]),
    /// Quaternion as `[x, y, z, w]`
    Quaternion([f32; 4]),
    /// Object reference, `None` for a null object
    Object(Option<ObjectRef>),
    /// Array
    Array(Vec<Variant>),
    /// Dictionary
    Dictionary(IndexMap<String, Variant>),
}

impl Variant {
    /// Get the kind of this value
    pub fn variant_type(&self) -> VariantType {
        match self {
            Self::Nil => VariantType::Nil,
            Self::Bool(_) => VariantType::Bool,
            Self::Int(_) => VariantType::Int,
            Self::Float(_) => VariantType::Float,
            Self::String(_) => VariantType::String,
            Self::StringName(_) => VariantType::StringName,
            Self::NodePath(_) => VariantType::NodePath,
            Self::Vector2(_) => VariantType::Vector2,
            Self::Vector2i(_) => VariantType::Vector2i,
            Self::Vector3(_) => VariantType::Vector3,
            Self::Vector3i(_) => VariantType::Vector3i,
            Self::Vector4(_) => VariantType::Vector4,
            Self::Color(_) => VariantType::Color,
            Self::Rect2(_) => VariantType::Rect2,
            Self::Quaternion(_) => VariantType::Quaternion,
            Self::Object(_) => VariantType::Object,
            Self::Array(_) => VariantType::Array,
            Self::Dictionary(_) => VariantType::Dictionary,
        }
    }

    /// Interpret the value as a condition.
    ///
    /// Zero, empty and null values are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) | Self::StringName(s) | Self::NodePath(s) => !s.is_empty(),
            Self::Vector2(v) => v.iter().any(|c| *c != 0.0),
            Self::Vector2i(v) => v.iter().any(|c| *c != 0),
            Self::Vector3(v) => v.iter().any(|c| *c != 0.0),
            Self::Vector3i(v) => v.iter().any(|c| *c != 0),
            Self::Vector4(v) | Self::Color(v) | Self::Rect2(v) | Self::Quaternion(v) => {
                v.iter().any(|c| *c != 0.0)
            }
            Self::Object(o) => o.is_some(),
            Self::Array(a) => !a.is_empty(),
            Self::Dictionary(d) => !d.is_empty(),
        }
    }

    /// Get the referenced object, if this is a non-null object value
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(Some(object)) => Some(object),
            _ => None,
        }
    }

    /// Convert the value to another kind, if an implicit conversion exists
    pub fn convert(&self, to: VariantType) -> Option<Variant> {
        let from = self.variant_type();
        if from == to || to.is_nil() {
            return Some(self.clone());
        }

        let converted = match (self, to) {
            (Self::Nil, _) => to.default_value(),
            (Self::Int(i), VariantType::Float) => Self::Float(*i as f64),
            (Self::Float(f), VariantType::Int) => Self::Int(*f as i64),
            (Self::Bool(b), VariantType::Int) => Self::Int(i64::from(*b)),
            (Self::Int(i), VariantType::Bool) => Self::Bool(*i != 0),
            (Self::String(s) | Self::StringName(s) | Self::NodePath(s), VariantType::String) => {
                Self::String(s.clone())
            }
            (Self::String(s), VariantType::StringName) => Self::StringName(s.clone()),
            (Self::String(s), VariantType::NodePath) => Self::NodePath(s.clone()),
            (Self::Vector2(v), VariantType::Vector2i) => Self::Vector2i(v.map(|c| c as i32)),
            (Self::Vector2i(v), VariantType::Vector2) => Self::Vector2(v.map(|c| c as f32)),
            (Self::Vector3(v), VariantType::Vector3i) => Self::Vector3i(v.map(|c| c as i32)),
            (Self::Vector3i(v), VariantType::Vector3) => Self::Vector3(v.map(|c| c as f32)),
            (Self::Color(v), VariantType::Vector4) => Self::Vector4(*v),
            (Self::Vector4(v), VariantType::Color) => Self::Color(*v),
            _ => return None,
        };
        Some(converted)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) | Self::StringName(s) | Self::NodePath(s) => f.write_str(s),
            Self::Vector2(v) => write!(f, "({}, {})", v[0], v[1]),
            Self::Vector2i(v) => write!(f, "({}, {})", v[0], v[1]),
            Self::Vector3(v) => write!(f, "({}, {}, {})", v[0], v[1], v[2]),
            Self::Vector3i(v) => write!(f, "({}, {}, {})", v[0], v[1], v[2]),
            Self::Vector4(v) | Self::Color(v) | Self::Rect2(v) | Self::Quaternion(v) => {
                write!(f, "({}, {}, {}, {})", v[0], v[1], v[2], v[3])
            }
            Self::Object(Some(o)) => write!(f, "<{}#{}>", o.class_name, o.id.0),
            Self::Object(None) => f.write_str("<null>"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Dictionary(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Variant {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<ObjectRef> for Variant {
    fn from(value: ObjectRef) -> Self {
        Self::Object(Some(value))
    }
}
