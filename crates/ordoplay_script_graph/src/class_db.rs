// SPDX-License-Identifier: MIT OR Apache-2.0
//! Class hierarchy queries.
//!
//! The engine's class database is not part of this crate. Hosts inject it
//! through [`ClassHierarchy`]; [`ClassTable`] is a plain in-memory table for
//! hosts without one and for tests.

use crate::variant::OBJECT_CLASS;
use indexmap::IndexMap;

/// "Is class A a subclass of, or equal to, class B" queries
pub trait ClassHierarchy: Send + Sync {
    /// Check whether `class_name` is `ancestor` or derives from it
    fn is_parent_class(&self, class_name: &str, ancestor: &str) -> bool;
}

/// In-memory class hierarchy rooted at `Object`
#[derive(Debug, Clone)]
pub struct ClassTable {
    parents: IndexMap<String, Option<String>>,
}

impl ClassTable {
    /// Create a table containing only `Object`
    pub fn new() -> Self {
        let mut parents = IndexMap::new();
        parents.insert(OBJECT_CLASS.to_string(), None);
        Self { parents }
    }

    /// Register a class under its parent
    pub fn register(&mut self, class_name: impl Into<String>, parent: impl Into<String>) -> &mut Self {
        self.parents.insert(class_name.into(), Some(parent.into()));
        self
    }

    /// Whether the class is known
    pub fn contains(&self, class_name: &str) -> bool {
        self.parents.contains_key(class_name)
    }

    /// Direct parent of a class
    pub fn parent_of(&self, class_name: &str) -> Option<&str> {
        self.parents.get(class_name)?.as_deref()
    }
}

impl Default for ClassTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassHierarchy for ClassTable {
    fn is_parent_class(&self, class_name: &str, ancestor: &str) -> bool {
        let mut current = Some(class_name);
        // A malformed table may contain a cycle; no chain is longer than the table
        for _ in 0..=self.parents.len() {
            match current {
                Some(name) if name == ancestor => return true,
                Some(name) => current = self.parent_of(name),
                None => return false,
            }
        }
        false
    }
}
