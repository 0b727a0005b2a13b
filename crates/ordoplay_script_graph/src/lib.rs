// SPDX-License-Identifier: MIT OR Apache-2.0
//! Visual script node graph for `OrdoPlay`.
//!
//! This crate provides the core of the gameplay scripting graph:
//! - Nodes owning ordered, typed pins
//! - A symmetric connection index with link validation
//! - Node reconstruction that keeps connections across retyping
//! - Local type resolution for polymorphic nodes
//! - Compilation of nodes into stateless step instances
//!
//! ## Architecture
//!
//! A [`Graph`] owns its nodes in an arena keyed by [`NodeId`]. Per-kind
//! behavior lives behind the [`NodeKind`] trait. Running a graph goes through
//! a [`ScriptBuild`] of compiled instances, stepped by a [`StepEngine`].

pub mod class_db;
pub mod execution;
pub mod graph;
pub mod instance;
pub mod kinds;
pub mod node;
pub mod pin;
pub mod reconstruct;
pub mod record;
pub mod registry;
mod resolve;
pub mod settings;
pub mod variant;

pub use class_db::{ClassHierarchy, ClassTable};
pub use execution::{ExecutionError, RunSummary, ScriptBuild, StepEngine};
pub use graph::{ConnectionError, Graph, GraphError, GraphId};
pub use instance::{CompiledNode, ExecutionContext, ExecutionOwner, NodeInstance, OutputSink};
pub use kinds::{NodeKind, PropertyChange};
pub use node::{InitContext, Node, NodeId, NodeLifecycle};
pub use pin::{Pin, PinDirection, PinFlags, PinId, PinRef};
pub use reconstruct::ReconstructReport;
pub use record::{NodeRecord, PinRecord};
pub use registry::{create_script_registry, NodeKindRegistry};
pub use settings::ExecutionSettings;
pub use variant::{ObjectRef, Variant, VariantType};
