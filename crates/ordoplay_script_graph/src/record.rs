// SPDX-License-Identifier: MIT OR Apache-2.0
//! Saved form of nodes and their pins.
//!
//! Records name connection endpoints by node, direction and pin index rather
//! than by pin id, so they survive any renumbering of pins. A graph is
//! rebuilt from records through a [`NodeKindRegistry`].

use crate::graph::{ConnectionError, Graph, GraphError};
use crate::node::{NodeFlags, NodeId, PinSet};
use crate::pin::{PinDirection, PinFlags, PinRef};
use crate::registry::NodeKindRegistry;
use crate::variant::{Variant, VariantType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One end of a saved connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinEndpoint {
    /// Node owning the pin
    pub node: NodeId,
    /// Pin direction
    pub direction: PinDirection,
    /// Pin index within its direction
    pub index: usize,
}

/// Saved pin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinRecord {
    /// Direction
    pub direction: PinDirection,
    /// Name
    pub name: String,
    /// Value kind
    pub pin_type: VariantType,
    /// Flags
    pub flags: PinFlags,
    /// Default value
    pub default_value: Variant,
    /// Custom label
    #[serde(default)]
    pub label: Option<String>,
    /// Object class hint
    #[serde(default)]
    pub target_class: Option<String>,
    /// Connected pins
    #[serde(default)]
    pub connections: Vec<PinEndpoint>,
}

/// Saved node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node id
    pub id: NodeId,
    /// Kind type name
    pub kind: String,
    /// Flags
    pub flags: NodeFlags,
    /// Position in graph space
    pub position: [f32; 2],
    /// Size
    pub size: [f32; 2],
    /// Kind configuration
    #[serde(default)]
    pub properties: IndexMap<String, Variant>,
    /// Pins in order
    pub pins: Vec<PinRecord>,
}

impl Graph {
    /// Ordered records of a node's pins
    pub fn pin_records(&self, node_id: NodeId) -> Option<Vec<PinRecord>> {
        let node = self.node(node_id)?;
        let records = node
            .all_pins()
            .iter()
            .map(|pin| PinRecord {
                direction: pin.direction(),
                name: pin.name().to_string(),
                pin_type: pin.pin_type(),
                flags: pin.flags(),
                default_value: pin.default_value().clone(),
                label: pin.custom_label().map(str::to_string),
                target_class: pin.target_class().map(str::to_string),
                connections: pin
                    .connections()
                    .iter()
                    .filter_map(|peer| self.endpoint(*peer))
                    .collect(),
            })
            .collect();
        Some(records)
    }

    /// Replace a node's pins with saved ones and re-link their connections.
    ///
    /// Existing links of the node are severed first. Each restored pin takes
    /// its connections in saved order; a peer gains the reverse link at the
    /// end of its own list. Endpoints whose peer does not exist are skipped.
    pub fn restore_pins(&mut self, node_id: NodeId, records: &[PinRecord]) -> Result<(), RecordError> {
        let node = self.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        if node.is_reconstructing() {
            return Err(GraphError::ReconstructionInProgress(node_id).into());
        }
        let existing: Vec<PinRef> = node
            .all_pins()
            .iter()
            .map(|p| PinRef::new(node_id, p.id()))
            .collect();
        for pin in existing {
            self.unlink_all(pin);
        }

        let node = self.node_mut(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        node.replace_pins(pin_set(records));
        let saved = self.saved_links(node_id, records)?;
        self.apply_saved_links(saved)
    }

    /// Records of every node, in graph order
    pub fn to_records(&self) -> Vec<NodeRecord> {
        self.nodes()
            .filter_map(|node| {
                let id = node.id()?;
                Some(NodeRecord {
                    id,
                    kind: node.kind().type_name().to_string(),
                    flags: node.flags(),
                    position: node.position(),
                    size: node.size(),
                    properties: node.kind().properties(),
                    pins: self.pin_records(id)?,
                })
            })
            .collect()
    }

    /// Rebuild a graph from records
    pub fn from_records(
        name: impl Into<String>,
        records: &[NodeRecord],
        registry: &NodeKindRegistry,
    ) -> Result<Self, RecordError> {
        let mut graph = Graph::new(name);

        for record in records {
            let mut node = registry
                .create_node(&record.kind)
                .ok_or_else(|| RecordError::UnknownKind(record.kind.clone()))?;
            for (name, value) in &record.properties {
                node.kind_mut().set_property(name, value);
            }
            node.set_flags(record.flags);
            node.set_position(record.position);
            node.set_size(record.size);
            node.replace_pins(pin_set(&record.pins));
            graph.add_node_with_id(record.id, node)?;
        }

        let mut saved = Vec::new();
        for record in records {
            saved.extend(graph.saved_links(record.id, &record.pins)?);
        }
        graph.apply_saved_links(saved)?;

        tracing::debug!(graph = %graph.name, nodes = graph.node_count(), "restored graph from records");
        Ok(graph)
    }

    fn endpoint(&self, pin: PinRef) -> Option<PinEndpoint> {
        let peer = self.pin(pin)?;
        Some(PinEndpoint {
            node: pin.node,
            direction: peer.direction(),
            index: peer.index(),
        })
    }

    fn resolve_endpoint(&self, endpoint: PinEndpoint) -> Option<PinRef> {
        let pin = self
            .node(endpoint.node)?
            .find_pin_by_index(endpoint.index, endpoint.direction)?;
        Some(PinRef::new(endpoint.node, pin.id()))
    }

    /// Resolve the saved connections of a node's pins, in saved order
    fn saved_links(&self, node_id: NodeId, records: &[PinRecord]) -> Result<Vec<(PinRef, Vec<PinRef>)>, RecordError> {
        let node = self.node(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        let mut saved = Vec::new();
        for (pin, record) in node.all_pins().iter().zip(records) {
            let own = PinRef::new(node_id, pin.id());
            let mut peers = Vec::with_capacity(record.connections.len());
            for endpoint in &record.connections {
                match self.resolve_endpoint(*endpoint) {
                    Some(peer) => {
                        self.check_endpoints(own, peer)?;
                        if !peers.contains(&peer) {
                            peers.push(peer);
                        }
                    }
                    None => tracing::warn!(
                        node = %node_id,
                        pin = %record.name,
                        peer = %endpoint.node,
                        "skipping connection to missing pin"
                    ),
                }
            }
            saved.push((own, peers));
        }
        Ok(saved)
    }

    /// Install saved connection lists as they are, then add the reverse
    /// entries a peer's own record did not list.
    ///
    /// Nothing is written when a data input would end up with more than one
    /// link.
    fn apply_saved_links(&mut self, saved: Vec<(PinRef, Vec<PinRef>)>) -> Result<(), RecordError> {
        let mut lists: IndexMap<PinRef, Vec<PinRef>> = saved.into_iter().collect();
        let pairs: Vec<(PinRef, PinRef)> = lists
            .iter()
            .flat_map(|(own, peers)| peers.iter().map(move |peer| (*own, *peer)))
            .collect();
        for (own, peer) in pairs {
            if !lists.contains_key(&peer) {
                let current = self.pin(peer).map(|p| p.connections().to_vec()).unwrap_or_default();
                lists.insert(peer, current);
            }
            if let Some(list) = lists.get_mut(&peer) {
                if !list.contains(&own) {
                    list.push(own);
                }
            }
        }

        for (pin, connections) in &lists {
            let target = self.owned_pin(*pin)?;
            if target.is_single_link() && connections.len() > 1 {
                return Err(ConnectionError::InputOccupied(*pin).into());
            }
        }
        for (pin, connections) in lists {
            if let Some(target) = self.pin_mut(pin) {
                target.set_connections(connections);
            }
        }
        Ok(())
    }
}

fn pin_set(records: &[PinRecord]) -> PinSet {
    let mut pins = PinSet::new();
    for record in records {
        let pin = pins.create_pin(
            record.direction,
            record.name.as_str(),
            record.pin_type,
            record.default_value.clone(),
            None,
        );
        pin.set_flags(record.flags);
        if let Some(label) = &record.label {
            pin.set_label(label.as_str());
        }
        if let Some(class_name) = &record.target_class {
            pin.set_target_class(class_name.as_str());
        }
    }
    pins
}

/// Error restoring records
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// No kind with this type name is registered
    #[error("Unknown node kind: {0}")]
    UnknownKind(String),

    /// A saved connection could not be re-created
    #[error("Invalid saved connection: {0}")]
    Connection(#[from] ConnectionError),

    /// The graph rejected the edit
    #[error(transparent)]
    Graph(#[from] GraphError),
}
