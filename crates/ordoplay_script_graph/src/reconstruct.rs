// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node reconstruction: rebuilding a node's pins from its configuration while
//! keeping user connections wherever the new layout allows.

use crate::graph::{Graph, GraphError, Result};
use crate::kinds::NodeKind;
use crate::node::{NodeId, NodeLifecycle};
use crate::pin::{Pin, PinDirection, PinId, PinRef};
use std::collections::{HashMap, HashSet};

/// What a reconstruction did to a node's connections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconstructReport {
    /// Links moved onto a new pin
    pub preserved: usize,
    /// Links dropped because their pin had no counterpart
    pub dropped: usize,
    /// Names of old pins whose links were dropped
    pub dropped_pins: Vec<String>,
}

/// Match every old pin to at most one new pin.
///
/// Pins are matched by direction and name first. When an old pin has no
/// name match, it falls back to the new pin at the same index, but only if
/// the old and new pin counts for that direction are equal. A candidate must
/// satisfy the kind's rewire rule, and no new pin is used twice.
pub fn rewire_old_pins_to_new_pins(
    kind: &dyn NodeKind,
    old_pins: &[Pin],
    new_pins: &[Pin],
) -> HashMap<PinId, PinId> {
    let mut mapping = HashMap::new();
    let mut used = HashSet::new();

    for old in old_pins {
        let by_name = new_pins
            .iter()
            .find(|new| new.direction() == old.direction() && new.name() == old.name());
        if let Some(new) = by_name {
            if !used.contains(&new.id()) && kind.is_rewire_compatible(old, new) {
                used.insert(new.id());
                mapping.insert(old.id(), new.id());
            }
        }
    }

    for direction in [PinDirection::Input, PinDirection::Output] {
        let old_count = old_pins.iter().filter(|p| p.direction() == direction).count();
        let new_count = new_pins.iter().filter(|p| p.direction() == direction).count();
        if old_count != new_count {
            continue;
        }

        for old in old_pins.iter().filter(|p| p.direction() == direction) {
            let has_name_match = new_pins
                .iter()
                .any(|new| new.direction() == direction && new.name() == old.name());
            if has_name_match || mapping.contains_key(&old.id()) {
                continue;
            }
            let by_index = new_pins
                .iter()
                .find(|new| new.direction() == direction && new.index() == old.index());
            if let Some(new) = by_index {
                if !used.contains(&new.id()) && kind.is_rewire_compatible(old, new) {
                    used.insert(new.id());
                    mapping.insert(old.id(), new.id());
                }
            }
        }
    }

    mapping
}

impl Graph {
    /// Rebuild a node's pins from its current configuration.
    ///
    /// Connections follow their pin to its counterpart in the new layout;
    /// pins without a counterpart lose their connections. Any instance
    /// compiled from this node is stale afterwards.
    pub fn reconstruct_node(&mut self, node_id: NodeId) -> Result<ReconstructReport> {
        let node = self.node_mut(node_id).ok_or(GraphError::NodeNotFound(node_id))?;
        match node.state() {
            NodeLifecycle::Live => {}
            NodeLifecycle::Reconstructing => return Err(GraphError::ReconstructionInProgress(node_id)),
            state => return Err(GraphError::InvalidState { node: node_id, state }),
        }

        node.set_state(NodeLifecycle::Reconstructing);
        let old_pins = node.pins_mut().take_all();
        let (kind, pins) = node.split_kind_pins();
        kind.reallocate_pins_during_reconstruction(&old_pins, pins);
        pins.cache_pin_indices();
        let mapping = rewire_old_pins_to_new_pins(kind, &old_pins, pins.as_slice());

        let mut report = ReconstructReport::default();
        let mut new_connections: Vec<(PinId, Vec<PinRef>)> = Vec::new();
        let mut remote_updates: Vec<(PinRef, PinRef, Option<PinRef>)> = Vec::new();

        for old in &old_pins {
            let old_ref = PinRef::new(node_id, old.id());
            let target = mapping.get(&old.id()).copied();
            let mut moved = Vec::new();

            for peer in old.connections() {
                match target {
                    Some(new_id) => {
                        moved.push(*peer);
                        remote_updates.push((*peer, old_ref, Some(PinRef::new(node_id, new_id))));
                        report.preserved += 1;
                    }
                    None => {
                        remote_updates.push((*peer, old_ref, None));
                        report.dropped += 1;
                    }
                }
            }

            if let Some(new_id) = target {
                new_connections.push((new_id, moved));
            } else if old.has_any_connections() {
                report.dropped_pins.push(old.name().to_string());
            }
        }

        for (new_id, connections) in new_connections {
            if let Some(pin) = node.pin_mut(new_id) {
                pin.set_connections(connections);
            }
        }

        node.set_state(NodeLifecycle::Live);
        node.bump_revision();
        node.validate_input_default_values();
        node.kind_mut().post_reconstruct_node();
        let kind_name = node.kind().type_name();

        for (peer, old_ref, new_ref) in remote_updates {
            let Some(pin) = self.pin_mut(peer) else {
                continue;
            };
            match new_ref {
                Some(new_ref) => pin.replace_connection(old_ref, new_ref),
                None => {
                    pin.remove_connection(old_ref);
                }
            }
        }

        if report.dropped > 0 {
            tracing::info!(
                graph = %self.name,
                node = %node_id,
                kind = kind_name,
                dropped = report.dropped,
                pins = ?report.dropped_pins,
                "reconstruction dropped connections"
            );
        }
        tracing::debug!(node = %node_id, preserved = report.preserved, "reconstructed node");
        Ok(report)
    }
}
