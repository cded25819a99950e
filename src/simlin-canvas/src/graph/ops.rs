// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Effect, GraphModel, Rejection};
use crate::common::ErrorCode;
use crate::datamodel::{
    Edge, EdgeId, EdgeKind, EdgePatch, Endpoint, Node, NodeId, NodeKind, NodePatch, Point, Side,
    Size,
};

/// A single edit, as sent by the host in a batch.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    AddNode {
        node: Node,
    },
    CreateNode {
        kind: NodeKind,
        position: Point,
    },
    RemoveNode {
        id: NodeId,
    },
    MoveNode {
        id: NodeId,
        position: Point,
    },
    ResizeNode {
        id: NodeId,
        size: Size,
    },
    RenameNode {
        id: NodeId,
        label: String,
    },
    UpdateNodeData {
        id: NodeId,
        patch: NodePatch,
    },
    AddEdge {
        edge: Edge,
    },
    Connect {
        kind: EdgeKind,
        source: Endpoint,
        target: Endpoint,
    },
    RemoveEdge {
        id: EdgeId,
    },
    ReverseEdge {
        id: EdgeId,
    },
    UpdateEdgeData {
        id: EdgeId,
        patch: EdgePatch,
    },
    ClearEdgeGeometry {
        id: EdgeId,
    },
    MoveCloud {
        id: EdgeId,
        side: Side,
        position: Point,
    },
}

impl GraphModel {
    pub fn apply(&mut self, op: Operation) -> Vec<Effect> {
        match op {
            Operation::AddNode { node } => vec![self.add_node(node)],
            Operation::CreateNode { kind, position } => {
                vec![match self.create_node(kind, position) {
                    Ok(id) => Effect::NodeAdded(id),
                    Err(err) => {
                        debug!(%err, "could not create node");
                        Effect::Rejected(Rejection::LabelsExhausted)
                    }
                }]
            }
            Operation::RemoveNode { id } => self.remove_node(&id),
            Operation::MoveNode { id, position } => vec![self.move_node(&id, position)],
            Operation::ResizeNode { id, size } => vec![self.resize_node(&id, size)],
            Operation::RenameNode { id, label } => {
                vec![match self.rename_node(&id, &label) {
                    Ok(()) => Effect::NodeUpdated(id),
                    Err(err) if err.code == ErrorCode::DuplicateLabel => {
                        debug!(%err, "could not rename node");
                        Effect::Rejected(Rejection::LabelInUse(label))
                    }
                    Err(_) => Effect::NotFound(id.to_string()),
                }]
            }
            Operation::UpdateNodeData { id, patch } => vec![self.update_node_data(&id, patch)],
            Operation::AddEdge { edge } => vec![self.add_edge(edge)],
            Operation::Connect {
                kind,
                source,
                target,
            } => vec![self.connect(kind, source, target)],
            Operation::RemoveEdge { id } => self.remove_edge(&id),
            Operation::ReverseEdge { id } => vec![self.reverse_edge_direction(&id)],
            Operation::UpdateEdgeData { id, patch } => vec![self.update_edge_data(&id, patch)],
            Operation::ClearEdgeGeometry { id } => vec![self.clear_edge_geometry(&id)],
            Operation::MoveCloud { id, side, position } => {
                vec![self.move_cloud(&id, side, position)]
            }
        }
    }

    /// Applies a batch of operations in order and commits the result as a
    /// single step.  Each operation sees the effects of the ones before it;
    /// observers of the model never see an intermediate state.
    pub fn apply_changes(&mut self, ops: impl IntoIterator<Item = Operation>) -> Vec<Effect> {
        let mut staged = self.clone();
        let mut effects = vec![];
        for op in ops {
            effects.extend(staged.apply(op));
        }

        let rejected = effects
            .iter()
            .filter(|e| matches!(e, Effect::Rejected(_) | Effect::NotFound(_)))
            .count();
        debug!(effects = effects.len(), rejected, "applied change batch");

        *self = staged;
        effects
    }
}
